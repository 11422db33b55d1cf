use std::sync::Mutex;

use tracing_subscriber::{prelude::*, EnvFilter, Layer, Registry};

lazy_static! {
    static ref LOG_INITIALIZED: Mutex<bool> = Mutex::new(false);
}

/// Initialize logging.  Nothing is logged unless the environment variable
/// `RUST_LOG` is set to a non-empty value, in which case it's interpreted as
/// an `EnvFilter` directive like `xref_menu=trace`.  Calling this more than
/// once is harmless.
pub fn init_logging() {
    let mut initialized = match LOG_INITIALIZED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *initialized {
        return;
    }
    *initialized = true;

    let mut layers = Vec::new();
    // Test harnesses and scripts tend to set RUST_LOG unconditionally, with an
    // empty value meaning "no logging".
    if let Ok(rustlog) = std::env::var("RUST_LOG") {
        if !rustlog.is_empty() {
            if let Ok(env_filter) = EnvFilter::try_from_default_env() {
                let layer = tracing_subscriber::fmt::layer()
                    .compact()
                    // This mostly ends up in files that get excerpted, so no
                    // ANSI, and the wall time is just noise.
                    .with_ansi(false)
                    .without_time()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter)
                    .boxed();
                layers.push(layer);
            }
        }
    }

    // Someone else may have installed a global subscriber already, in which
    // case theirs wins.
    if Registry::default().with(layers).try_init().is_err() {
        debug!("global tracing subscriber already installed");
    }
}

#[test]
fn test_init_logging_is_idempotent() {
    init_logging();
    init_logging();
    assert!(*LOG_INITIALIZED.lock().unwrap());
}
