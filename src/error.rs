use std::fmt;

pub type Result<T> = std::result::Result<T, LoadError>;

// JSON parse errors are sticky data problems.
impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> LoadError {
        LoadError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        })
    }
}

impl From<toml::de::Error> for LoadError {
    fn from(err: toml::de::Error) -> LoadError {
        LoadError::StickyProblem(ErrorDetails {
            layer: ErrorLayer::ConfigLayer,
            message: err.to_string(),
        })
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> LoadError {
        LoadError::Io(err)
    }
}

/// Express whether the problem is with how we were invoked, with the
/// cross-reference data, or with the settings.
#[derive(Debug)]
pub enum ErrorLayer {
    /// The caller's arguments don't fit together, like a clicked line number
    /// with no source file for it.
    BadInput,
    /// The SYM_INFO or GRAPH_EXTRA payload could not be decoded.  Note that
    /// records that decode but are missing their self-identification are not
    /// errors; they are silently ignored at lookup time.
    DataLayer,
    /// The feature-flag settings could not be decoded.
    ConfigLayer,
}

#[derive(Debug)]
pub struct ErrorDetails {
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

/// Loading is the only fallible part of this crate.  Once the tables are in
/// memory, resolution and highlighting degrade silently instead of erroring.
#[derive(Debug)]
pub enum LoadError {
    /// An error that will persist no matter how many times we retry, because
    /// the input itself is bad.
    StickyProblem(ErrorDetails),
    Io(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LoadError::StickyProblem(details) => {
                write!(formatter, "{:?}: {}", details.layer, details.message)
            }
            LoadError::Io(err) => write!(formatter, "IO: {}", err),
        }
    }
}

impl std::error::Error for LoadError {}
