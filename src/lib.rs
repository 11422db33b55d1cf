extern crate serde;
extern crate serde_json;

extern crate itertools;
#[macro_use]
extern crate lazy_static;
extern crate regex;
extern crate toml;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;
extern crate urlencoding;
extern crate ustr;

pub mod error;
pub mod file_format;

pub mod context_menu;
pub mod dom;
pub mod hover;
pub mod links;
pub mod logging;
pub mod menu;
pub mod session;
pub mod target_word;
pub mod url_encode;

pub mod utils;
