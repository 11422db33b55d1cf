use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorDetails, ErrorLayer, LoadError, Result};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeatureToggle {
    #[serde(default)]
    pub enabled: bool,
}

impl FeatureToggle {
    pub fn on() -> Self {
        FeatureToggle { enabled: true }
    }
}

/// The user-facing feature toggles that influence what we put in the menu.
/// Anything not mentioned in the settings file is disabled.
///
/// ```toml
/// [fancy-bar]
/// enabled = true
///
/// [diagramming]
/// enabled = true
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// When enabled, clicking a symbol marks it as the "selected" token and
    /// tells the side panel about it.
    #[serde(default)]
    pub fancy_bar: FeatureToggle,
    /// Gates the "Class layout of" entries.
    #[serde(default)]
    pub semantic_info: FeatureToggle,
    /// Gates all of the diagram query entries.
    #[serde(default)]
    pub diagramming: FeatureToggle,
}

impl Settings {
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(config_str)?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config_str = read_to_string(path)?;
        Self::from_toml_str(&config_str)
    }

    pub fn all_enabled() -> Self {
        Settings {
            fancy_bar: FeatureToggle::on(),
            semantic_info: FeatureToggle::on(),
            diagramming: FeatureToggle::on(),
        }
    }
}

/// Where the user is: the tree every URL gets built against and, when looking
/// at a source listing, the path of that file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteContext {
    pub tree: String,
    pub source_path: Option<String>,
}

impl RouteContext {
    pub fn new(tree: &str) -> Self {
        RouteContext {
            tree: tree.to_string(),
            source_path: None,
        }
    }

    pub fn with_source_path(mut self, source_path: &str) -> Self {
        self.source_path = Some(source_path.to_string());
        self
    }

    /// The `"<path>#<line>"` location for a line of the current source
    /// listing, in the same form jumps use.  `lineno` is taken verbatim from
    /// the line number element.
    pub fn line_location(&self, lineno: &str) -> Option<String> {
        self.source_path
            .as_ref()
            .map(|path| format!("{}#{}", path, lineno))
    }

    /// Like `line_location`, for callers who were explicitly handed a line
    /// number: a line with no source file to put it in is bad input.
    pub fn clicked_line(&self, lineno: Option<&str>) -> Result<Option<String>> {
        match lineno {
            None => Ok(None),
            Some(lineno) => match self.line_location(lineno) {
                Some(location) => Ok(Some(location)),
                None => Err(LoadError::StickyProblem(ErrorDetails {
                    layer: ErrorLayer::BadInput,
                    message: format!("line {} given without a source path", lineno),
                })),
            },
        }
    }
}
