//! Runtime configuration.
//!
//! ```ignore
//! use spark_elements::Config;
//!
//! let config = Config::from_json(r#"{ "inject_styles": false }"#)?;
//! assert!(config.builtin_directives);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Switches that shape how a [`Runtime`](crate::Runtime) renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Register the built-in `*if` and `*for` directives on runtime creation.
    pub builtin_directives: bool,
    /// Render a descriptor's style text as a leading `<style>` child.
    pub inject_styles: bool,
    /// Replace placeholders for forward-referenced tags once they are defined.
    pub upgrade_placeholders: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            builtin_directives: true,
            inject_styles: true,
            upgrade_placeholders: true,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
