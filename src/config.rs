//! Configuration of parsing and writing, loaded from TOML.
//!
//! Every field has a default, so a configuration file only needs the
//! settings that differ:
//! ```toml
//! [newick]
//! nested_comments = true
//!
//! [format]
//! decimals = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Errors loading or saving a configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error - {0}")]
    Io(#[from] io::Error),
    #[error("Invalid configuration - {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Cannot serialize configuration - {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Newick parsing
    pub newick: NewickConfig,
    /// Newick writing
    pub format: FormatConfig,
}

/// Options of the Newick parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewickConfig {
    /// `[...]` comments may contain `[...]` comments
    pub nested_comments: bool,
    /// `#` starts a comment up to the end of the line
    pub hashmark_comments: bool,
    /// Tolerate doubly named nodes and stray quotes
    pub relaxed_names: bool,
}

impl Default for NewickConfig {
    fn default() -> Self {
        Self {
            nested_comments: false,
            hashmark_comments: true,
            relaxed_names: true,
        }
    }
}

/// Options of the Newick writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Decimal places of edge lengths
    pub decimals: usize,
    /// Edge lengths below this are written as a tiny constant
    pub too_short: f64,
    /// Quote every name
    pub always_quote: bool,
    /// Write edge lengths (if the tree has them)
    pub edge_lengths: bool,
    /// Line break after every child
    pub line_breaks: bool,
    /// Node indices as comments
    pub node_ids: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            decimals: crate::newick::writer::DEFAULT_DECIMALS,
            too_short: crate::newick::writer::DEFAULT_TOO_SHORT,
            always_quote: false,
            edge_lengths: true,
            line_breaks: false,
            node_ids: false,
        }
    }
}

/// More decimals than an f64 carries
const MAX_USEFUL_DECIMALS: usize = 17;

impl Config {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    /// [ConfigError::Toml] for malformed TOML or wrongly typed values,
    /// [ConfigError::InvalidValue] for values out of range.
    ///
    /// # Example
    /// ```
    /// use phylocount::config::Config;
    ///
    /// let config = Config::from_toml_str("[format]\ndecimals = 5\n").unwrap();
    /// assert_eq!(config.format.decimals, 5);
    /// assert!(config.newick.relaxed_names);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, see [Config::from_toml_str].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Writes the configuration as TOML.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// [ConfigError::InvalidValue] if `too_short` is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let too_short = self.format.too_short;
        if !(too_short >= 0.0 && too_short.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "format.too_short",
                reason: format!("must be non-negative and finite, got {too_short}"),
            });
        }
        if self.format.decimals > MAX_USEFUL_DECIMALS {
            warn!(
                decimals = self.format.decimals,
                "More decimals than a double carries, output will be noisy"
            );
        }
        Ok(())
    }
}
