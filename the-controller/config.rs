use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

/// Controller settings that can come from a TOML file.
///
/// ```toml
/// read-only = true
/// surface-uncaptured-errors = false
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ControllerConfig {
  /// Consulted by plugins; the controller itself does not enforce it.
  pub read_only:                 bool,
  /// Return handler errors from `run` when no `captureError` handler is
  /// registered, instead of logging and dropping them.
  pub surface_uncaptured_errors: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to parse controller config: {0}")]
  Parse(#[from] toml::de::Error),
}

impl ControllerConfig {
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }
}
