//! Container-wide settings.

use crate::error::{Error, Result};
use serde::Deserialize;

const DEFAULT_CACHE_NAMESPACE: &str = "fibre_di";
const DEFAULT_MAX_DEPTH: usize = 256;

/// Tunables for a container, usually deserialized from the application's
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
  /// Resolve unbound but registered class names to themselves.
  pub autowire: bool,
  /// Prefix prepended to environment variable names derived from entry names.
  pub env_prefix: Option<String>,
  /// Key prefix for entries in a persistent definition cache.
  pub cache_namespace: String,
  /// Deepest nesting of `get` calls before resolution is aborted.
  pub max_depth: usize,
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      autowire: true,
      env_prefix: None,
      cache_namespace: DEFAULT_CACHE_NAMESPACE.to_owned(),
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(source: &str) -> Result<Self> {
    let config: ContainerConfig =
      serde_yaml::from_str(source).map_err(|e| Error::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  pub(crate) fn validate(&self) -> Result<()> {
    if self.max_depth == 0 {
      return Err(Error::Config("max_depth must be at least 1".into()));
    }
    if self.cache_namespace.is_empty() {
      return Err(Error::Config("cache_namespace cannot be empty".into()));
    }
    Ok(())
  }
}
