//! The configuration collaborator: dot-path lookups into a settings tree.

use crate::error::{Error, Result};
use crate::value::Value;

/// Read access to application settings.
pub trait Properties: Send + Sync {
  /// Looks up a dot-separated path such as `db.pool.size`. Missing paths and
  /// explicit nulls both yield `None`.
  fn get(&self, path: &str) -> Option<Value>;

  fn has(&self, path: &str) -> bool {
    self.get(path).is_some()
  }
}

/// Settings backed by a JSON document tree.
#[derive(Debug, Clone, Default)]
pub struct ConfigProperties {
  root: serde_json::Value,
}

impl ConfigProperties {
  pub fn new(root: serde_json::Value) -> Self {
    Self { root }
  }

  pub fn from_json_str(source: &str) -> Result<Self> {
    serde_json::from_str(source)
      .map(Self::new)
      .map_err(|e| Error::Config(e.to_string()))
  }

  pub fn from_yaml_str(source: &str) -> Result<Self> {
    serde_yaml::from_str::<serde_json::Value>(source)
      .map(Self::new)
      .map_err(|e| Error::Config(e.to_string()))
  }

  fn lookup(&self, path: &str) -> Option<&serde_json::Value> {
    if path.is_empty() {
      return None;
    }
    path.split('.').try_fold(&self.root, |node, segment| match node {
      serde_json::Value::Object(map) => map.get(segment),
      // Numeric segments index into lists.
      serde_json::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
      _ => None,
    })
  }
}

impl Properties for ConfigProperties {
  fn get(&self, path: &str) -> Option<Value> {
    match self.lookup(path)? {
      serde_json::Value::Null => None,
      found => Some(Value::from(found.clone())),
    }
  }
}
