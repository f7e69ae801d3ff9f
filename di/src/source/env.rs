use super::Source;
use crate::definition::{Definition, EnvDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Read access to process environment variables.
pub trait Environment: Send + Sync {
  fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
  fn var(&self, name: &str) -> Option<String> {
    std::env::var(name).ok()
  }
}

/// A fixed set of variables.
#[derive(Debug, Default, Clone)]
pub struct MapEnvironment {
  vars: HashMap<String, String>,
}

impl MapEnvironment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.vars.insert(name.into(), value.into());
    self
  }
}

impl Environment for MapEnvironment {
  fn var(&self, name: &str) -> Option<String> {
    self.vars.get(name).cloned()
  }
}

/// Binds dotted entry names to environment variables by convention:
/// `app.db.host` is read from `APP_DB_HOST` (with the optional prefix in front).
///
/// Only dotted names are considered, so plain class names are never shadowed
/// by an unrelated variable.
pub struct EnvSource {
  environment: Arc<dyn Environment>,
  prefix: String,
}

impl EnvSource {
  pub fn new(environment: Arc<dyn Environment>, prefix: Option<String>) -> Self {
    Self {
      environment,
      prefix: prefix.unwrap_or_default(),
    }
  }

  /// The variable an entry name maps to, if the name follows the convention.
  pub fn var_name(&self, name: &str) -> Option<String> {
    let conventional = name.contains('.')
      && name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !conventional {
      return None;
    }
    let converted: String = name
      .chars()
      .map(|c| match c {
        '.' | '-' => '_',
        other => other.to_ascii_uppercase(),
      })
      .collect();
    Some(format!("{}{}", self.prefix, converted))
  }
}

impl Source for EnvSource {
  fn has(&self, name: &str) -> bool {
    self
      .var_name(name)
      .is_some_and(|var| self.environment.var(&var).is_some())
  }

  fn get(&self, name: &str) -> Option<Definition> {
    let var_name = self.var_name(name)?;
    self.environment.var(&var_name)?;
    Some(Definition::Env(EnvDefinition {
      var_name,
      default: None,
    }))
  }

  fn label(&self) -> &str {
    "environment"
  }
}
