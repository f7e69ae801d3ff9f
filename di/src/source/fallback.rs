use super::Source;
use crate::definition::{Definition, ObjectDefinition};
use crate::registry::ClassRegistry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:(?:::|\\)[A-Za-z_][A-Za-z0-9_]*)*$")
    .expect("class name pattern is valid")
});

/// Whether `name` is shaped like a (possibly namespaced) class name.
pub fn is_valid_class_name(name: &str) -> bool {
  CLASS_NAME.is_match(name)
}

/// Binds every registered class name to an autowired definition of itself.
///
/// This is the catch-all at the end of the chain that lets the container build
/// concrete dependencies nobody registered explicitly.
pub struct ObjectFallbackSource {
  registry: Arc<ClassRegistry>,
}

impl ObjectFallbackSource {
  pub fn new(registry: Arc<ClassRegistry>) -> Self {
    Self { registry }
  }
}

impl Source for ObjectFallbackSource {
  fn has(&self, name: &str) -> bool {
    is_valid_class_name(name) && self.registry.contains_class(name)
  }

  fn get(&self, name: &str) -> Option<Definition> {
    self
      .has(name)
      .then(|| Definition::Object(ObjectDefinition::new(name)))
  }

  fn label(&self) -> &str {
    "autowiring"
  }
}
