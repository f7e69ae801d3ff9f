use super::Source;
use crate::definition::Definition;
use crate::properties::Properties;
use std::sync::Arc;

/// Exposes configuration values as literal definitions; the entry name is the
/// dot path into the settings tree.
pub struct PropertiesSource {
  properties: Arc<dyn Properties>,
}

impl PropertiesSource {
  pub fn new(properties: Arc<dyn Properties>) -> Self {
    Self { properties }
  }
}

impl Source for PropertiesSource {
  fn has(&self, name: &str) -> bool {
    self.properties.has(name)
  }

  fn get(&self, name: &str) -> Option<Definition> {
    self.properties.get(name).map(Definition::Value)
  }

  fn label(&self) -> &str {
    "properties"
  }
}
