use super::Source;
use crate::definition::Definition;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Explicit definitions keyed by name. This is the source `Container::set` writes to.
#[derive(Debug, Default)]
pub struct ArraySource {
  definitions: RwLock<HashMap<String, Definition>>,
}

impl ArraySource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_definitions<K: Into<String>>(
    definitions: impl IntoIterator<Item = (K, Definition)>,
  ) -> Self {
    Self {
      definitions: RwLock::new(
        definitions
          .into_iter()
          .map(|(name, def)| (name.into(), def))
          .collect(),
      ),
    }
  }

  /// Binds `name`, replacing any previous definition.
  pub fn set(&self, name: &str, definition: Definition) {
    self.definitions.write().insert(name.to_owned(), definition);
  }

  pub fn len(&self) -> usize {
    self.definitions.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.definitions.read().is_empty()
  }
}

impl Source for ArraySource {
  fn has(&self, name: &str) -> bool {
    self.definitions.read().contains_key(name)
  }

  fn get(&self, name: &str) -> Option<Definition> {
    self.definitions.read().get(name).cloned()
  }

  fn label(&self) -> &str {
    "definitions"
  }
}
