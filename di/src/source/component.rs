use super::Source;
use crate::definition::Definition;
use parking_lot::RwLock;
use std::collections::HashMap;

/// How a component binding came to exist. Used to settle name collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
  /// A class bound under its own name.
  Concrete,
  /// An alias derived from an implemented interface.
  Implicit,
  /// An alias under the component's declared name.
  Explicit,
}

impl BindingKind {
  /// Class bindings outrank declared names, which outrank interface aliases.
  fn precedence(self) -> u8 {
    match self {
      BindingKind::Implicit => 0,
      BindingKind::Explicit => 1,
      BindingKind::Concrete => 2,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
  Inserted,
  /// A binding of lower precedence was overridden.
  Replaced { previous: Definition },
  /// The name was already bound; the earlier binding stays.
  Kept { existing: Definition },
}

#[derive(Debug)]
struct Binding {
  definition: Definition,
  kind: BindingKind,
}

/// Bindings contributed by accepted component descriptors.
///
/// Filled while the container is built and read-only afterwards.
#[derive(Debug, Default)]
pub struct ComponentScanSource {
  bindings: RwLock<HashMap<String, Binding>>,
}

impl ComponentScanSource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a binding. The first registration of a name wins among bindings of
  /// the same kind; a class binding replaces any alias and an explicit alias
  /// replaces an implicit one. The outcome is the same as registering every
  /// class first, then interface aliases, then declared names.
  pub fn register(&self, name: &str, definition: Definition, kind: BindingKind) -> RegisterOutcome {
    let mut bindings = self.bindings.write();
    match bindings.get_mut(name) {
      None => {
        bindings.insert(name.to_owned(), Binding { definition, kind });
        RegisterOutcome::Inserted
      }
      Some(existing) if kind.precedence() > existing.kind.precedence() => {
        let previous = std::mem::replace(&mut existing.definition, definition);
        existing.kind = kind;
        RegisterOutcome::Replaced { previous }
      }
      Some(existing) => RegisterOutcome::Kept {
        existing: existing.definition.clone(),
      },
    }
  }

  pub fn len(&self) -> usize {
    self.bindings.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.read().is_empty()
  }
}

impl Source for ComponentScanSource {
  fn has(&self, name: &str) -> bool {
    self.bindings.read().contains_key(name)
  }

  fn get(&self, name: &str) -> Option<Definition> {
    self.bindings.read().get(name).map(|b| b.definition.clone())
  }

  fn label(&self) -> &str {
    "components"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::definition::{alias, object};

  #[test]
  fn explicit_alias_overrides_implicit_only() {
    let source = ComponentScanSource::new();
    assert_eq!(
      source.register("Clock", alias("SystemClock"), BindingKind::Implicit),
      RegisterOutcome::Inserted
    );
    assert_eq!(
      source.register("Clock", alias("FakeClock"), BindingKind::Implicit),
      RegisterOutcome::Kept {
        existing: alias("SystemClock")
      }
    );
    assert_eq!(
      source.register("Clock", alias("UtcClock"), BindingKind::Explicit),
      RegisterOutcome::Replaced {
        previous: alias("SystemClock")
      }
    );
    assert_eq!(
      source.register("Clock", alias("OtherClock"), BindingKind::Explicit),
      RegisterOutcome::Kept {
        existing: alias("UtcClock")
      }
    );
    assert_eq!(source.get("Clock"), Some(alias("UtcClock")));
  }

  #[test]
  fn class_binding_overrides_any_alias() {
    let source = ComponentScanSource::new();
    source.register("Clock", alias("SystemClock"), BindingKind::Implicit);
    source.register("Utc", alias("UtcClock"), BindingKind::Explicit);

    assert_eq!(
      source.register("Clock", object("Clock").into(), BindingKind::Concrete),
      RegisterOutcome::Replaced {
        previous: alias("SystemClock")
      }
    );
    assert!(matches!(
      source.register("Utc", object("Utc").into(), BindingKind::Concrete),
      RegisterOutcome::Replaced { .. }
    ));
    assert!(matches!(
      source.register("Clock", alias("FakeClock"), BindingKind::Explicit),
      RegisterOutcome::Kept { .. }
    ));
    assert_eq!(source.get("Clock"), Some(object("Clock").into()));
  }
}
