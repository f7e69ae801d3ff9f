//! Component descriptors and their registration into a container.
//!
//! A descriptor is the plain data an external metadata scan produces for one
//! class: its name, an optional explicit binding name, the interfaces it
//! implements and the conditions under which it applies.

use crate::condition::Condition;
use crate::container::Container;
use crate::definition::{Definition, ObjectDefinition, Scope};
use crate::error::{Error, Result};
use crate::source::{BindingKind, ComponentScanSource, RegisterOutcome};
use tracing::{debug, trace, warn};

pub struct ComponentDescriptor {
  class_name: String,
  name: Option<String>,
  interfaces: Vec<String>,
  conditions: Vec<Box<dyn Condition>>,
  scope: Scope,
  lazy: bool,
}

impl ComponentDescriptor {
  pub fn new(class_name: impl Into<String>) -> Self {
    Self {
      class_name: class_name.into(),
      name: None,
      interfaces: Vec::new(),
      conditions: Vec::new(),
      scope: Scope::Singleton,
      lazy: false,
    }
  }

  /// Binds the component under an explicit name instead of its interfaces.
  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn implements(mut self, interface: impl Into<String>) -> Self {
    self.interfaces.push(interface.into());
    self
  }

  /// Adds a condition. Conditions are evaluated in the order they were added.
  pub fn when(mut self, condition: impl Condition + 'static) -> Self {
    self.conditions.push(Box::new(condition));
    self
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn lazy(mut self) -> Self {
    self.lazy = true;
    self
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  fn accepts(&self, container: &Container) -> Result<bool> {
    for condition in &self.conditions {
      if !condition.matches(container)? {
        trace!(
          component = %self.class_name,
          condition = %condition.describe(),
          "condition not met"
        );
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn definition(&self) -> Definition {
    let mut object = ObjectDefinition::new(self.class_name.as_str()).scope(self.scope);
    object.lazy = self.lazy;
    Definition::Object(object)
  }
}

/// Outcome of registering a batch of descriptors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSummary {
  pub accepted: usize,
  pub rejected: usize,
  pub conflicts: usize,
}

/// Evaluates descriptors one at a time and binds the accepted ones.
///
/// Each accepted descriptor binds its class name to the object definition,
/// then either its explicit name or, failing that, each implemented interface
/// as an alias to the class. Bindings land in `source` immediately, so later
/// descriptors see earlier ones when their conditions are evaluated; a class
/// binding registered later still takes its name back from an alias.
pub(crate) fn register_components(
  container: &Container,
  source: &ComponentScanSource,
  descriptors: Vec<ComponentDescriptor>,
) -> Result<RegistrationSummary> {
  let mut summary = RegistrationSummary::default();

  for descriptor in descriptors {
    let class_meta = container.registry().class(&descriptor.class_name).ok_or_else(|| {
      Error::definition(
        descriptor.class_name.as_str(),
        "component class is not registered",
      )
    })?;

    if !descriptor.accepts(container)? {
      summary.rejected += 1;
      continue;
    }
    summary.accepted += 1;

    let mut bindings = vec![(
      descriptor.class_name.clone(),
      descriptor.definition(),
      BindingKind::Concrete,
    )];
    let alias = Definition::Alias(descriptor.class_name.clone());
    match &descriptor.name {
      Some(name) => bindings.push((name.clone(), alias, BindingKind::Explicit)),
      None => {
        let interfaces = if descriptor.interfaces.is_empty() {
          class_meta.interfaces()
        } else {
          descriptor.interfaces.as_slice()
        };
        bindings.extend(
          interfaces
            .iter()
            .map(|interface| (interface.clone(), alias.clone(), BindingKind::Implicit)),
        );
      }
    }

    for (name, definition, kind) in bindings {
      match source.register(&name, definition, kind) {
        RegisterOutcome::Inserted => {
          trace!(entry = %name, component = %descriptor.class_name, "component bound");
        }
        RegisterOutcome::Replaced { previous } => {
          debug!(
            entry = %name,
            component = %descriptor.class_name,
            previous = ?previous,
            "binding replaced one of lower precedence"
          );
        }
        RegisterOutcome::Kept { existing } => {
          summary.conflicts += 1;
          warn!(
            entry = %name,
            component = %descriptor.class_name,
            existing = ?existing,
            "name already bound, keeping the earlier binding"
          );
          continue;
        }
      }
      container.forget(&name);
    }
  }

  Ok(summary)
}
