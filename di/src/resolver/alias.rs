use super::{kind_mismatch, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind};
use crate::error::{Error, Result};
use crate::value::Value;

/// Follows an alias to its target entry.
///
/// The target goes through `Container::get`, so it is cached (or not)
/// according to its own scope. A target that does not exist is reported
/// against the alias, since it is the alias that is broken.
#[derive(Debug, Default, Clone, Copy)]
pub struct AliasResolver;

impl DefinitionResolver for AliasResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, params: &Params) -> Result<Value> {
    let Definition::Alias(target) = &entry.definition else {
      return Err(kind_mismatch(entry, DefinitionKind::Alias));
    };

    let resolved = if params.is_empty() {
      container.get(target)
    } else {
      container.make(target, params.clone())
    };

    resolved.map_err(|e| match e {
      Error::NotFound { name } if name == *target => Error::definition(
        entry.name.as_str(),
        format!("it references '{}', which is not defined", target),
      ),
      other => other,
    })
  }
}
