use super::{kind_mismatch, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind};
use crate::error::Result;
use crate::value::Value;

/// Returns literals verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueResolver;

impl DefinitionResolver for ValueResolver {
  fn resolve(&self, _container: &Container, entry: &DefinitionEntry, _params: &Params) -> Result<Value> {
    match &entry.definition {
      Definition::Value(value) => Ok(value.clone()),
      _ => Err(kind_mismatch(entry, DefinitionKind::Value)),
    }
  }
}
