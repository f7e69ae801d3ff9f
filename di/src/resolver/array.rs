use super::{kind_mismatch, resolve_all, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{ArrayDefinition, Definition, DefinitionEntry, DefinitionKind};
use crate::error::Result;
use crate::value::Value;
use std::collections::BTreeMap;

/// Resolves every element of a list or map definition, keeping keys and
/// nesting as declared.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArrayResolver;

impl DefinitionResolver for ArrayResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, _params: &Params) -> Result<Value> {
    match &entry.definition {
      Definition::Array(ArrayDefinition::List(items)) => {
        resolve_all(container, entry, "items", items).map(Value::List)
      }
      Definition::Array(ArrayDefinition::Map(items)) => {
        let mut resolved = BTreeMap::new();
        for (key, item) in items {
          let sub = entry.sub_entry(&format!("items.{}", key), item.clone());
          resolved.insert(key.clone(), container.resolve_nested(&sub, &Params::new())?);
        }
        Ok(Value::Map(resolved))
      }
      _ => Err(kind_mismatch(entry, DefinitionKind::Array)),
    }
  }
}
