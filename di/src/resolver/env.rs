use super::{kind_mismatch, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind};
use crate::error::{Error, Result};
use crate::value::Value;

/// Reads an environment variable, falling back to the declared default.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvResolver;

impl DefinitionResolver for EnvResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, _params: &Params) -> Result<Value> {
    let Definition::Env(env) = &entry.definition else {
      return Err(kind_mismatch(entry, DefinitionKind::Env));
    };

    if let Some(found) = container.environment().var(&env.var_name) {
      return Ok(Value::Str(found));
    }
    match &env.default {
      Some(default) => {
        let sub = entry.sub_entry("default", (**default).clone());
        container.resolve_nested(&sub, &Params::new())
      }
      None => Err(Error::definition(
        entry.name.as_str(),
        format!(
          "environment variable '{}' is not set and has no default",
          env.var_name
        ),
      )),
    }
  }
}
