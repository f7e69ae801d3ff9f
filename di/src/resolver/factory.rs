use super::{bind_values, kind_mismatch, proxy_for, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind, FactoryDefinition, FactoryRef, Scope};
use crate::error::{Error, Result};
use crate::value::{Args, Value};

/// Calls a registered factory, a closure, or a method on another entry.
///
/// Lazy and request-scoped factories hand out a proxy instead; such factories
/// must produce an object.
#[derive(Debug, Default, Clone, Copy)]
pub struct FactoryResolver;

impl DefinitionResolver for FactoryResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, params: &Params) -> Result<Value> {
    let Definition::Factory(factory) = &entry.definition else {
      return Err(kind_mismatch(entry, DefinitionKind::Factory));
    };

    if !factory.lazy && factory.scope != Scope::Request {
      return invoke(container, entry, factory, params);
    }

    let (owned_entry, owned_factory, params) = (entry.clone(), factory.clone(), params.clone());
    let proxy = proxy_for(container, entry, factory.scope, move |container| {
      match invoke(container, &owned_entry, &owned_factory, &params)? {
        Value::Object(instance) => Ok(instance),
        other => Err(Error::definition(
          owned_entry.name.as_str(),
          format!(
            "a lazy or request-scoped factory must produce an object, got {}",
            other.kind()
          ),
        )),
      }
    });
    Ok(Value::Object(proxy))
  }
}

fn invoke(
  container: &Container,
  entry: &DefinitionEntry,
  factory: &FactoryDefinition,
  params: &Params,
) -> Result<Value> {
  let declared = factory.args.as_deref().unwrap_or_default();
  match &factory.factory {
    FactoryRef::Named(name) => {
      let callable = container.registry().factory(name).cloned().ok_or_else(|| {
        Error::definition(entry.name.as_str(), format!("factory '{}' is not registered", name))
      })?;
      let args = bind_values(container, entry, "parameters", Some(callable.signature()), declared, params)?;
      callable.call(args)
    }
    FactoryRef::Callable(callable) => {
      let args = bind_values(container, entry, "parameters", Some(callable.signature()), declared, params)?;
      callable.call(args)
    }
    FactoryRef::Method { owner, method } => {
      let owner_entry = entry.sub_entry("factory", (**owner).clone());
      let owner = container.resolve_nested(&owner_entry, &Params::new())?;
      let instance = owner.as_object().ok_or_else(|| {
        Error::definition(
          entry.name.as_str(),
          format!("factory owner must be an object to call '{}' on, got {}", method, owner.kind()),
        )
      })?;
      let args = bind_values(container, entry, "parameters", None, declared, params)?;
      instance.invoke(method, Args::new(format!("{}::{}", entry.name, method), args))
    }
  }
}
