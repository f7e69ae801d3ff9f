use super::{bind_values, kind_mismatch, proxy_for, resolve_all, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind, ObjectDefinition, Scope};
use crate::error::{Error, Result};
use crate::proxy::{DeferredObject, Injection};
use crate::value::{Args, Instance, Value};
use std::sync::Arc;
use tracing::trace;

/// Constructs an instance of a registered class, then applies its property and
/// method injections.
///
/// A singleton with injections is wrapped in a [`DeferredObject`] and published
/// to the container before its injections run.
///
/// Lazy and request-scoped objects are handed out as proxies that run the same
/// construction on first use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectResolver;

impl DefinitionResolver for ObjectResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, params: &Params) -> Result<Value> {
    let Definition::Object(object) = &entry.definition else {
      return Err(kind_mismatch(entry, DefinitionKind::Object));
    };

    if !object.lazy && object.scope != Scope::Request {
      return build(container, entry, object, params).map(Value::Object);
    }

    let (owned_entry, owned_object, params) = (entry.clone(), object.clone(), params.clone());
    let proxy = proxy_for(container, entry, object.scope, move |container| {
      build(container, &owned_entry, &owned_object, &params)
    });
    Ok(Value::Object(proxy))
  }
}

fn build(
  container: &Container,
  entry: &DefinitionEntry,
  object: &ObjectDefinition,
  params: &Params,
) -> Result<Instance> {
  let meta = container.registry().class(&object.class_name).cloned().ok_or_else(|| {
    Error::definition(
      entry.name.as_str(),
      format!("class '{}' is not registered", object.class_name),
    )
  })?;

  let args = bind_values(
    container,
    entry,
    "constructor",
    Some(meta.constructor_signature()),
    &object.ctor_args,
    params,
  )?;
  trace!(entry = %entry.trace_name(), class = meta.name(), args = args.len(), "instantiating");
  let instance = meta.instantiate(args)?;

  if !object.has_injections() {
    return Ok(instance);
  }
  let injection = injection(container, entry, object);
  if !container.accepts_early(entry) {
    injection(&instance)?;
    return Ok(instance);
  }

  // Published before wiring so injection cycles reach this same object.
  let deferred = Arc::new(DeferredObject::new(entry.trace_name(), instance, injection));
  let published: Instance = deferred.clone();
  container.publish_early(entry, &published);
  deferred.complete()?;
  Ok(published)
}

/// Property assignments first, then method calls in declaration order.
fn injection(container: &Container, entry: &DefinitionEntry, object: &ObjectDefinition) -> Injection {
  let weak = container.downgrade();
  let entry = entry.clone();
  let class_name = object.class_name.clone();
  let properties = object.properties.clone();
  let methods = object.methods.clone();

  Box::new(move |instance: &Instance| {
    let container = weak.upgrade(&entry.name)?;
    for (name, definition) in &properties {
      let sub = entry.sub_entry(&format!("properties.{}", name), definition.clone());
      let value = container.resolve_nested(&sub, &Params::new())?;
      instance.set_property(name, value)?;
    }
    for (method, args) in &methods {
      let values = resolve_all(&container, &entry, &format!("methods.{}", method), args)?;
      instance.invoke(method, Args::new(format!("{}::{}", class_name, method), values))?;
    }
    Ok(())
  })
}
