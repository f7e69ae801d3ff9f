//! Completes definitions that leave their wiring implicit.
//!
//! Object and factory definitions may omit constructor or factory arguments.
//! The decorator reads the target's signature from the class registry and
//! fills the gaps: class-typed parameters become aliases to the class name,
//! builtin-typed parameters become aliases to an entry of the same name when
//! one exists, and optional parameters keep their defaults. Anything else is a
//! definition error, reported here rather than at resolution time.

use crate::chain::SourceChain;
use crate::definition::{
  ArrayDefinition, Definition, DefinitionEntry, EnvDefinition, FactoryDefinition, FactoryRef,
  ObjectDefinition,
};
use crate::error::{Error, Result};
use crate::registry::{ClassRegistry, ParamKind, Parameter, Signature};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Decorator {
  registry: Arc<ClassRegistry>,
}

impl Decorator {
  pub fn new(registry: Arc<ClassRegistry>) -> Self {
    Self { registry }
  }

  /// Returns `entry` with every object and factory definition in its tree
  /// carrying a complete argument list.
  pub fn decorate(&self, entry: DefinitionEntry, chain: &SourceChain) -> Result<DefinitionEntry> {
    let definition = self.decorate_definition(&entry.name, entry.definition, chain)?;
    Ok(DefinitionEntry {
      definition,
      ..entry
    })
  }

  fn decorate_definition(
    &self,
    context: &str,
    definition: Definition,
    chain: &SourceChain,
  ) -> Result<Definition> {
    match definition {
      Definition::Object(object) => self.decorate_object(context, object, chain).map(Definition::Object),
      Definition::Factory(factory) => self
        .decorate_factory(context, factory, chain)
        .map(Definition::Factory),
      Definition::Array(ArrayDefinition::List(items)) => {
        let items = self.decorate_list(context, items, chain)?;
        Ok(Definition::Array(ArrayDefinition::List(items)))
      }
      Definition::Array(ArrayDefinition::Map(entries)) => {
        let entries = self.decorate_map(context, entries, chain)?;
        Ok(Definition::Array(ArrayDefinition::Map(entries)))
      }
      Definition::Env(EnvDefinition {
        var_name,
        default: Some(default),
      }) => {
        let default = self.decorate_definition(&format!("{}.default", context), *default, chain)?;
        Ok(Definition::Env(EnvDefinition {
          var_name,
          default: Some(Box::new(default)),
        }))
      }
      other => Ok(other),
    }
  }

  fn decorate_list(
    &self,
    context: &str,
    items: Vec<Definition>,
    chain: &SourceChain,
  ) -> Result<Vec<Definition>> {
    items
      .into_iter()
      .enumerate()
      .map(|(i, item)| self.decorate_definition(&format!("{}.{}", context, i), item, chain))
      .collect()
  }

  fn decorate_map(
    &self,
    context: &str,
    entries: BTreeMap<String, Definition>,
    chain: &SourceChain,
  ) -> Result<BTreeMap<String, Definition>> {
    entries
      .into_iter()
      .map(|(key, item)| {
        let item = self.decorate_definition(&format!("{}.{}", context, key), item, chain)?;
        Ok((key, item))
      })
      .collect()
  }

  fn decorate_object(
    &self,
    context: &str,
    object: ObjectDefinition,
    chain: &SourceChain,
  ) -> Result<ObjectDefinition> {
    let ObjectDefinition {
      class_name,
      ctor_args,
      named_args,
      properties,
      methods,
      scope,
      lazy,
    } = object;

    let meta = self.registry.class(&class_name).ok_or_else(|| {
      Error::definition(
        context,
        format!("class '{}' is not registered and cannot be instantiated", class_name),
      )
    })?;

    let ctor_args = self.decorate_list(&format!("{}.constructor", context), ctor_args, chain)?;
    let named_args = self.decorate_map(&format!("{}.constructor", context), named_args, chain)?;
    let properties = self.decorate_map(&format!("{}.properties", context), properties, chain)?;
    let methods = methods
      .into_iter()
      .map(|(method, args)| {
        let args = self.decorate_list(&format!("{}.{}", context, method), args, chain)?;
        Ok((method, args))
      })
      .collect::<Result<Vec<_>>>()?;

    let signature = meta.constructor_signature();
    let ctor_args = if named_args.is_empty() && is_complete(&ctor_args, signature) {
      ctor_args
    } else {
      let target = format!("{}::new", class_name);
      bind_arguments(context, &target, signature, ctor_args, named_args, chain)?
    };

    Ok(ObjectDefinition {
      class_name,
      ctor_args,
      named_args: BTreeMap::new(),
      properties,
      methods,
      scope,
      lazy,
    })
  }

  fn decorate_factory(
    &self,
    context: &str,
    factory: FactoryDefinition,
    chain: &SourceChain,
  ) -> Result<FactoryDefinition> {
    let FactoryDefinition {
      factory: factory_ref,
      args,
      scope,
      lazy,
      return_type,
    } = factory;

    let factory_ref = match factory_ref {
      FactoryRef::Method { owner, method } => FactoryRef::Method {
        owner: Box::new(self.decorate_definition(&format!("{}.factory", context), *owner, chain)?),
        method,
      },
      other => other,
    };

    let signature = self.factory_signature(context, &factory_ref)?;
    let args = match (args, signature) {
      (Some(args), Some((target, signature))) => {
        let args = self.decorate_list(&format!("{}.parameters", context), args, chain)?;
        if is_complete(&args, &signature) {
          args
        } else {
          bind_arguments(context, &target, &signature, args, BTreeMap::new(), chain)?
        }
      }
      (Some(args), None) => self.decorate_list(&format!("{}.parameters", context), args, chain)?,
      (None, Some((target, signature))) => infer_factory_arguments(context, &target, &signature, chain)?,
      (None, None) => Vec::new(),
    };

    Ok(FactoryDefinition {
      factory: factory_ref,
      args: Some(args),
      scope,
      lazy,
      return_type,
    })
  }

  /// The signature to introspect, or `None` when it cannot be known before the
  /// owner is resolved.
  fn factory_signature(
    &self,
    context: &str,
    factory_ref: &FactoryRef,
  ) -> Result<Option<(String, Signature)>> {
    match factory_ref {
      FactoryRef::Callable(callable) => Ok(Some((
        callable.name().to_owned(),
        callable.signature().clone(),
      ))),
      FactoryRef::Named(name) => {
        let callable = self.registry.factory(name).ok_or_else(|| {
          Error::definition(context, format!("factory '{}' is not registered", name))
        })?;
        Ok(Some((name.clone(), callable.signature().clone())))
      }
      FactoryRef::Method { owner, method } => {
        let class_name = match owner.as_ref() {
          Definition::Object(object) => Some(object.class_name.as_str()),
          Definition::Alias(target) => Some(target.as_str()),
          _ => None,
        };
        Ok(
          class_name
            .and_then(|class| self.registry.class(class))
            .and_then(|meta| {
              meta
                .method_signature(method)
                .map(|sig| (format!("{}::{}", meta.name(), method), sig.clone()))
            }),
        )
      }
    }
  }
}

fn is_complete(args: &[Definition], signature: &Signature) -> bool {
  args.len() >= signature.required_count() && args.len() <= signature.len()
}

/// The definition for a parameter nobody supplied, if one can be inferred.
fn infer_parameter(param: &Parameter, chain: &SourceChain) -> Option<Definition> {
  match &param.kind {
    ParamKind::Class(class_name) => Some(Definition::Alias(class_name.clone())),
    ParamKind::Scalar(_) | ParamKind::Untyped if chain.has(&param.name) => {
      Some(Definition::Alias(param.name.clone()))
    }
    _ => None,
  }
}

fn unguessable(context: &str, target: &str, param: &Parameter) -> Error {
  Error::definition(
    context,
    format!(
      "parameter '{}' of {} has no value defined or guessable",
      param.name, target
    ),
  )
}

/// Merges user supplied positional and named arguments with inferred ones.
///
/// Optional parameters are only materialized (with their default) when a later
/// parameter has to be passed; trailing optional parameters are left out.
fn bind_arguments(
  context: &str,
  target: &str,
  signature: &Signature,
  positional: Vec<Definition>,
  mut named: BTreeMap<String, Definition>,
  chain: &SourceChain,
) -> Result<Vec<Definition>> {
  let params = signature.params();
  if positional.len() > params.len() {
    return Err(Error::definition(
      context,
      format!(
        "{} takes {} arguments but {} were given",
        target,
        params.len(),
        positional.len()
      ),
    ));
  }

  let mut last_needed = positional.len();
  for name in named.keys() {
    match signature.position(name) {
      None => {
        return Err(Error::definition(
          context,
          format!("{} has no parameter named '{}'", target, name),
        ))
      }
      Some(index) if index < positional.len() => {
        return Err(Error::definition(
          context,
          format!("parameter '{}' of {} is given twice", name, target),
        ))
      }
      Some(index) => last_needed = last_needed.max(index + 1),
    }
  }
  if let Some(last_required) = params.iter().rposition(|p| !p.is_optional()) {
    last_needed = last_needed.max(last_required + 1);
  }

  let mut bound = positional;
  for param in &params[bound.len()..last_needed] {
    let definition = match named.remove(&param.name) {
      Some(definition) => definition,
      None => match &param.default {
        Some(default) => Definition::Value(default.clone()),
        None => infer_parameter(param, chain).ok_or_else(|| unguessable(context, target, param))?,
      },
    };
    bound.push(definition);
  }
  Ok(bound)
}

/// Factories without explicit arguments get one definition per parameter,
/// optional ones included.
fn infer_factory_arguments(
  context: &str,
  target: &str,
  signature: &Signature,
  chain: &SourceChain,
) -> Result<Vec<Definition>> {
  signature
    .params()
    .iter()
    .map(|param| match &param.default {
      Some(default) => Ok(Definition::Value(default.clone())),
      None => infer_parameter(param, chain).ok_or_else(|| unguessable(context, target, param)),
    })
    .collect()
}
