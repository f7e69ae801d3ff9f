//! Turns decorated definitions into values, one resolver per definition kind.
//!
//! Resolvers are stateless. Whatever they need from the outside world (nested
//! entries, the class registry, the environment) they get from the container
//! they are handed, so a single dispatcher can serve every container.

mod alias;
mod array;
mod env;
mod factory;
mod object;
mod string;
mod value;

pub use alias::AliasResolver;
pub use array::ArrayResolver;
pub use env::EnvResolver;
pub use factory::FactoryResolver;
pub use object::ObjectResolver;
pub use string::StringResolver;
pub use value::ValueResolver;

use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind, Scope};
use crate::error::{Error, Result};
use crate::proxy::Initializer;
use crate::registry::Signature;
use crate::value::{Instance, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Named constructor or factory parameter overrides, as passed to `Container::make`.
pub type Params = BTreeMap<String, Value>;

pub trait DefinitionResolver: Send + Sync {
  /// Produces the value of `entry`. Nested entries are resolved through the
  /// container, which is where caching and cycle detection happen.
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, params: &Params) -> Result<Value>;
}

/// Routes each entry to the resolver for its definition kind.
pub struct ResolverDispatcher {
  resolvers: HashMap<DefinitionKind, Arc<dyn DefinitionResolver>>,
}

impl Default for ResolverDispatcher {
  fn default() -> Self {
    let mut dispatcher = Self {
      resolvers: HashMap::new(),
    };
    dispatcher
      .register(DefinitionKind::Value, ValueResolver)
      .register(DefinitionKind::Alias, AliasResolver)
      .register(DefinitionKind::Array, ArrayResolver)
      .register(DefinitionKind::String, StringResolver)
      .register(DefinitionKind::Env, EnvResolver)
      .register(DefinitionKind::Factory, FactoryResolver)
      .register(DefinitionKind::Object, ObjectResolver);
    dispatcher
  }
}

impl ResolverDispatcher {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replaces the resolver used for `kind`.
  pub fn register(
    &mut self,
    kind: DefinitionKind,
    resolver: impl DefinitionResolver + 'static,
  ) -> &mut Self {
    self.resolvers.insert(kind, Arc::new(resolver));
    self
  }

  pub fn resolve(&self, container: &Container, entry: &DefinitionEntry, params: &Params) -> Result<Value> {
    let kind = entry.definition.kind();
    let resolver = self.resolvers.get(&kind).ok_or_else(|| {
      Error::definition(entry.name.as_str(), format!("no resolver handles {} definitions", kind))
    })?;
    resolver.resolve(container, entry, params)
  }
}

/// The error a resolver reports when handed a definition of another kind.
pub(crate) fn kind_mismatch(entry: &DefinitionEntry, expected: DefinitionKind) -> Error {
  Error::definition(
    entry.name.as_str(),
    format!(
      "a {} resolver cannot resolve a {} definition",
      expected,
      entry.definition.kind()
    ),
  )
}

/// Resolves every definition in `items` as a sub-entry of `entry`.
pub(crate) fn resolve_all(
  container: &Container,
  entry: &DefinitionEntry,
  segment: &str,
  items: &[Definition],
) -> Result<Vec<Value>> {
  items
    .iter()
    .enumerate()
    .map(|(i, item)| {
      let sub = entry.sub_entry(&format!("{}.{}", segment, i), item.clone());
      container.resolve_nested(&sub, &Params::new())
    })
    .collect()
}

/// Resolves the declared arguments of a constructor or factory call, with
/// `params` overriding parameters by name.
///
/// Overrides may reach past the declared arguments; any optional parameter in
/// between is passed its default.
pub(crate) fn bind_values(
  container: &Container,
  entry: &DefinitionEntry,
  segment: &str,
  signature: Option<&Signature>,
  declared: &[Definition],
  params: &Params,
) -> Result<Vec<Value>> {
  let mut overrides = BTreeMap::new();
  if !params.is_empty() {
    let signature = signature.ok_or_else(|| {
      Error::definition(
        entry.name.as_str(),
        "named parameters need a known signature to bind to",
      )
    })?;
    for (name, value) in params {
      let index = signature.position(name).ok_or_else(|| {
        Error::definition(entry.name.as_str(), format!("there is no parameter named '{}'", name))
      })?;
      overrides.insert(index, value.clone());
    }
  }

  let count = declared
    .len()
    .max(overrides.keys().next_back().map_or(0, |last| last + 1));
  let mut values = Vec::with_capacity(count);
  for index in 0..count {
    if let Some(value) = overrides.remove(&index) {
      values.push(value);
      continue;
    }
    let value = match declared.get(index) {
      Some(definition) => {
        let sub = entry.sub_entry(&format!("{}.{}", segment, index), definition.clone());
        container.resolve_nested(&sub, &Params::new())?
      }
      None => signature
        .and_then(|s| s.params().get(index))
        .and_then(|param| param.default.clone())
        .ok_or_else(|| {
          Error::definition(
            entry.name.as_str(),
            format!("argument #{} has no value and no default", index),
          )
        })?,
    };
    values.push(value);
  }
  Ok(values)
}

/// Wraps deferred construction in the proxy matching `scope`: a request proxy
/// for request-scoped bindings, a lazy proxy otherwise.
///
/// The initializer re-enters the container under the entry's resolution guard,
/// so cycles through the proxy are still detected when it is first used.
pub(crate) fn proxy_for(
  container: &Container,
  entry: &DefinitionEntry,
  scope: Scope,
  build: impl Fn(&Container) -> Result<Instance> + Send + Sync + 'static,
) -> Instance {
  let weak = container.downgrade();
  let name = entry.name.clone();
  let initializer: Initializer = {
    let weak = weak.clone();
    let name = name.clone();
    Box::new(move || {
      let container = weak.upgrade(&name)?;
      container.guarded(&name, || build(&container))
    })
  };

  match scope {
    Scope::Request => container.proxies().request(&name, weak, initializer),
    Scope::Singleton | Scope::Prototype => container.proxies().lazy(&name, initializer),
  }
}
