//! The `Container` facade and its request units of work.

use crate::chain::SourceChain;
use crate::config::ContainerConfig;
use crate::core::ResolutionGuard;
use crate::definition::{Definition, DefinitionEntry, Scope};
use crate::error::{Error, Result};
use crate::properties::Properties;
use crate::proxy::ProxyFactory;
use crate::registry::ClassRegistry;
use crate::resolver::{Params, ResolverDispatcher};
use crate::scope::{RequestScope, UnitGuard, UnitId};
use crate::source::Environment;
use crate::value::{downcast, Instance, Value};
use dashmap::DashMap;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct ContainerInner {
  id: u64,
  chain: SourceChain,
  dispatcher: ResolverDispatcher,
  proxies: ProxyFactory,
  singletons: DashMap<String, Value>,
  /// Singletons under construction, per thread: the entry id and, once
  /// constructed, the instance still being wired.
  in_construction: DashMap<(ThreadId, String), (u64, Option<Instance>)>,
  request_instances: DashMap<(UnitId, String), Instance>,
  registry: Arc<ClassRegistry>,
  properties: Option<Arc<dyn Properties>>,
  environment: Arc<dyn Environment>,
  config: ContainerConfig,
}

/// The dependency injection container.
///
/// Cloning is cheap and yields a handle to the same container. All lookups go
/// through the source chain; results are cached according to the scope of the
/// entry that produced them.
#[derive(Clone)]
pub struct Container {
  inner: Arc<ContainerInner>,
}

/// Everything a container is assembled from. Built by `ContainerBuilder`.
pub(crate) struct ContainerParts {
  pub chain: SourceChain,
  pub registry: Arc<ClassRegistry>,
  pub properties: Option<Arc<dyn Properties>>,
  pub environment: Arc<dyn Environment>,
  pub config: ContainerConfig,
}

impl Container {
  pub(crate) fn from_parts(parts: ContainerParts) -> Self {
    Self {
      inner: Arc::new(ContainerInner {
        id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
        chain: parts.chain,
        dispatcher: ResolverDispatcher::new(),
        proxies: ProxyFactory,
        singletons: DashMap::new(),
        in_construction: DashMap::new(),
        request_instances: DashMap::new(),
        registry: parts.registry,
        properties: parts.properties,
        environment: parts.environment,
        config: parts.config,
      }),
    }
  }

  // --- Lookup ---

  /// Whether `get(name)` would find a binding. Never resolves anything.
  pub fn has(&self, name: &str) -> bool {
    self.inner.singletons.contains_key(name) || self.inner.chain.has(name)
  }

  /// Resolves an entry.
  ///
  /// Singletons are built once and shared; prototypes are built on every call;
  /// lazy and request-scoped bindings come back as proxies.
  ///
  /// A singleton object is visible to its own property and method injections
  /// on the resolving thread, so cycles through injection resolve to the same
  /// instance. Callers only ever receive it once wiring is complete.
  pub fn get(&self, name: &str) -> Result<Value> {
    if let Some(cached) = self.inner.singletons.get(name).map(|v| v.value().clone()) {
      return Ok(cached);
    }
    if let Some(early) = self.under_construction(name) {
      trace!(entry = name, "resolved to an instance still being wired");
      return Ok(Value::Object(early));
    }

    let entry = self.entry(name)?;
    trace!(entry = %entry.trace_name(), kind = %entry.definition.kind(), "resolving");
    let value = if hands_out_proxy(&entry.definition) {
      // Proxy creation does not recurse; the proxy guards its own initialization.
      self.resolve_nested(&entry, &Params::new())?
    } else if entry.definition.scope() == Some(Scope::Singleton) {
      self.guarded(name, || {
        self.constructing(&entry, || self.resolve_nested(&entry, &Params::new()))
      })?
    } else {
      self.guarded(name, || self.resolve_nested(&entry, &Params::new()))?
    };

    if entry.definition.scope() == Some(Scope::Singleton) {
      // A concurrent resolution may have stored first; everyone gets that one.
      let stored = self.inner.singletons.entry(name.to_owned()).or_insert(value);
      return Ok(stored.value().clone());
    }
    Ok(value)
  }

  /// Resolves an entry and downcasts the resulting object to `T`, looking
  /// through proxies and deferred wrappers.
  pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let value = self.get(name)?;
    let instance = value.as_object().ok_or_else(|| {
      Error::definition(name, format!("expected an object, got {}", value.kind()))
    })?;
    downcast::<T>(instance).ok_or_else(|| {
      Error::definition(
        name,
        format!("resolved object is not a {}", std::any::type_name::<T>()),
      )
    })
  }

  /// Builds a fresh value for `name`, overriding constructor (or factory)
  /// parameters by name. The result is never cached, whatever the scope.
  pub fn make(&self, name: &str, params: Params) -> Result<Value> {
    let entry = self.entry(name)?;
    if let Definition::Alias(target) = &entry.definition {
      return self.guarded(name, || self.make(target, params));
    }
    self.guarded(name, || self.resolve_nested(&entry, &params))
  }

  // --- Mutation ---

  /// Binds `name` in the container's mutable source, replacing any previous
  /// binding and dropping a cached singleton of that name.
  pub fn set(&self, name: &str, definition: impl Into<Definition>) -> Result<()> {
    self.inner.chain.set(name, definition.into())?;
    self.inner.singletons.remove(name);
    debug!(entry = name, "definition replaced");
    Ok(())
  }

  pub fn is_mutable(&self) -> bool {
    self.inner.chain.is_mutable()
  }

  // --- Units of work ---

  /// Starts a unit of work on the current thread. Request-scoped instances
  /// created while it is active are released when the guard drops.
  pub fn begin_request(&self) -> RequestGuard {
    let unit = UnitId::next();
    trace!(unit = unit.as_u64(), "request started");
    RequestGuard {
      container: self.clone(),
      unit,
      _active: RequestScope::enter(unit),
    }
  }

  /// Releases every request-scoped instance created for `unit`.
  pub fn end_request(&self, unit: UnitId) {
    self.inner.request_instances.retain(|(owner, _), _| *owner != unit);
    trace!(unit = unit.as_u64(), "request ended");
  }

  /// Number of live request-scoped instances across all units.
  pub fn request_instance_count(&self) -> usize {
    self.inner.request_instances.len()
  }

  // --- Collaborators ---

  pub fn registry(&self) -> &ClassRegistry {
    &self.inner.registry
  }

  pub fn properties(&self) -> Option<&Arc<dyn Properties>> {
    self.inner.properties.as_ref()
  }

  pub fn environment(&self) -> &Arc<dyn Environment> {
    &self.inner.environment
  }

  pub fn config(&self) -> &ContainerConfig {
    &self.inner.config
  }

  // --- Crate internals ---

  fn entry(&self, name: &str) -> Result<Arc<DefinitionEntry>> {
    self.inner.chain.get(name)?.ok_or_else(|| Error::not_found(name))
  }

  /// Dispatches an entry to its resolver, bypassing caches and cycle checks.
  pub(crate) fn resolve_nested(&self, entry: &DefinitionEntry, params: &Params) -> Result<Value> {
    self.inner.dispatcher.resolve(self, entry, params)
  }

  /// Runs `f` with `name` marked as being resolved by this container.
  pub(crate) fn guarded<T>(&self, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let _guard = ResolutionGuard::enter(self.inner.id, name, self.inner.config.max_depth)?;
    f()
  }

  /// Runs `f` with `entry` registered as a singleton under construction on
  /// this thread.
  fn constructing<T>(&self, entry: &DefinitionEntry, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let key = (thread::current().id(), entry.name.clone());
    self.inner.in_construction.insert(key.clone(), (entry.unique_id, None));
    let result = f();
    self.inner.in_construction.remove(&key);
    result
  }

  fn under_construction(&self, name: &str) -> Option<Instance> {
    let key = (thread::current().id(), name.to_owned());
    self.inner.in_construction.get(&key).and_then(|slot| slot.value().1.clone())
  }

  /// Whether an instance built for `entry` should be published before wiring.
  pub(crate) fn accepts_early(&self, entry: &DefinitionEntry) -> bool {
    let key = (thread::current().id(), entry.name.clone());
    self
      .inner
      .in_construction
      .get(&key)
      .is_some_and(|slot| slot.value().0 == entry.unique_id && slot.value().1.is_none())
  }

  /// Makes `instance` the answer to `get(entry.name)` on this thread until the
  /// resolution that registered it finishes.
  pub(crate) fn publish_early(&self, entry: &DefinitionEntry, instance: &Instance) {
    let key = (thread::current().id(), entry.name.clone());
    if let Some(mut slot) = self.inner.in_construction.get_mut(&key) {
      if slot.0 == entry.unique_id {
        slot.1 = Some(instance.clone());
      }
    }
  }

  /// The instance of `name` for `unit`, created by `init` on first use.
  pub(crate) fn request_instance(
    &self,
    unit: UnitId,
    name: &str,
    init: impl FnOnce() -> Result<Instance>,
  ) -> Result<Instance> {
    let key = (unit, name.to_owned());
    if let Some(found) = self.inner.request_instances.get(&key).map(|i| i.value().clone()) {
      return Ok(found);
    }
    // Built without holding the map entry; construction may create other
    // request instances.
    let instance = init()?;
    Ok(self.inner.request_instances.entry(key).or_insert(instance).value().clone())
  }

  /// Drops cached state for names whose binding changed during the build.
  pub(crate) fn forget(&self, name: &str) {
    self.inner.chain.invalidate(name);
    self.inner.singletons.remove(name);
  }

  pub(crate) fn proxies(&self) -> &ProxyFactory {
    &self.inner.proxies
  }

  pub(crate) fn downgrade(&self) -> WeakContainer {
    WeakContainer(Arc::downgrade(&self.inner))
  }

  pub(crate) fn source_count(&self) -> usize {
    self.inner.chain.source_count()
  }
}

/// Lazy and request-scoped bindings are handed out as proxies.
fn hands_out_proxy(definition: &Definition) -> bool {
  definition.is_lazy() || definition.scope() == Some(Scope::Request)
}

/// A non-owning handle, held by proxies so they do not keep their container alive.
#[derive(Clone)]
pub struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
  pub fn upgrade(&self, name: &str) -> Result<Container> {
    self
      .0
      .upgrade()
      .map(|inner| Container { inner })
      .ok_or_else(|| Error::ContainerDropped {
        name: name.to_owned(),
      })
  }
}

/// An active unit of work. Dropping it ends the unit: request-scoped instances
/// are released and the previously active unit, if any, is restored.
#[must_use = "the unit of work ends when the guard is dropped"]
pub struct RequestGuard {
  container: Container,
  unit: UnitId,
  _active: UnitGuard,
}

impl RequestGuard {
  pub fn unit(&self) -> UnitId {
    self.unit
  }
}

impl Drop for RequestGuard {
  fn drop(&mut self) {
    self.container.end_request(self.unit);
  }
}
