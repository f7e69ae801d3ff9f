use crate::chain::SourceChain;
use crate::component::{register_components, ComponentDescriptor};
use crate::config::ContainerConfig;
use crate::container::{Container, ContainerParts};
use crate::decorator::Decorator;
use crate::definition::Definition;
use crate::error::Result;
use crate::properties::Properties;
use crate::registry::{Callable, ClassMeta, ClassRegistry};
use crate::source::{
  ArraySource, CachePool, CachedSource, ComponentScanSource, EnvSource, Environment,
  ObjectFallbackSource, PropertiesSource, Source, SystemEnvironment,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A builder for creating `Container` instances.
///
/// Sources are queried in a fixed order: explicit definitions, component
/// bindings, custom sources, properties, the environment and finally
/// autowiring of registered classes.
pub struct ContainerBuilder {
  config: ContainerConfig,
  registry: ClassRegistry,
  definitions: Vec<(String, Definition)>,
  components: Vec<ComponentDescriptor>,
  sources: Vec<Arc<dyn Source>>,
  properties: Option<Arc<dyn Properties>>,
  environment: Arc<dyn Environment>,
  definition_cache: Option<Arc<dyn CachePool>>,
  mutable: bool,
}

impl fmt::Debug for ContainerBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerBuilder")
      .field("config", &self.config)
      .field("definitions", &self.definitions.len())
      .field("components", &self.components.len())
      .field("custom_sources", &self.sources.len())
      .field("has_properties", &self.properties.is_some())
      .field("has_definition_cache", &self.definition_cache.is_some())
      .field("mutable", &self.mutable)
      .finish_non_exhaustive()
  }
}

impl Default for ContainerBuilder {
  fn default() -> Self {
    Self {
      config: ContainerConfig::default(),
      registry: ClassRegistry::new(),
      definitions: Vec::new(),
      components: Vec::new(),
      sources: Vec::new(),
      properties: None,
      environment: Arc::new(SystemEnvironment),
      definition_cache: None,
      mutable: true,
    }
  }
}

impl ContainerBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_config(mut self, config: ContainerConfig) -> Self {
    self.config = config;
    self
  }

  /// Turns autowiring of registered but unbound classes on or off.
  pub fn autowire(mut self, enabled: bool) -> Self {
    self.config.autowire = enabled;
    self
  }

  pub fn register_class(mut self, meta: ClassMeta) -> Self {
    self.registry.register_class(meta);
    self
  }

  pub fn register_factory(mut self, callable: Callable) -> Self {
    self.registry.register_factory(callable);
    self
  }

  /// Replaces the class registry wholesale.
  pub fn with_registry(mut self, registry: ClassRegistry) -> Self {
    self.registry = registry;
    self
  }

  /// Adds an explicit definition. Later definitions of the same name replace
  /// earlier ones.
  pub fn add_definition(mut self, name: impl Into<String>, definition: impl Into<Definition>) -> Self {
    self.definitions.push((name.into(), definition.into()));
    self
  }

  pub fn add_definitions<K: Into<String>>(
    mut self,
    definitions: impl IntoIterator<Item = (K, Definition)>,
  ) -> Self {
    self
      .definitions
      .extend(definitions.into_iter().map(|(name, def)| (name.into(), def)));
    self
  }

  pub fn add_component(mut self, descriptor: ComponentDescriptor) -> Self {
    self.components.push(descriptor);
    self
  }

  /// Adds a custom source, consulted after component bindings.
  pub fn add_source(mut self, source: Arc<dyn Source>) -> Self {
    self.sources.push(source);
    self
  }

  pub fn with_properties(mut self, properties: Arc<dyn Properties>) -> Self {
    self.properties = Some(properties);
    self
  }

  pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
    self.environment = environment;
    self
  }

  /// Caches autowired definitions in a persistent pool shared across containers.
  pub fn with_definition_cache(mut self, pool: Arc<dyn CachePool>) -> Self {
    self.definition_cache = Some(pool);
    self
  }

  /// Builds a container without a mutable source; `set` will fail.
  pub fn read_only(mut self) -> Self {
    self.mutable = false;
    self
  }

  /// Assembles the source chain, then evaluates and registers components.
  pub fn build(self) -> Result<Container> {
    let ContainerBuilder {
      config,
      registry,
      definitions,
      components,
      sources: custom_sources,
      properties,
      environment,
      definition_cache,
      mutable,
    } = self;
    config.validate()?;

    let registry = Arc::new(registry);
    let explicit = Arc::new(ArraySource::from_definitions(definitions));
    let scanned = Arc::new(ComponentScanSource::new());

    let mut sources: Vec<Arc<dyn Source>> = Vec::new();
    if !mutable {
      sources.push(explicit.clone());
    }
    sources.push(scanned.clone());
    sources.extend(custom_sources);
    if let Some(properties) = &properties {
      sources.push(Arc::new(PropertiesSource::new(properties.clone())));
    }
    sources.push(Arc::new(EnvSource::new(
      environment.clone(),
      config.env_prefix.clone(),
    )));
    if config.autowire {
      let fallback: Arc<dyn Source> = Arc::new(ObjectFallbackSource::new(registry.clone()));
      let fallback: Arc<dyn Source> = match definition_cache {
        Some(pool) => Arc::new(CachedSource::new(fallback, pool, config.cache_namespace.as_str())),
        None => fallback,
      };
      sources.push(fallback);
    }

    let chain = SourceChain::new(sources, Decorator::new(registry.clone()));
    let chain = if mutable {
      chain.with_mutable(explicit)
    } else {
      chain
    };

    let container = Container::from_parts(ContainerParts {
      chain,
      registry,
      properties,
      environment,
      config,
    });
    let summary = register_components(&container, &scanned, components)?;

    debug!(
      sources = container.source_count(),
      components_accepted = summary.accepted,
      components_rejected = summary.rejected,
      binding_conflicts = summary.conflicts,
      "container built"
    );
    Ok(container)
  }
}
