//! Immutable descriptions of how to produce an entry's value.

use crate::registry::Callable;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Instance sharing policy of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
  /// Resolved once and cached for the container's lifetime.
  #[default]
  Singleton,
  /// Resolved fresh on every lookup.
  Prototype,
  /// Resolved once per unit of work.
  Request,
}

/// A definition, the tagged union every source produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Definition {
  Value(Value),
  Alias(String),
  Object(ObjectDefinition),
  Factory(FactoryDefinition),
  Array(ArrayDefinition),
  String(String),
  Env(EnvDefinition),
}

impl Definition {
  pub fn kind(&self) -> DefinitionKind {
    match self {
      Definition::Value(_) => DefinitionKind::Value,
      Definition::Alias(_) => DefinitionKind::Alias,
      Definition::Object(_) => DefinitionKind::Object,
      Definition::Factory(_) => DefinitionKind::Factory,
      Definition::Array(_) => DefinitionKind::Array,
      Definition::String(_) => DefinitionKind::String,
      Definition::Env(_) => DefinitionKind::Env,
    }
  }

  /// The scope the container caches this definition's result under. `None`
  /// for kinds that are never cached themselves: literals need no caching and
  /// aliases inherit whatever their target does.
  pub fn scope(&self) -> Option<Scope> {
    match self {
      Definition::Value(_) | Definition::Alias(_) => None,
      Definition::Object(object) => Some(object.scope),
      Definition::Factory(factory) => Some(factory.scope),
      Definition::Array(_) | Definition::String(_) | Definition::Env(_) => Some(Scope::Singleton),
    }
  }

  pub fn is_lazy(&self) -> bool {
    match self {
      Definition::Object(object) => object.lazy,
      Definition::Factory(factory) => factory.lazy,
      _ => false,
    }
  }

  /// Whether this definition can be written to a persistent definition cache.
  pub fn is_serializable(&self) -> bool {
    serde_json::to_vec(self).is_ok()
  }
}

impl From<Value> for Definition {
  fn from(value: Value) -> Self {
    Definition::Value(value)
  }
}

impl From<ObjectDefinition> for Definition {
  fn from(object: ObjectDefinition) -> Self {
    Definition::Object(object)
  }
}

impl From<FactoryDefinition> for Definition {
  fn from(factory: FactoryDefinition) -> Self {
    Definition::Factory(factory)
  }
}

impl From<ArrayDefinition> for Definition {
  fn from(array: ArrayDefinition) -> Self {
    Definition::Array(array)
  }
}

impl From<EnvDefinition> for Definition {
  fn from(env: EnvDefinition) -> Self {
    Definition::Env(env)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
  Value,
  Alias,
  Object,
  Factory,
  Array,
  String,
  Env,
}

impl fmt::Display for DefinitionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      DefinitionKind::Value => "value",
      DefinitionKind::Alias => "alias",
      DefinitionKind::Object => "object",
      DefinitionKind::Factory => "factory",
      DefinitionKind::Array => "array",
      DefinitionKind::String => "string",
      DefinitionKind::Env => "env",
    };
    f.write_str(name)
  }
}

/// Builds an instance of a registered class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDefinition {
  pub class_name: String,
  /// Positional constructor arguments.
  pub ctor_args: Vec<Definition>,
  /// Constructor arguments bound by parameter name.
  pub named_args: BTreeMap<String, Definition>,
  pub properties: BTreeMap<String, Definition>,
  /// Method injections, applied in declaration order. A method listed twice is
  /// called once per argument set.
  pub methods: Vec<(String, Vec<Definition>)>,
  pub scope: Scope,
  pub lazy: bool,
}

impl ObjectDefinition {
  pub fn new(class_name: impl Into<String>) -> Self {
    Self {
      class_name: class_name.into(),
      ctor_args: Vec::new(),
      named_args: BTreeMap::new(),
      properties: BTreeMap::new(),
      methods: Vec::new(),
      scope: Scope::Singleton,
      lazy: false,
    }
  }

  pub fn arg(mut self, arg: impl Into<Definition>) -> Self {
    self.ctor_args.push(arg.into());
    self
  }

  pub fn named_arg(mut self, name: impl Into<String>, arg: impl Into<Definition>) -> Self {
    self.named_args.insert(name.into(), arg.into());
    self
  }

  pub fn property(mut self, name: impl Into<String>, value: impl Into<Definition>) -> Self {
    self.properties.insert(name.into(), value.into());
    self
  }

  pub fn method(mut self, name: impl Into<String>, args: Vec<Definition>) -> Self {
    self.methods.push((name.into(), args));
    self
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn lazy(mut self) -> Self {
    self.lazy = true;
    self
  }

  /// Whether properties or method calls still have to be applied after construction.
  pub fn has_injections(&self) -> bool {
    !self.properties.is_empty() || !self.methods.is_empty()
  }
}

/// The callable a factory definition invokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FactoryRef {
  /// A factory function registered by name in the class registry.
  Named(String),
  /// A method called on another entry's value.
  Method { owner: Box<Definition>, method: String },
  /// An ad-hoc closure. Never written to a definition cache.
  #[serde(skip)]
  Callable(Callable),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryDefinition {
  pub factory: FactoryRef,
  /// `None` until either the user or the decorator supplies arguments.
  pub args: Option<Vec<Definition>>,
  pub scope: Scope,
  pub lazy: bool,
  pub return_type: Option<String>,
}

impl FactoryDefinition {
  pub fn new(factory: FactoryRef) -> Self {
    Self {
      factory,
      args: None,
      scope: Scope::Singleton,
      lazy: false,
      return_type: None,
    }
  }

  pub fn args(mut self, args: Vec<Definition>) -> Self {
    self.args = Some(args);
    self
  }

  pub fn scope(mut self, scope: Scope) -> Self {
    self.scope = scope;
    self
  }

  pub fn lazy(mut self) -> Self {
    self.lazy = true;
    self
  }

  pub fn returns(mut self, type_name: impl Into<String>) -> Self {
    self.return_type = Some(type_name.into());
    self
  }
}

/// A list or keyed collection whose elements are resolved recursively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayDefinition {
  List(Vec<Definition>),
  Map(BTreeMap<String, Definition>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvDefinition {
  pub var_name: String,
  pub default: Option<Box<Definition>>,
}

/// A definition bound to a name, as handed out by the source chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionEntry {
  pub name: String,
  pub definition: Definition,
  pub unique_id: u64,
}

impl DefinitionEntry {
  pub fn new(name: impl Into<String>, definition: Definition, unique_id: u64) -> Self {
    Self {
      name: name.into(),
      definition,
      unique_id,
    }
  }

  /// An entry for a nested definition, named after its position in this one.
  pub fn sub_entry(&self, segment: &str, definition: Definition) -> DefinitionEntry {
    DefinitionEntry {
      name: format!("{}.{}", self.name, segment),
      definition,
      unique_id: self.unique_id,
    }
  }

  /// The name used in traces, qualified by the entry's unique id.
  pub fn trace_name(&self) -> String {
    format!("{}#{}", self.name, self.unique_id)
  }
}

// --- Shorthand constructors ---

pub fn value(value: impl Into<Value>) -> Definition {
  Definition::Value(value.into())
}

pub fn alias(target: impl Into<String>) -> Definition {
  Definition::Alias(target.into())
}

pub fn object(class_name: impl Into<String>) -> ObjectDefinition {
  ObjectDefinition::new(class_name)
}

pub fn factory(name: impl Into<String>) -> FactoryDefinition {
  FactoryDefinition::new(FactoryRef::Named(name.into()))
}

pub fn factory_fn(callable: Callable) -> FactoryDefinition {
  FactoryDefinition::new(FactoryRef::Callable(callable))
}

pub fn factory_method(owner: Definition, method: impl Into<String>) -> FactoryDefinition {
  FactoryDefinition::new(FactoryRef::Method {
    owner: Box::new(owner),
    method: method.into(),
  })
}

pub fn list(items: Vec<Definition>) -> Definition {
  Definition::Array(ArrayDefinition::List(items))
}

pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Definition)>) -> Definition {
  Definition::Array(ArrayDefinition::Map(
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
  ))
}

pub fn string(template: impl Into<String>) -> Definition {
  Definition::String(template.into())
}

pub fn env(var_name: impl Into<String>) -> Definition {
  Definition::Env(EnvDefinition {
    var_name: var_name.into(),
    default: None,
  })
}

pub fn env_or(var_name: impl Into<String>, default: Definition) -> Definition {
  Definition::Env(EnvDefinition {
    var_name: var_name.into(),
    default: Some(Box::new(default)),
  })
}
