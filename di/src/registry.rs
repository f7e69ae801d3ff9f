//! The runtime type registry standing in for reflection.
//!
//! Every class the container may construct is described by a [`ClassMeta`]: its
//! name, the interfaces it implements, its constructor signature and a
//! constructor function. The decorator reads signatures to infer wiring, the
//! object resolver calls the constructor. Factories are registered the same way
//! as [`Callable`]s.

use crate::error::Result;
use crate::value::{Args, Instance, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
  /// A class or interface name; resolvable through the container.
  Class(String),
  /// A builtin type such as `string` or `int`.
  Scalar(String),
  Untyped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
  pub name: String,
  pub kind: ParamKind,
  /// The literal default. A parameter with a default is optional.
  pub default: Option<Value>,
}

impl Parameter {
  pub fn is_optional(&self) -> bool {
    self.default.is_some()
  }

  pub fn class_name(&self) -> Option<&str> {
    match &self.kind {
      ParamKind::Class(name) => Some(name),
      _ => None,
    }
  }
}

/// An ordered parameter list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
  params: Vec<Parameter>,
}

impl Signature {
  pub fn new() -> Self {
    Self::default()
  }

  fn push(mut self, name: &str, kind: ParamKind, default: Option<Value>) -> Self {
    self.params.push(Parameter {
      name: name.to_owned(),
      kind,
      default,
    });
    self
  }

  /// A required parameter typed as a class or interface.
  pub fn class(self, name: &str, class_name: &str) -> Self {
    self.push(name, ParamKind::Class(class_name.to_owned()), None)
  }

  /// A required builtin-typed parameter.
  pub fn scalar(self, name: &str, type_name: &str) -> Self {
    self.push(name, ParamKind::Scalar(type_name.to_owned()), None)
  }

  pub fn untyped(self, name: &str) -> Self {
    self.push(name, ParamKind::Untyped, None)
  }

  /// An optional parameter with a literal default.
  pub fn optional(self, name: &str, kind: ParamKind, default: impl Into<Value>) -> Self {
    self.push(name, kind, Some(default.into()))
  }

  pub fn params(&self) -> &[Parameter] {
    &self.params
  }

  pub fn len(&self) -> usize {
    self.params.len()
  }

  pub fn is_empty(&self) -> bool {
    self.params.is_empty()
  }

  pub fn position(&self, name: &str) -> Option<usize> {
    self.params.iter().position(|p| p.name == name)
  }

  pub fn required_count(&self) -> usize {
    self.params.iter().filter(|p| !p.is_optional()).count()
  }
}

pub type CallFn = Arc<dyn Fn(Args) -> Result<Value> + Send + Sync>;
pub type ConstructFn = Arc<dyn Fn(Args) -> Result<Instance> + Send + Sync>;

/// A named function with a declared signature, used as a factory.
#[derive(Clone)]
pub struct Callable {
  name: String,
  signature: Signature,
  func: CallFn,
}

impl Callable {
  pub fn new(
    name: impl Into<String>,
    signature: Signature,
    func: impl Fn(Args) -> Result<Value> + Send + Sync + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      signature,
      func: Arc::new(func),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn signature(&self) -> &Signature {
    &self.signature
  }

  pub fn call(&self, args: Vec<Value>) -> Result<Value> {
    (self.func)(Args::new(self.name.as_str(), args))
  }
}

impl fmt::Debug for Callable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Callable")
      .field("name", &self.name)
      .field("signature", &self.signature)
      .finish()
  }
}

impl PartialEq for Callable {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
  }
}

/// Metadata and constructor of one registered class.
#[derive(Clone)]
pub struct ClassMeta {
  name: String,
  interfaces: Vec<String>,
  constructor: Signature,
  methods: HashMap<String, Signature>,
  construct: ConstructFn,
}

impl ClassMeta {
  pub fn new(
    name: impl Into<String>,
    construct: impl Fn(Args) -> Result<Instance> + Send + Sync + 'static,
  ) -> Self {
    Self {
      name: name.into(),
      interfaces: Vec::new(),
      constructor: Signature::new(),
      methods: HashMap::new(),
      construct: Arc::new(construct),
    }
  }

  pub fn implements(mut self, interface: impl Into<String>) -> Self {
    self.interfaces.push(interface.into());
    self
  }

  pub fn constructor(mut self, signature: Signature) -> Self {
    self.constructor = signature;
    self
  }

  /// Declares the signature of a method usable as a factory or injection target.
  pub fn method(mut self, name: impl Into<String>, signature: Signature) -> Self {
    self.methods.insert(name.into(), signature);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn interfaces(&self) -> &[String] {
    &self.interfaces
  }

  pub fn constructor_signature(&self) -> &Signature {
    &self.constructor
  }

  pub fn method_signature(&self, name: &str) -> Option<&Signature> {
    self.methods.get(name)
  }

  pub fn instantiate(&self, args: Vec<Value>) -> Result<Instance> {
    (self.construct)(Args::new(self.name.as_str(), args))
  }
}

impl fmt::Debug for ClassMeta {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ClassMeta")
      .field("name", &self.name)
      .field("interfaces", &self.interfaces)
      .field("constructor", &self.constructor)
      .finish()
  }
}

/// All classes and named factories known to one container.
///
/// The builder owns a mutable registry while a container is assembled; once
/// built, the container holds it behind an `Arc` and it no longer changes.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
  classes: HashMap<String, Arc<ClassMeta>>,
  factories: HashMap<String, Callable>,
}

impl ClassRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a class, replacing any earlier registration of the same name.
  pub fn register_class(&mut self, meta: ClassMeta) -> &mut Self {
    self.classes.insert(meta.name.clone(), Arc::new(meta));
    self
  }

  pub fn register_factory(&mut self, callable: Callable) -> &mut Self {
    self.factories.insert(callable.name.clone(), callable);
    self
  }

  pub fn class(&self, name: &str) -> Option<&Arc<ClassMeta>> {
    self.classes.get(name)
  }

  pub fn contains_class(&self, name: &str) -> bool {
    self.classes.contains_key(name)
  }

  pub fn factory(&self, name: &str) -> Option<&Callable> {
    self.factories.get(name)
  }

  /// Names of registered classes implementing `interface`, sorted.
  pub fn implementors(&self, interface: &str) -> Vec<&str> {
    let mut names: Vec<&str> = self
      .classes
      .values()
      .filter(|meta| meta.interfaces.iter().any(|i| i == interface))
      .map(|meta| meta.name.as_str())
      .collect();
    names.sort_unstable();
    names
  }
}
