//! Dynamic values produced by resolution and the `Service` capability surface.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Upcasting support for services. Implemented for every sized `Send + Sync` type.
pub trait AsAny: Any + Send + Sync {
  fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
  fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
    self
  }
}

/// The capability surface every container-managed object exposes.
///
/// Services are constructed through the `ClassRegistry` and receive their
/// dependencies as constructor arguments. Property and method injection go
/// through `set_property` and `invoke`, so types that support them keep the
/// relevant fields behind interior mutability.
///
/// Proxies implement this trait too: they force their target into existence and
/// forward every call, which is why callers never need to know whether they hold
/// a proxy or the real thing.
pub trait Service: AsAny {
  /// Calls a named capability on the service.
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    let _ = args;
    Err(Error::invocation(method, "method is not supported by this service"))
  }

  /// Assigns an injected property.
  fn set_property(&self, name: &str, value: Value) -> Result<()> {
    let _ = value;
    Err(Error::invocation(name, "property is not supported by this service"))
  }

  /// For wrappers (proxies, deferred objects): the wrapped instance, forcing it
  /// into existence if needed. Concrete services return `None`.
  fn target(&self) -> Result<Option<Instance>> {
    Ok(None)
  }
}

/// A shared handle to a container-managed object.
pub type Instance = Arc<dyn Service>;

/// Follows wrapper targets down to the concrete service.
pub fn concrete(instance: &Instance) -> Result<Instance> {
  let mut current = instance.clone();
  while let Some(next) = current.target()? {
    current = next;
  }
  Ok(current)
}

/// Downcasts an instance, looking through proxies and deferred wrappers.
pub fn downcast<T: Any + Send + Sync>(instance: &Instance) -> Option<Arc<T>> {
  concrete(instance).ok()?.into_any().downcast::<T>().ok()
}

/// A dynamically typed value.
///
/// Everything except `Object` is plain data and can be written to a definition
/// cache. Maps keep their keys sorted so resolution output is deterministic.
#[derive(Clone, Default, Serialize, Deserialize)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
  #[serde(skip)]
  Object(Instance),
}

impl Value {
  pub fn kind(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Str(_) => "string",
      Value::List(_) => "list",
      Value::Map(_) => "map",
      Value::Object(_) => "object",
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Str(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Value::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_float(&self) -> Option<f64> {
    match self {
      Value::Float(f) => Some(*f),
      Value::Int(i) => Some(*i as f64),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Value::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[Value]> {
    match self {
      Value::List(items) => Some(items),
      _ => None,
    }
  }

  pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
    match self {
      Value::Map(map) => Some(map),
      _ => None,
    }
  }

  pub fn as_object(&self) -> Option<&Instance> {
    match self {
      Value::Object(instance) => Some(instance),
      _ => None,
    }
  }

  /// Downcasts an object value to its concrete service type.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.as_object().and_then(downcast::<T>)
  }

  /// Whether this value contains a live object anywhere in its tree.
  pub fn contains_object(&self) -> bool {
    match self {
      Value::Object(_) => true,
      Value::List(items) => items.iter().any(Value::contains_object),
      Value::Map(map) => map.values().any(Value::contains_object),
      _ => false,
    }
  }

  /// The string form used for template interpolation. Objects and nested
  /// collections have no string form.
  pub fn to_template_string(&self) -> Option<String> {
    match self {
      Value::Null => Some(String::new()),
      Value::Bool(b) => Some(b.to_string()),
      Value::Int(i) => Some(i.to_string()),
      Value::Float(f) => Some(f.to_string()),
      Value::Str(s) => Some(s.clone()),
      Value::List(_) | Value::Map(_) | Value::Object(_) => None,
    }
  }

  /// Identity comparison for objects, structural for everything else.
  pub fn same(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
      _ => self == other,
    }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Bool(a), Value::Bool(b)) => a == b,
      (Value::Int(a), Value::Int(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::Str(a), Value::Str(b)) => a == b,
      (Value::List(a), Value::List(b)) => a == b,
      (Value::Map(a), Value::Map(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => write!(f, "Null"),
      Value::Bool(b) => write!(f, "Bool({})", b),
      Value::Int(i) => write!(f, "Int({})", i),
      Value::Float(x) => write!(f, "Float({})", x),
      Value::Str(s) => write!(f, "Str({:?})", s),
      Value::List(items) => f.debug_list().entries(items).finish(),
      Value::Map(map) => f.debug_map().entries(map).finish(),
      Value::Object(instance) => write!(f, "Object({:p})", Arc::as_ptr(instance)),
    }
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Str(s.to_owned())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Str(s)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<i32> for Value {
  fn from(i: i32) -> Self {
    Value::Int(i64::from(i))
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<Instance> for Value {
  fn from(instance: Instance) -> Self {
    Value::Object(instance)
  }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
  fn from(items: Vec<T>) -> Self {
    Value::List(items.into_iter().map(Into::into).collect())
  }
}

impl From<serde_json::Value> for Value {
  fn from(json: serde_json::Value) -> Self {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or_default()),
      },
      serde_json::Value::String(s) => Value::Str(s),
      serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
      serde_json::Value::Object(map) => {
        Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
      }
    }
  }
}

/// Positional arguments handed to constructors, factories and service methods.
#[derive(Debug, Clone, Default)]
pub struct Args {
  target: String,
  values: Vec<Value>,
}

impl Args {
  pub fn new(target: impl Into<String>, values: Vec<Value>) -> Self {
    Self {
      target: target.into(),
      values,
    }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Value> {
    self.values.get(index)
  }

  pub fn into_vec(self) -> Vec<Value> {
    self.values
  }

  fn require(&self, index: usize) -> Result<&Value> {
    self.values.get(index).ok_or_else(|| {
      Error::invocation(
        self.target.as_str(),
        format!("missing argument #{} (got {})", index, self.values.len()),
      )
    })
  }

  fn mismatch(&self, index: usize, expected: &str, got: &Value) -> Error {
    Error::invocation(
      self.target.as_str(),
      format!("argument #{} must be {}, got {}", index, expected, got.kind()),
    )
  }

  pub fn string(&self, index: usize) -> Result<String> {
    let value = self.require(index)?;
    value
      .as_str()
      .map(str::to_owned)
      .ok_or_else(|| self.mismatch(index, "a string", value))
  }

  pub fn int(&self, index: usize) -> Result<i64> {
    let value = self.require(index)?;
    value.as_int().ok_or_else(|| self.mismatch(index, "an int", value))
  }

  pub fn float(&self, index: usize) -> Result<f64> {
    let value = self.require(index)?;
    value.as_float().ok_or_else(|| self.mismatch(index, "a float", value))
  }

  pub fn bool(&self, index: usize) -> Result<bool> {
    let value = self.require(index)?;
    value.as_bool().ok_or_else(|| self.mismatch(index, "a bool", value))
  }

  pub fn object(&self, index: usize) -> Result<Instance> {
    let value = self.require(index)?;
    value
      .as_object()
      .cloned()
      .ok_or_else(|| self.mismatch(index, "an object", value))
  }

  /// The argument downcast to a concrete service type.
  pub fn service<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    let instance = self.object(index)?;
    downcast::<T>(&instance).ok_or_else(|| {
      Error::invocation(
        self.target.as_str(),
        format!(
          "argument #{} is not a {}",
          index,
          std::any::type_name::<T>()
        ),
      )
    })
  }
}
