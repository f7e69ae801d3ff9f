//! Predicates deciding whether a component descriptor becomes a binding.
//!
//! Conditions are evaluated once per descriptor, in declaration order, against
//! the container as it has been assembled so far. A condition that cannot be
//! evaluated at all (as opposed to one that is simply false) fails the build.

use crate::container::Container;
use crate::error::{Error, Result};
use crate::value::Value;

pub trait Condition: Send + Sync {
  fn matches(&self, container: &Container) -> Result<bool>;

  /// A short human readable form, used in logs and errors.
  fn describe(&self) -> String;
}

/// Matches when every inner condition matches. Stops at the first miss.
pub struct AllConditions(Vec<Box<dyn Condition>>);

impl AllConditions {
  pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
    Self(conditions)
  }
}

impl Condition for AllConditions {
  fn matches(&self, container: &Container) -> Result<bool> {
    for condition in &self.0 {
      if !condition.matches(container)? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn describe(&self) -> String {
    format!("all({})", describe_all(&self.0))
  }
}

/// Matches when no inner condition matches. Stops at the first hit.
pub struct NoneCondition(Vec<Box<dyn Condition>>);

impl NoneCondition {
  pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
    Self(conditions)
  }
}

impl Condition for NoneCondition {
  fn matches(&self, container: &Container) -> Result<bool> {
    for condition in &self.0 {
      if condition.matches(container)? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  fn describe(&self) -> String {
    format!("none({})", describe_all(&self.0))
  }
}

/// Matches when at least one inner condition matches. Stops at the first hit.
pub struct AnyCondition(Vec<Box<dyn Condition>>);

impl AnyCondition {
  pub fn new(conditions: Vec<Box<dyn Condition>>) -> Self {
    Self(conditions)
  }
}

impl Condition for AnyCondition {
  fn matches(&self, container: &Container) -> Result<bool> {
    for condition in &self.0 {
      if condition.matches(container)? {
        return Ok(true);
      }
    }
    Ok(false)
  }

  fn describe(&self) -> String {
    format!("any({})", describe_all(&self.0))
  }
}

fn describe_all(conditions: &[Box<dyn Condition>]) -> String {
  conditions
    .iter()
    .map(|c| c.describe())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Matches on a configuration value.
///
/// With `having` set, the value at `path` must equal it. Without, the value
/// must be present and not `false`. A missing value matches only when
/// `match_if_missing` is set.
#[derive(Debug, Clone)]
pub struct OnProperty {
  path: String,
  having: Option<Value>,
  match_if_missing: bool,
}

impl OnProperty {
  pub fn new(path: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      having: None,
      match_if_missing: false,
    }
  }

  pub fn having(mut self, value: impl Into<Value>) -> Self {
    self.having = Some(value.into());
    self
  }

  pub fn match_if_missing(mut self) -> Self {
    self.match_if_missing = true;
    self
  }
}

impl Condition for OnProperty {
  fn matches(&self, container: &Container) -> Result<bool> {
    let properties = container.properties().ok_or_else(|| Error::ConditionEvaluation {
      condition: self.describe(),
      message: "the container has no properties configured".into(),
    })?;

    Ok(match (properties.get(&self.path), &self.having) {
      (None, _) => self.match_if_missing,
      (Some(found), Some(expected)) => found == *expected,
      (Some(found), None) => !matches!(found, Value::Bool(false)) && found.as_str() != Some("false"),
    })
  }

  fn describe(&self) -> String {
    match &self.having {
      Some(expected) => format!("property '{}' == {:?}", self.path, expected),
      None => format!("property '{}'", self.path),
    }
  }
}

/// Matches when the container already binds `name`.
#[derive(Debug, Clone)]
pub struct OnBinding(String);

impl OnBinding {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }
}

impl Condition for OnBinding {
  fn matches(&self, container: &Container) -> Result<bool> {
    Ok(container.has(&self.0))
  }

  fn describe(&self) -> String {
    format!("bound '{}'", self.0)
  }
}

/// Matches when the container does not bind `name` yet.
#[derive(Debug, Clone)]
pub struct OnMissingBinding(String);

impl OnMissingBinding {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }
}

impl Condition for OnMissingBinding {
  fn matches(&self, container: &Container) -> Result<bool> {
    Ok(!container.has(&self.0))
  }

  fn describe(&self) -> String {
    format!("missing '{}'", self.0)
  }
}

/// Matches when a class is registered with the container.
#[derive(Debug, Clone)]
pub struct OnClass(String);

impl OnClass {
  pub fn new(class_name: impl Into<String>) -> Self {
    Self(class_name.into())
  }
}

impl Condition for OnClass {
  fn matches(&self, container: &Container) -> Result<bool> {
    Ok(container.registry().contains_class(&self.0))
  }

  fn describe(&self) -> String {
    format!("class '{}'", self.0)
  }
}

/// An ad-hoc condition backed by a closure.
pub struct FnCondition {
  label: String,
  predicate: Box<dyn Fn(&Container) -> Result<bool> + Send + Sync>,
}

impl FnCondition {
  pub fn new(
    label: impl Into<String>,
    predicate: impl Fn(&Container) -> Result<bool> + Send + Sync + 'static,
  ) -> Self {
    Self {
      label: label.into(),
      predicate: Box::new(predicate),
    }
  }
}

impl Condition for FnCondition {
  fn matches(&self, container: &Container) -> Result<bool> {
    (self.predicate)(container)
  }

  fn describe(&self) -> String {
    self.label.clone()
  }
}
