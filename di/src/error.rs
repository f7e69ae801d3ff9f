use thiserror::Error;

/// The error type for every fallible container operation.
#[derive(Debug, Error)]
pub enum Error {
  /// No source has a binding for the requested name.
  #[error("No entry or class found for '{name}'")]
  NotFound { name: String },

  /// A definition is malformed or cannot be satisfied.
  #[error("Invalid definition for '{entry}': {message}")]
  Definition { entry: String, message: String },

  /// A dependency cycle without any lazy break point.
  #[error("Circular dependency detected while resolving '{chain}'")]
  CircularDependency { chain: String },

  /// A condition could not be evaluated against the container.
  #[error("Condition '{condition}' could not be evaluated: {message}")]
  ConditionEvaluation { condition: String, message: String },

  /// A user supplied constructor, factory or method failed.
  #[error("Invocation of '{target}' failed: {message}")]
  Invocation { target: String, message: String },

  #[error("Request-scoped entry '{name}' was used outside of a unit of work")]
  NoActiveRequest { name: String },

  #[error("Resolution of '{entry}' exceeded the maximum depth of {depth}")]
  DepthExceeded { entry: String, depth: usize },

  #[error("The container backing '{name}' has been dropped")]
  ContainerDropped { name: String },

  /// A cache pool failed, or holds an entry that no longer decodes.
  ///
  /// `CachePool` implementations return it; a cached source logs it and
  /// falls back to its inner source, so it never reaches `Container::get`.
  #[error("Definition cache failure: {0}")]
  Cache(String),

  #[error("Failed to parse configuration: {0}")]
  Config(String),
}

impl Error {
  pub fn definition(entry: impl Into<String>, message: impl Into<String>) -> Self {
    Error::Definition {
      entry: entry.into(),
      message: message.into(),
    }
  }

  pub fn invocation(target: impl Into<String>, message: impl Into<String>) -> Self {
    Error::Invocation {
      target: target.into(),
      message: message.into(),
    }
  }

  pub fn not_found(name: impl Into<String>) -> Self {
    Error::NotFound { name: name.into() }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::NotFound { .. })
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
