//! Definition sources: independent providers of `name -> Definition` lookups.
//!
//! Sources never fail on an unknown name; they report absence and the
//! [`SourceChain`](crate::chain::SourceChain) moves on to the next one.

mod array;
mod cached;
mod component;
mod env;
mod fallback;
mod properties;

pub use array::ArraySource;
pub use cached::{CachePool, CachedSource, MemoryCachePool};
pub use component::{BindingKind, ComponentScanSource, RegisterOutcome};
pub use env::{EnvSource, Environment, MapEnvironment, SystemEnvironment};
pub use fallback::{is_valid_class_name, ObjectFallbackSource};
pub use properties::PropertiesSource;

use crate::definition::Definition;

/// A provider of definitions.
pub trait Source: Send + Sync {
  /// Whether this source binds `name`. Must not have side effects.
  fn has(&self, name: &str) -> bool;

  /// The undecorated definition bound to `name`, if any.
  fn get(&self, name: &str) -> Option<Definition>;

  /// A short label used in logs.
  fn label(&self) -> &str;
}
