//! # Fibre DI
//!
//! A definition-driven dependency injection container for Rust.
//!
//! Fibre DI builds object graphs from several overlapping sources of wiring
//! information: explicit definitions, component descriptors produced by a
//! metadata scan, configuration properties, environment variables and plain
//! autowiring of registered classes. Missing constructor and factory arguments
//! are inferred from declared signatures, once per entry.
//!
//! ## Core Concepts
//!
//! - **Definition**: An immutable description of how to produce a value: a
//!   literal, an alias, an object, a factory call, a list or map, a string
//!   template or an environment variable.
//! - **Source**: A provider of definitions by name. Sources are consulted in a
//!   fixed priority order; the first one that knows a name wins.
//! - **ClassRegistry**: The runtime stand-in for reflection. Classes register
//!   a constructor signature and a constructor function.
//! - **Scope**: Singletons are cached for the life of the container,
//!   prototypes are built on every lookup, request-scoped entries once per
//!   unit of work.
//! - **Lazy proxies**: A `lazy` binding is handed out as a proxy that builds
//!   the real service on first use. This is what lets two singletons refer
//!   to each other; without a lazy edge such a cycle is reported as an error.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{value, Args, ClassMeta, ContainerBuilder, Result, Service, Signature, Value};
//! use std::sync::Arc;
//!
//! struct Greeter {
//!   greeting: String,
//! }
//!
//! impl Service for Greeter {
//!   fn invoke(&self, method: &str, args: Args) -> Result<Value> {
//!     match method {
//!       "greet" => Ok(Value::from(format!("{}, {}!", self.greeting, args.string(0)?))),
//!       _ => Err(fibre_di::Error::invocation(method, "unknown method")),
//!     }
//!   }
//! }
//!
//! fn main() -> Result<()> {
//!   let container = ContainerBuilder::new()
//!     .add_definition("greeting", value("Hello"))
//!     .register_class(
//!       ClassMeta::new("Greeter", |args| Ok(Arc::new(Greeter { greeting: args.string(0)? })))
//!         .constructor(Signature::new().scalar("greeting", "string")),
//!     )
//!     .build()?;
//!
//!   // `Greeter` is not bound explicitly: it is autowired, and its `greeting`
//!   // parameter is matched to the entry of the same name.
//!   let greeter = container.get("Greeter")?;
//!   let greeting = greeter
//!     .as_object()
//!     .expect("Greeter is an object")
//!     .invoke("greet", Args::new("greet", vec![Value::from("World")]))?;
//!
//!   assert_eq!(greeting, Value::from("Hello, World!"));
//!   Ok(())
//! }
//! ```

mod builder;
mod chain;
mod component;
mod condition;
mod config;
mod container;
mod core;
mod decorator;
mod definition;
mod error;
mod macros;
mod properties;
pub mod proxy;
mod registry;
pub mod resolver;
mod scope;
pub mod source;
mod value;

pub use builder::ContainerBuilder;
pub use chain::SourceChain;
pub use component::{ComponentDescriptor, RegistrationSummary};
pub use condition::{
  AllConditions, AnyCondition, Condition, FnCondition, NoneCondition, OnBinding, OnClass,
  OnMissingBinding, OnProperty,
};
pub use config::ContainerConfig;
pub use container::{Container, RequestGuard, WeakContainer};
pub use decorator::Decorator;
pub use definition::{
  alias, env, env_or, factory, factory_fn, factory_method, list, map, object, string, value,
  ArrayDefinition, Definition, DefinitionEntry, DefinitionKind, EnvDefinition, FactoryDefinition,
  FactoryRef, ObjectDefinition, Scope,
};
pub use error::{Error, Result};
pub use properties::{ConfigProperties, Properties};
pub use registry::{Callable, ClassMeta, ClassRegistry, ParamKind, Parameter, Signature};
pub use resolver::Params;
pub use scope::{RequestScope, UnitGuard, UnitId};
pub use source::{Environment, MapEnvironment, SystemEnvironment};
pub use value::{concrete, downcast, Args, AsAny, Instance, Service, Value};
