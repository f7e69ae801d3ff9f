//! Public macros for ergonomic resolution.

/// Resolves an entry from a container, panicking if it cannot be resolved.
///
/// Meant for bootstrapping code and tests, where a missing dependency is a
/// programming error. Use `Container::get` or `Container::get_as` to handle
/// failures instead.
///
/// # Panics
///
/// Panics if the entry is not bound, fails to resolve, or (in the typed form)
/// is not an object of the requested type.
///
/// # Examples
///
/// ```
/// use fibre_di::{resolve, value, ClassMeta, ContainerBuilder, Service, Signature};
/// use std::sync::Arc;
///
/// struct Greeter {
///   greeting: String,
/// }
/// impl Service for Greeter {}
///
/// let container = ContainerBuilder::new()
///   .add_definition("greeting", value("hi"))
///   .register_class(
///     ClassMeta::new("Greeter", |args| {
///       Ok(Arc::new(Greeter { greeting: args.string(0)? }))
///     })
///     .constructor(Signature::new().scalar("greeting", "string")),
///   )
///   .build()
///   .unwrap();
///
/// // Untyped: the raw `Value`.
/// let greeting = resolve!(container, "greeting");
/// assert_eq!(greeting.as_str(), Some("hi"));
///
/// // Typed: the concrete service behind the entry.
/// let greeter = resolve!(container, "Greeter", Greeter);
/// assert_eq!(greeter.greeting, "hi");
/// ```
#[macro_export]
macro_rules! resolve {
  // resolve!(container, "name", MyService)
  ($container:expr, $name:expr, $type:ty) => {{
    let name = $name;
    $container.get_as::<$type>(name).unwrap_or_else(|e| {
      panic!(
        "Failed to resolve required service '{}' as {}: {}",
        name,
        std::any::type_name::<$type>(),
        e
      )
    })
  }};

  // resolve!(container, "name")
  ($container:expr, $name:expr) => {{
    let name = $name;
    $container
      .get(name)
      .unwrap_or_else(|e| panic!("Failed to resolve required entry '{}': {}", name, e))
  }};
}

/// Like [`resolve!`], but yields `None` instead of panicking.
#[macro_export]
macro_rules! maybe_resolve {
  ($container:expr, $name:expr, $type:ty) => {
    $container.get_as::<$type>($name).ok()
  };

  ($container:expr, $name:expr) => {
    $container.get($name).ok()
  };
}
