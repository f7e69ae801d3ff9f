use fibre_di::{
  env_or, resolve, string, value, Args, ClassMeta, ContainerBuilder, Error, Result, Service,
  Signature, Value,
};
use std::sync::Arc;

// --- Services ---
struct Greeter {
  greeting: String,
}

impl Service for Greeter {
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    match method {
      "greet" => Ok(Value::from(format!("{}, {}!", self.greeting, args.string(0)?))),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

fn main() -> Result<()> {
  // --- Registration ---
  // The class only declares what it needs. Nothing binds "Greeter" explicitly.
  let container = ContainerBuilder::new()
    .register_class(
      ClassMeta::new("Greeter", |args| {
        Ok(Arc::new(Greeter {
          greeting: args.string(0)?,
        }))
      })
      .constructor(Signature::new().scalar("greeting", "string")),
    )
    .add_definition("audience", env_or("GREETER_AUDIENCE", value("World")))
    .add_definition("greeting", string("Hello from {site}"))
    .add_definition("site", value("Fibre"))
    .build()?;

  // --- Resolution ---
  // "greeting" is matched to the constructor parameter of the same name.
  let greeter = resolve!(container, "Greeter");
  let audience = resolve!(container, "audience");

  let message = greeter
    .as_object()
    .ok_or_else(|| Error::definition("Greeter", "not an object"))?
    .invoke("greet", Args::new("greet", vec![audience]))?;

  println!("{}", message.as_str().unwrap_or_default());
  assert!(container.get("Greeter")?.same(&greeter));
  Ok(())
}
