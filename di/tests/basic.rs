use fibre_di::{
  alias, list, maybe_resolve, object, resolve, string, value, Args, ClassMeta, ComponentDescriptor,
  Container, ContainerBuilder, Error, MapEnvironment, Params, Result, Service, Signature, Value,
};
use std::sync::Arc;

// --- Test Fixtures ---

struct Greeter {
  greeting: String,
}

impl Service for Greeter {
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    match method {
      "greet" => Ok(Value::from(format!("{}, {}", self.greeting, args.string(0)?))),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

fn greeter_class() -> ClassMeta {
  ClassMeta::new("Greeter", |args| {
    Ok(Arc::new(Greeter {
      greeting: args.string(0)?,
    }))
  })
  .constructor(Signature::new().scalar("greeting", "string"))
}

fn container() -> Container {
  ContainerBuilder::new()
    .with_environment(Arc::new(MapEnvironment::new()))
    .register_class(greeter_class())
    .add_definition("greeting", value("hi"))
    .add_definition("answer", value(42))
    .add_definition("colours", list(vec![value("red"), value("green")]))
    .add_definition("banner", string("{greeting} there"))
    .add_definition("hello", alias("greeting"))
    .add_definition("broken", alias("nowhere"))
    .add_component(ComponentDescriptor::new("Greeter"))
    .build()
    .unwrap()
}

// --- Basic Tests ---

#[test]
fn test_greeter_scalar_parameter_is_wired_by_name() {
  // Arrange
  let container = container();

  // Act
  let greeter = container.get_as::<Greeter>("Greeter").unwrap();

  // Assert
  assert_eq!(greeter.greeting, "hi");
}

#[test]
fn test_has_agrees_with_get() {
  // Arrange
  let container = container();
  let names = [
    "greeting", "answer", "colours", "banner", "hello", "broken", "Greeter", "missing", "db.host",
  ];

  for name in names {
    // Act
    let not_found = matches!(container.get(name), Err(Error::NotFound { .. }));

    // Assert
    assert_eq!(container.has(name), !not_found, "has/get disagree for '{}'", name);
  }
}

#[test]
fn test_single_source_entries_resolve_to_their_kind() {
  // Arrange
  let container = container();

  // Act & Assert
  assert_eq!(container.get("answer").unwrap(), Value::Int(42));
  assert_eq!(
    container.get("colours").unwrap(),
    Value::List(vec![Value::from("red"), Value::from("green")])
  );
  assert_eq!(container.get("banner").unwrap(), Value::from("hi there"));
  assert_eq!(container.get("hello").unwrap(), Value::from("hi"));
  assert!(container.get("Greeter").unwrap().as_object().is_some());
}

#[test]
fn test_missing_entry_is_not_found() {
  // Arrange
  let container = container();

  // Act
  let err = container.get("missing").unwrap_err();

  // Assert
  assert!(err.is_not_found());
  assert!(err.to_string().contains("missing"));
}

#[test]
fn test_broken_alias_is_a_definition_error() {
  // Arrange
  let container = container();

  // Act
  let err = container.get("broken").unwrap_err();

  // Assert
  match err {
    Error::Definition { entry, message } => {
      assert_eq!(entry, "broken");
      assert!(message.contains("nowhere"));
    }
    other => panic!("expected a definition error, got {other}"),
  }
}

#[test]
fn test_set_replaces_binding_and_cached_singleton() {
  // Arrange
  let container = container();
  let before = container.get_as::<Greeter>("Greeter").unwrap();

  // Act
  container.set("greeting", value("hello")).unwrap();
  container
    .set("Greeter", object("Greeter").arg(value("yo")))
    .unwrap();

  // Assert
  assert_eq!(before.greeting, "hi");
  assert_eq!(container.get("greeting").unwrap(), Value::from("hello"));
  assert_eq!(container.get_as::<Greeter>("Greeter").unwrap().greeting, "yo");
}

#[test]
fn test_set_on_read_only_container_fails() {
  // Arrange
  let container = ContainerBuilder::new()
    .read_only()
    .add_definition("greeting", value("hi"))
    .build()
    .unwrap();

  // Act
  let result = container.set("greeting", value("hello"));

  // Assert
  assert!(!container.is_mutable());
  assert!(matches!(result, Err(Error::Definition { .. })));
  assert_eq!(container.get("greeting").unwrap(), Value::from("hi"));
}

#[test]
fn test_make_overrides_parameters_and_bypasses_the_cache() {
  // Arrange
  let container = container();
  let shared = container.get("Greeter").unwrap();
  let mut params = Params::new();
  params.insert("greeting".into(), Value::from("hey"));

  // Act
  let first = container.make("Greeter", params.clone()).unwrap();
  let second = container.make("Greeter", params).unwrap();

  // Assert
  assert!(!first.same(&second));
  assert_eq!(first.downcast::<Greeter>().unwrap().greeting, "hey");
  assert!(container.get("Greeter").unwrap().same(&shared));
  assert_eq!(shared.downcast::<Greeter>().unwrap().greeting, "hi");
}

#[test]
fn test_make_rejects_unknown_parameters() {
  // Arrange
  let container = container();
  let mut params = Params::new();
  params.insert("volume".into(), Value::Int(11));

  // Act
  let result = container.make("Greeter", params);

  // Assert
  assert!(matches!(result, Err(Error::Definition { .. })));
}

#[test]
fn test_services_are_invoked_through_the_capability_surface() {
  // Arrange
  let container = container();
  let greeter = container.get("Greeter").unwrap();

  // Act
  let greeting = greeter
    .as_object()
    .unwrap()
    .invoke("greet", Args::new("greet", vec![Value::from("world")]))
    .unwrap();

  // Assert
  assert_eq!(greeting, Value::from("hi, world"));
}

#[test]
fn test_resolve_macros() {
  // Arrange
  let container = container();

  // Act
  let greeter = resolve!(container, "Greeter", Greeter);
  let answer = resolve!(container, "answer");
  let missing = maybe_resolve!(container, "missing", Greeter);
  let wrong_type = maybe_resolve!(container, "answer", Greeter);

  // Assert
  assert_eq!(greeter.greeting, "hi");
  assert_eq!(answer, Value::Int(42));
  assert!(missing.is_none());
  assert!(wrong_type.is_none());
}

#[test]
#[should_panic(expected = "Failed to resolve required entry 'missing'")]
fn test_resolve_macro_panics_on_missing_entry() {
  let container = container();
  let _ = resolve!(container, "missing");
}
