use fibre_di::{
  alias, downcast, object, value, Args, ClassMeta, ContainerBuilder, ContainerConfig, Error,
  Instance, Result, Scope, Service, Signature, Value,
};
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

// `A` needs a `B` and `B` needs an `A`.
struct NodeA {
  b: Instance,
}

impl Service for NodeA {
  fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
    match method {
      "name" => Ok(Value::from("A")),
      "peer" => Ok(Value::Object(self.b.clone())),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

struct NodeB {
  a: Instance,
}

impl Service for NodeB {
  fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
    match method {
      "name" => Ok(Value::from("B")),
      "peer" => Ok(Value::Object(self.a.clone())),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

fn node_a() -> ClassMeta {
  ClassMeta::new("A", |args| Ok(Arc::new(NodeA { b: args.object(0)? })))
    .constructor(Signature::new().class("b", "B"))
}

fn node_b() -> ClassMeta {
  ClassMeta::new("B", |args| Ok(Arc::new(NodeB { a: args.object(0)? })))
    .constructor(Signature::new().class("a", "A"))
}

// A `B` that talks to its `A` while being constructed.
fn eager_node_b() -> ClassMeta {
  ClassMeta::new("B", |args| {
    let a = args.object(0)?;
    a.invoke("name", Args::default())?;
    Ok(Arc::new(NodeB { a }))
  })
  .constructor(Signature::new().class("a", "A"))
}

// `Parent` gets its `Child` by property; the child takes the parent in its constructor.
#[derive(Default)]
struct Parent {
  child: Mutex<Option<Instance>>,
}

impl Service for Parent {
  fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
    match method {
      "name" => Ok(Value::from("parent")),
      "peer" => Ok(self.child.lock().unwrap().clone().map_or(Value::Null, Value::Object)),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }

  fn set_property(&self, name: &str, value: Value) -> Result<()> {
    match name {
      "child" => {
        *self.child.lock().unwrap() = value.as_object().cloned();
        Ok(())
      }
      other => Err(Error::invocation(other, "unknown property")),
    }
  }
}

struct Child {
  parent: Instance,
}

impl Service for Child {
  fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
    match method {
      "peer" => Ok(Value::Object(self.parent.clone())),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

fn family(parent_scope: Scope) -> ContainerBuilder {
  ContainerBuilder::new()
    .register_class(ClassMeta::new("Parent", |_| Ok(Arc::new(Parent::default()))))
    .register_class(
      ClassMeta::new("Child", |args| Ok(Arc::new(Child { parent: args.object(0)? })))
        .constructor(Signature::new().class("parent", "Parent")),
    )
    .add_definition(
      "Parent",
      object("Parent").property("child", alias("Child")).scope(parent_scope),
    )
}

fn peer(instance: &Instance) -> Instance {
  let peer = instance.invoke("peer", Args::default()).unwrap();
  peer.as_object().cloned().expect("peer is an object")
}

// --- Cycle Tests ---

#[test]
fn test_singleton_cycle_without_lazy_edge_fails_fast() {
  // Arrange
  let container = ContainerBuilder::new()
    .register_class(node_a())
    .register_class(node_b())
    .build()
    .unwrap();

  // Act
  let err = container.get("A").unwrap_err();

  // Assert
  match err {
    Error::CircularDependency { chain } => assert_eq!(chain, "A -> B -> A"),
    other => panic!("expected a circular dependency, got {other}"),
  }
}

#[test]
fn test_prototype_cycle_without_lazy_edge_fails_fast() {
  // Arrange
  let container = ContainerBuilder::new()
    .register_class(node_a())
    .register_class(node_b())
    .add_definition("A", object("A").scope(Scope::Prototype))
    .add_definition("B", object("B").scope(Scope::Prototype))
    .build()
    .unwrap();

  // Act
  let result = container.get("B");

  // Assert
  assert!(matches!(result, Err(Error::CircularDependency { .. })));
}

#[test]
fn test_lazy_edge_breaks_the_cycle_and_preserves_identity() {
  // Arrange
  let container = ContainerBuilder::new()
    .register_class(node_a())
    .register_class(node_b())
    .add_definition("A", object("A").lazy())
    .build()
    .unwrap();

  // Act
  let a = container.get("A").unwrap();
  let a_instance = a.as_object().cloned().unwrap();
  let b = peer(&a_instance);
  let a_via_b = peer(&b);

  // Assert
  assert_eq!(
    a_via_b.invoke("name", Args::default()).unwrap(),
    Value::from("A")
  );
  assert!(Value::Object(a_via_b.clone()).same(&a));
  let original = downcast::<NodeA>(&a_instance).unwrap();
  let reached = downcast::<NodeA>(&a_via_b).unwrap();
  assert!(Arc::ptr_eq(&original, &reached));
  assert!(container.get("B").unwrap().same(&Value::Object(b)));
}

#[test]
fn test_resolving_the_other_side_first_also_succeeds() {
  // Arrange
  let container = ContainerBuilder::new()
    .register_class(node_a())
    .register_class(node_b())
    .add_definition("A", object("A").lazy())
    .build()
    .unwrap();

  // Act
  let b = container.get_as::<NodeB>("B").unwrap();
  let a = container.get_as::<NodeA>("A").unwrap();

  // Assert
  let b_via_a = downcast::<NodeB>(&a.b).unwrap();
  assert!(Arc::ptr_eq(&b, &b_via_a));
}

#[test]
fn test_lazy_proxy_used_by_its_own_initializer_is_a_cycle() {
  // Arrange
  let container = ContainerBuilder::new()
    .register_class(node_a())
    .register_class(eager_node_b())
    .add_definition("A", object("A").lazy())
    .build()
    .unwrap();
  let a = container.get("A").unwrap();

  // Act
  let result = a.as_object().unwrap().invoke("name", Args::default());

  // Assert
  assert!(matches!(result, Err(Error::CircularDependency { .. })));
  // The failed initialization is not cached; the proxy can be retried.
  assert!(container.get("A").unwrap().same(&a));
}

#[test]
fn test_alias_loop_is_a_cycle() {
  // Arrange
  let container = ContainerBuilder::new()
    .add_definition("left", alias("right"))
    .add_definition("right", alias("left"))
    .build()
    .unwrap();

  // Act
  let err = container.get("left").unwrap_err();

  // Assert
  match err {
    Error::CircularDependency { chain } => assert_eq!(chain, "left -> right -> left"),
    other => panic!("expected a circular dependency, got {other}"),
  }
}

#[test]
fn test_resolution_depth_is_bounded() {
  // Arrange
  let config = ContainerConfig {
    max_depth: 3,
    ..ContainerConfig::default()
  };
  let container = ContainerBuilder::new()
    .with_config(config)
    .add_definition("a1", alias("a2"))
    .add_definition("a2", alias("a3"))
    .add_definition("a3", alias("a4"))
    .add_definition("a4", value("deep"))
    .add_definition("b1", alias("b2"))
    .add_definition("b2", value("shallow"))
    .build()
    .unwrap();

  // Act
  let deep = container.get("a1");
  let shallow = container.get("b1");

  // Assert
  assert!(matches!(deep, Err(Error::DepthExceeded { depth: 3, .. })));
  assert_eq!(shallow.unwrap(), Value::from("shallow"));
}

#[test]
fn test_property_injection_cycle_resolves_to_the_same_singleton() {
  // Arrange
  let container = family(Scope::Singleton).build().unwrap();

  // Act
  let parent = container.get("Parent").unwrap();
  let child = peer(parent.as_object().unwrap());
  let parent_via_child = peer(&child);

  // Assert
  assert!(Value::Object(parent_via_child.clone()).same(&parent));
  assert_eq!(
    parent_via_child.invoke("name", Args::default()).unwrap(),
    Value::from("parent")
  );
  assert!(container.get("Child").unwrap().same(&Value::Object(child)));
  let original = container.get_as::<Parent>("Parent").unwrap();
  let reached = downcast::<Parent>(&parent_via_child).unwrap();
  assert!(Arc::ptr_eq(&original, &reached));
}

#[test]
fn test_property_injection_cycle_through_a_prototype_still_fails() {
  // Arrange
  let container = family(Scope::Prototype).build().unwrap();

  // Act
  let result = container.get("Parent");

  // Assert
  assert!(matches!(result, Err(Error::CircularDependency { .. })));
}
