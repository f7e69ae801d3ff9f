use fibre_di::{
  AllConditions, AnyCondition, ClassMeta, Condition, ComponentDescriptor, ConfigProperties,
  Container, ContainerBuilder, Error, FnCondition, NoneCondition, OnBinding, OnClass,
  OnMissingBinding, OnProperty, Result, Service,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

struct Clock(&'static str);
impl Service for Clock {}

fn clock_class(name: &'static str) -> ClassMeta {
  ClassMeta::new(name, move |_| Ok(Arc::new(Clock(name)))).implements("Clock")
}

fn builder() -> ContainerBuilder {
  ContainerBuilder::new()
    .register_class(clock_class("SystemClock"))
    .register_class(clock_class("FakeClock"))
    .register_class(clock_class("UtcClock"))
}

fn clock_name(container: &Container, name: &str) -> &'static str {
  container.get_as::<Clock>(name).unwrap().0
}

// A condition with a fixed answer that counts how often it is asked.
fn counted(answer: bool, calls: &Arc<AtomicUsize>) -> FnCondition {
  let calls = calls.clone();
  FnCondition::new(format!("fixed {}", answer), move |_: &Container| -> Result<bool> {
    calls.fetch_add(1, Ordering::SeqCst);
    Ok(answer)
  })
}

fn evaluate(condition: &dyn Condition) -> bool {
  let container = ContainerBuilder::new().build().unwrap();
  condition.matches(&container).unwrap()
}

// --- Combinators ---

#[test]
fn test_all_conditions_is_and() {
  let cases = [
    (vec![], true),
    (vec![true], true),
    (vec![true, true], true),
    (vec![true, false], false),
    (vec![false, false], false),
  ];
  for (inputs, expected) in cases {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let conditions: Vec<Box<dyn Condition>> = inputs
      .iter()
      .map(|&answer| Box::new(counted(answer, &calls)) as Box<dyn Condition>)
      .collect();

    // Act & Assert
    assert_eq!(evaluate(&AllConditions::new(conditions)), expected, "{:?}", inputs);
  }
}

#[test]
fn test_none_condition_is_nor() {
  let cases = [
    (vec![], true),
    (vec![false], true),
    (vec![false, false], true),
    (vec![false, true], false),
    (vec![true, true], false),
  ];
  for (inputs, expected) in cases {
    // Arrange
    let calls = Arc::new(AtomicUsize::new(0));
    let conditions: Vec<Box<dyn Condition>> = inputs
      .iter()
      .map(|&answer| Box::new(counted(answer, &calls)) as Box<dyn Condition>)
      .collect();

    // Act & Assert
    assert_eq!(evaluate(&NoneCondition::new(conditions)), expected, "{:?}", inputs);
  }
}

#[test]
fn test_any_condition_is_or() {
  let calls = Arc::new(AtomicUsize::new(0));
  let any = AnyCondition::new(vec![
    Box::new(counted(false, &calls)),
    Box::new(counted(true, &calls)),
    Box::new(counted(true, &calls)),
  ]);

  assert!(evaluate(&any));
  // Stops at the first match.
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert!(!evaluate(&AnyCondition::new(vec![])));
}

// --- Registration ---

#[test]
fn test_each_condition_is_evaluated_at_most_once_per_build() {
  // Arrange
  let first = Arc::new(AtomicUsize::new(0));
  let second = Arc::new(AtomicUsize::new(0));
  let skipped = Arc::new(AtomicUsize::new(0));

  // Act
  let container = builder()
    .add_component(
      ComponentDescriptor::new("SystemClock")
        .when(counted(true, &first))
        .when(counted(true, &second)),
    )
    .add_component(
      ComponentDescriptor::new("FakeClock")
        .when(counted(false, &first))
        .when(counted(true, &skipped)),
    )
    .build()
    .unwrap();

  // Assert
  assert_eq!(first.load(Ordering::SeqCst), 2);
  assert_eq!(second.load(Ordering::SeqCst), 1);
  assert_eq!(skipped.load(Ordering::SeqCst), 0);
  assert_eq!(clock_name(&container, "Clock"), "SystemClock");
}

#[test]
fn test_rejected_component_contributes_no_binding() {
  // Arrange & Act
  let container = builder()
    .add_component(
      ComponentDescriptor::new("FakeClock").when(FnCondition::new("never", |_: &Container| Ok(false))),
    )
    .build()
    .unwrap();

  // Assert
  assert!(!container.has("Clock"));
}

#[test]
fn test_interfaces_fall_back_to_class_metadata() {
  // Arrange & Act
  let container = builder()
    .add_component(ComponentDescriptor::new("UtcClock"))
    .build()
    .unwrap();

  // Assert
  assert_eq!(clock_name(&container, "Clock"), "UtcClock");
  assert_eq!(clock_name(&container, "UtcClock"), "UtcClock");
}

#[test]
fn test_first_implicit_binding_wins() {
  // Arrange & Act
  let container = builder()
    .add_component(ComponentDescriptor::new("SystemClock").implements("Clock"))
    .add_component(ComponentDescriptor::new("FakeClock").implements("Clock"))
    .build()
    .unwrap();

  // Assert
  assert_eq!(clock_name(&container, "Clock"), "SystemClock");
  assert_eq!(clock_name(&container, "FakeClock"), "FakeClock");
}

#[test]
fn test_explicit_name_wins_over_interface_alias() {
  // Arrange & Act
  let container = builder()
    .add_component(ComponentDescriptor::new("SystemClock").implements("Clock"))
    .add_component(ComponentDescriptor::new("UtcClock").named("Clock"))
    .add_component(ComponentDescriptor::new("FakeClock").named("Clock"))
    .build()
    .unwrap();

  // Assert
  assert_eq!(clock_name(&container, "Clock"), "UtcClock");
}

#[test]
fn test_class_binding_wins_over_an_earlier_interface_alias() {
  // Arrange & Act
  let container = builder()
    .register_class(ClassMeta::new("Clock", |_| Ok(Arc::new(Clock("Clock")))))
    .add_component(ComponentDescriptor::new("SystemClock").implements("Clock"))
    .add_component(ComponentDescriptor::new("Clock"))
    .build()
    .unwrap();

  // Assert
  assert_eq!(clock_name(&container, "Clock"), "Clock");
  assert_eq!(clock_name(&container, "SystemClock"), "SystemClock");
}

#[test]
fn test_conditions_see_earlier_registrations() {
  // Arrange & Act
  let container = builder()
    .add_component(ComponentDescriptor::new("SystemClock"))
    .add_component(ComponentDescriptor::new("FakeClock").when(OnMissingBinding::new("Clock")))
    .add_component(
      ComponentDescriptor::new("UtcClock")
        .named("utc")
        .when(OnBinding::new("Clock")),
    )
    .build()
    .unwrap();

  // Assert
  assert_eq!(clock_name(&container, "Clock"), "SystemClock");
  assert_eq!(clock_name(&container, "utc"), "UtcClock");
}

#[test]
fn test_on_class_checks_the_registry() {
  let container = builder().build().unwrap();

  assert!(OnClass::new("FakeClock").matches(&container).unwrap());
  assert!(!OnClass::new("AtomicClock").matches(&container).unwrap());
}

#[test]
fn test_property_conditions() {
  // Arrange
  let properties = Arc::new(
    ConfigProperties::from_yaml_str("clock:\n  kind: utc\n  fake: false\n").unwrap(),
  );
  let container = builder().with_properties(properties).build().unwrap();

  // Act & Assert
  assert!(OnProperty::new("clock.kind").matches(&container).unwrap());
  assert!(OnProperty::new("clock.kind").having("utc").matches(&container).unwrap());
  assert!(!OnProperty::new("clock.kind").having("local").matches(&container).unwrap());
  assert!(!OnProperty::new("clock.fake").matches(&container).unwrap());
  assert!(!OnProperty::new("clock.zone").matches(&container).unwrap());
  assert!(OnProperty::new("clock.zone").match_if_missing().matches(&container).unwrap());
}

#[test]
fn test_property_condition_without_properties_fails_the_build() {
  // Arrange
  let builder = builder().add_component(
    ComponentDescriptor::new("UtcClock").when(OnProperty::new("clock.kind").having("utc")),
  );

  // Act
  let result = builder.build();

  // Assert
  assert!(matches!(result, Err(Error::ConditionEvaluation { .. })));
}

#[test]
fn test_unregistered_component_class_fails_the_build() {
  let result = builder()
    .add_component(ComponentDescriptor::new("AtomicClock"))
    .build();

  assert!(matches!(result, Err(Error::Definition { .. })));
}
