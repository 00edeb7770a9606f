use crate::{
    predicates::ComparisonOperator,
    registry::{AttributeDomain, Registry, VariableId},
    values::{Value, ValueBound, ValueKind},
};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, PartialEq, Debug)]
pub enum EventError {
    #[error("attribute {0} has already been defined")]
    AlreadyPresent(String),
    #[error("attribute {0} does not exist")]
    NonExisting(String),
    #[error("attribute name {0:?} is not an identifier")]
    InvalidName(String),
    #[error("event is missing attribute {0}")]
    MissingAttribute(String),
    #[error("{name:?}: mismatching types => expected: {expected:?}, found: {actual:?}")]
    MismatchingTypes {
        name: String,
        expected: ValueKind,
        actual: ValueKind,
    },
    #[error("{name:?}: operator {operator} is not supported for {kind} attributes")]
    InvalidOperator {
        name: String,
        operator: ComparisonOperator,
        kind: ValueKind,
    },
    #[error("{name:?}: value {value} is outside of its domain {bound:?}")]
    OutOfBounds {
        name: String,
        value: Value,
        bound: ValueBound,
    },
}

pub struct EventBuilder<'a> {
    by_ids: Vec<Option<Value>>,
    registry: &'a Registry,
}

impl<'a> EventBuilder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            by_ids: vec![None; registry.len()],
        }
    }

    /// Validates that every attribute that cannot be undefined received a value.
    pub fn build(self) -> Result<Event, EventError> {
        if let Some(domain) = self
            .registry
            .domains()
            .find(|domain| !domain.allow_undefined() && self.by_ids[domain.variable_id().index()].is_none())
        {
            return Err(EventError::MissingAttribute(domain.name().to_string()));
        }
        Ok(Event(self.by_ids))
    }

    pub fn with_boolean(&mut self, name: &str, value: bool) -> Result<(), EventError> {
        self.add_value(name, Value::Boolean(value))
    }

    pub fn with_integer(&mut self, name: &str, value: i64) -> Result<(), EventError> {
        self.add_value(name, Value::Integer(value))
    }

    pub fn with_float(&mut self, name: &str, value: Decimal) -> Result<(), EventError> {
        self.add_value(name, Value::Float(value))
    }

    pub fn with_string(&mut self, name: &str, value: &str) -> Result<(), EventError> {
        self.add_value(name, Value::String(value.to_string()))
    }

    pub fn with_integer_list(&mut self, name: &str, values: &[i64]) -> Result<(), EventError> {
        self.add_value(name, Value::IntegerList(values.to_vec()))
    }

    pub fn with_value(&mut self, name: &str, value: Value) -> Result<(), EventError> {
        self.add_value(name, value)
    }

    fn add_value(&mut self, name: &str, value: Value) -> Result<(), EventError> {
        let domain = self
            .registry
            .domain_by_name(name)
            .ok_or_else(|| EventError::NonExisting(name.to_string()))?;
        validate_value(domain, &value)?;

        let slot = &mut self.by_ids[domain.variable_id().index()];
        if slot.is_some() {
            return Err(EventError::AlreadyPresent(name.to_string()));
        }
        *slot = Some(value);
        Ok(())
    }
}

fn validate_value(domain: &AttributeDomain, value: &Value) -> Result<(), EventError> {
    if domain.kind() != value.kind() {
        return Err(EventError::MismatchingTypes {
            name: domain.name().to_string(),
            expected: domain.kind(),
            actual: value.kind(),
        });
    }
    if !domain.bound().contains(value) {
        return Err(EventError::OutOfBounds {
            name: domain.name().to_string(),
            value: value.clone(),
            bound: domain.bound().clone(),
        });
    }
    Ok(())
}

/// Attribute values indexed by variable id; `None` marks an absent attribute.
#[derive(Clone, Default, Debug)]
pub struct Event(Vec<Option<Value>>);

impl Event {
    #[inline]
    pub fn get(&self, id: VariableId) -> Option<&Value> {
        self.0.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of attribute slots, present or not.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds an event without validating it against a registry.
impl FromIterator<(VariableId, Value)> for Event {
    fn from_iter<I: IntoIterator<Item = (VariableId, Value)>>(iter: I) -> Self {
        let mut by_ids = vec![];
        for (id, value) in iter {
            if by_ids.len() <= id.index() {
                by_ids.resize(id.index() + 1, None);
            }
            by_ids[id.index()] = Some(value);
        }
        Self(by_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AttributeDefinition;

    fn define_registry() -> Registry {
        Registry::with_definitions(&[
            AttributeDefinition::boolean("private"),
            AttributeDefinition::integer_list("segment_ids"),
            AttributeDefinition::bounded_integer("age", 0, 120),
            AttributeDefinition::float("bidfloor"),
            AttributeDefinition::string("country").allow_undefined(),
        ])
        .unwrap()
    }

    #[test]
    fn can_add_a_boolean_attribute_value() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);

        assert!(builder.with_boolean("private", true).is_ok());
    }

    #[test]
    fn can_add_a_float_attribute_value() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);

        assert!(builder.with_float("bidfloor", Decimal::new(1, 0)).is_ok());
    }

    #[test]
    fn return_an_error_when_adding_a_non_existing_attribute() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);

        let result = builder.with_boolean("non_existing", true);

        assert!(matches!(result, Err(EventError::NonExisting(_))));
    }

    #[test]
    fn return_an_error_when_adding_a_value_of_the_wrong_kind() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);

        let result = builder.with_string("age", "twenty");

        assert_eq!(
            Err(EventError::MismatchingTypes {
                name: "age".to_string(),
                expected: ValueKind::Integer,
                actual: ValueKind::String
            }),
            result
        );
    }

    #[test]
    fn return_an_error_when_a_value_is_outside_of_its_domain() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);

        let result = builder.with_integer("age", 121);

        assert!(matches!(result, Err(EventError::OutOfBounds { .. })));
    }

    #[test]
    fn return_an_error_when_setting_an_attribute_twice() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);
        builder.with_integer("age", 20).unwrap();

        let result = builder.with_integer("age", 21);

        assert_eq!(Err(EventError::AlreadyPresent("age".to_string())), result);
    }

    #[test]
    fn return_an_error_when_creating_an_event_with_missing_attribute() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);
        builder.with_boolean("private", false).unwrap();

        assert!(matches!(
            builder.build(),
            Err(EventError::MissingAttribute(_))
        ));
    }

    #[test]
    fn attributes_allowing_undefined_can_be_left_out() {
        let registry = define_registry();
        let mut builder = EventBuilder::new(&registry);
        builder.with_boolean("private", false).unwrap();
        builder.with_integer_list("segment_ids", &[]).unwrap();
        builder.with_integer("age", 0).unwrap();
        builder.with_float("bidfloor", Decimal::ZERO).unwrap();

        let event = builder.build().unwrap();

        let country = registry.by_name("country").unwrap();
        let age = registry.by_name("age").unwrap();
        assert_eq!(None, event.get(country));
        assert_eq!(Some(&Value::Integer(0)), event.get(age));
    }

    #[test]
    fn can_create_an_event_with_no_attributes() {
        let registry = Registry::new();

        let builder = EventBuilder::new(&registry);

        assert!(builder.build().is_ok());
    }

    #[test]
    fn collect_an_event_from_raw_values() {
        let mut registry = Registry::new();
        let age = registry.lookup_or_register("age");
        let country = registry.lookup_or_register("country");
        let private = registry.lookup_or_register("private");

        let event: Event = [(private, Value::Boolean(false)), (age, Value::Integer(3))]
            .into_iter()
            .collect();

        assert_eq!(Some(&Value::Boolean(false)), event.get(private));
        assert_eq!(Some(&Value::Integer(3)), event.get(age));
        assert_eq!(None, event.get(country));
        assert_eq!(3, event.len());
    }
}
