use crate::{
    ast::{assign_predicate_id, assign_variable_id, Node},
    events::{Event, EventBuilder},
    parser::parse,
    registry::{AttributeDefinition, Registry},
    values::{Value, ValueKind},
};
use rust_decimal::Decimal;
use serde_json::Value as Json;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn definitions() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::bounded_integer("age", 0, 120).allow_undefined(),
        AttributeDefinition::float("bidfloor").allow_undefined(),
        AttributeDefinition::integer("country").allow_undefined(),
        AttributeDefinition::integer_list("segment_ids").allow_undefined(),
        AttributeDefinition::boolean("private").allow_undefined(),
        AttributeDefinition::string("city").allow_undefined(),
    ]
}

pub fn define_registry() -> Registry {
    Registry::with_definitions(&definitions()).unwrap()
}

/// Parses and binds a predicate, registering unknown attribute names.
pub fn bind(registry: &mut Registry, expression: &str) -> Node {
    let mut node = parse(expression).unwrap();
    assign_variable_id(registry, &mut node);
    assign_predicate_id(registry, &mut node);
    node
}

/// Builds a validated event from a JSON object keyed by attribute name.
pub fn event_from_json(registry: &Registry, json: &str) -> Event {
    let object: serde_json::Map<String, Json> = serde_json::from_str(json).unwrap();
    let mut builder = EventBuilder::new(registry);
    for (name, json) in &object {
        let kind = registry.domain_by_name(name).unwrap().kind();
        builder.with_value(name, to_value(kind, json)).unwrap();
    }
    builder.build().unwrap()
}

fn to_value(kind: ValueKind, json: &Json) -> Value {
    match kind {
        ValueKind::Boolean => Value::Boolean(json.as_bool().unwrap()),
        ValueKind::Integer => Value::Integer(json.as_i64().unwrap()),
        ValueKind::Float => Value::Float(json.to_string().parse::<Decimal>().unwrap()),
        ValueKind::String => Value::String(json.as_str().unwrap().to_string()),
        ValueKind::IntegerList => Value::IntegerList(
            json.as_array()
                .unwrap()
                .iter()
                .map(|element| element.as_i64().unwrap())
                .collect(),
        ),
    }
}
