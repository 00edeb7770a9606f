use be_tree::{AttributeDefinition, Report, RuleSet};
use std::collections::HashMap;

fn main() {
    env_logger::init();

    let attributes = [
        AttributeDefinition::bounded_integer("age", 0, 120),
        AttributeDefinition::integer("exchange_id"),
        AttributeDefinition::integer_list("segment_ids").allow_undefined(),
        AttributeDefinition::boolean("private").allow_undefined(),
    ];
    let mut rules = RuleSet::new(&attributes).unwrap();

    let expressions = [
        (1u64, "age >= 21 and exchange_id = 5"),
        (2u64, "segment_ids in [1, 2, 3] or private"),
        (3u64, "not private and age < 18"),
    ];
    let mut mappings: HashMap<u64, &str> = HashMap::new();
    for (id, expression) in expressions {
        rules.insert(id, expression).unwrap();
        mappings.insert(id, expression);
    }

    let mut builder = rules.make_event();
    builder.with_integer("age", 34).unwrap();
    builder.with_integer("exchange_id", 5).unwrap();
    builder.with_integer_list("segment_ids", &[3, 4]).unwrap();
    let event = builder.build().unwrap();

    let mut report = Report::new();
    let search = rules.search(&event, &mut report);
    for id in search.matches() {
        println!(r#"Found ID: {id}, Expression: "{}""#, mappings[*id]);
    }
    println!(
        "evaluated={} matched={} memoized={} shorted={}",
        report.evaluated, report.matched, report.memoized, report.shorted
    );
}
