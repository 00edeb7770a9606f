//! Boolean predicate evaluation core for [BE-Tree](https://dl.acm.org/doi/10.1145/2213836.2213863)
//! style event matching.
//!
//! Predicates are parsed into an AST, bound to a [`Registry`] that turns attribute names into
//! dense ids, then evaluated against [`Event`]s under three-valued logic: an attribute missing
//! from an event is neither true nor false but [`Truth::Undefined`].
//!
//! # Examples
//!
//! Searching for the rules matching an event:
//!
//! ```
//! use be_tree::{AttributeDefinition, Report, RuleSet};
//!
//! let mut rules = RuleSet::new(&[
//!     AttributeDefinition::bounded_integer("age", 0, 120),
//!     AttributeDefinition::integer("country"),
//!     AttributeDefinition::boolean("private").allow_undefined(),
//!     AttributeDefinition::integer_list("segment_ids"),
//! ])
//! .unwrap();
//!
//! rules.insert(1, "age >= 21 and country in (1, 2, 3)").unwrap();
//! rules.insert(2, "segment_ids in [10, 20] and not private").unwrap();
//!
//! let mut builder = rules.make_event();
//! builder.with_integer("age", 25).unwrap();
//! builder.with_integer("country", 2).unwrap();
//! builder.with_integer_list("segment_ids", &[5]).unwrap();
//! let event = builder.build().unwrap();
//!
//! let mut report = Report::new();
//! let search = rules.search(&event, &mut report);
//! assert_eq!(&[&1], search.matches());
//! ```
//!
//! Evaluating a single predicate:
//!
//! ```
//! use be_tree::{assign_variable_id, match_node, parse, Event, Registry, Report, Truth, Value};
//!
//! let mut registry = Registry::new();
//! let mut predicate = parse("age >= 21 and not (country = 3)").unwrap();
//! assign_variable_id(&mut registry, &mut predicate);
//!
//! let age = registry.by_name("age").unwrap();
//! let event: Event = [(age, Value::Integer(30))].into_iter().collect();
//! let mut report = Report::new();
//!
//! // `country` is absent: `not (country = 3)` is undefined and so is the conjunction.
//! assert_eq!(Ok(Truth::Undefined), match_node(&event, &predicate, &mut report));
//! assert_eq!(2, report.evaluated);
//! ```
//!
//! # Domain Specific Language (DSL)
//!
//! The following operators are supported:
//!
//! * Boolean operators: `and` (`&&`), `or` (`||`), `not` (`!`) and `variable` where `variable` is a boolean attribute;
//! * Comparison: `<`, `<=`, `>`, `>=`. They work for `integer`, `float` and `string`;
//! * Equality: `=` (`==`) and `<>` (`!=`). They work for every scalar kind;
//! * Set: `in` and `not in` over a list of integers. They work for `integer` and `integer list` attributes.
//!
//! The attribute may appear on either side of a comparison. `and` binds tighter than `or`.
//!
//! ```text
//! age >= 21 and country in (1, 2, 3)
//! (bidfloor < 1.5 or private) and not (city = "Montreal")
//! 18 <= age && segment_ids not in [4, 8, 15]
//! ```
mod ast;
mod bounds;
mod error;
mod evaluation;
mod events;
mod lexer;
mod logging;
mod parser;
mod predicates;
mod registry;
mod rules;
mod strings;
#[cfg(test)]
mod test_utils;
mod values;

pub use crate::{
    ast::{
        assign_predicate_id, assign_variable_id, ast_to_string, release_predicate_ids, BinaryExpr,
        BoolExpr, CombiExpr, ListExpr, Node, NotExpr, TreeNode, Variable,
    },
    bounds::get_variable_bound,
    error::{BeTreeError, EvalError, ParserError},
    evaluation::{
        match_node, EvalOptions, Matcher, MemoCache, MemoTable, MismatchPolicy, NoMemo, Report,
        Truth,
    },
    events::{Event, EventBuilder, EventError},
    lexer::Token,
    parser::{parse, BeTreeParseError},
    predicates::{validate_predicate, BoolOperator, CombiOperator, ComparisonOperator, SetOperator},
    registry::{AttributeDefinition, AttributeDomain, PredicateId, Registry, VariableId},
    rules::{RuleKey, RuleSet, Search},
    values::{Value, ValueBound, ValueKind},
};
