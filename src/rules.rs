use crate::{
    ast::{assign_predicate_id, assign_variable_id, release_predicate_ids, Node},
    bounds::get_variable_bound,
    error::{BeTreeError, EvalError},
    evaluation::{EvalOptions, Matcher, MemoTable, Report, Truth},
    events::{Event, EventBuilder, EventError},
    logging::{be_tree_log, LogContext},
    parser,
    predicates::validate_predicate,
    registry::{AttributeDefinition, Registry, VariableId},
    values::{ValueBound, ValueKind},
};
use itertools::Itertools;
use slab::Slab;

const RULES_LOG_CTX: LogContext = LogContext::new("component=rules");

/// Handle of a rule inserted in a [`RuleSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RuleKey(usize);

/// Bound narrower than the domain of its attribute.
struct VariableBound {
    variable_id: VariableId,
    kind: ValueKind,
    bound: ValueBound,
}

struct Rule<T> {
    id: T,
    predicate: Node,
    bounds: Vec<VariableBound>,
}

impl<T> Rule<T> {
    /// Whether no event with these values can match the rule.
    ///
    /// A value of another kind than its domain is left to the evaluation, which decides how the
    /// mismatch is reported.
    fn is_excluded_by(&self, event: &Event) -> bool {
        self.bounds.iter().any(|variable| match event.get(variable.variable_id) {
            Some(value) if value.kind() == variable.kind => !variable.bound.contains(value),
            Some(_) => false,
            None => variable.bound.is_empty(),
        })
    }
}

/// A flat collection of rules searched against events.
///
/// Each rule is validated against the attribute domains at insertion, then bound to the
/// set's registry. Searching first discards the rules whose bounds exclude the event and
/// evaluates the others, sharing the results of identical sub-expressions between rules.
pub struct RuleSet<T> {
    registry: Registry,
    rules: Slab<Rule<T>>,
    options: EvalOptions,
}

impl<T> RuleSet<T> {
    pub fn new(definitions: &[AttributeDefinition]) -> Result<Self, BeTreeError<'_>> {
        Self::with_options(definitions, EvalOptions::default())
    }

    pub fn with_options(
        definitions: &[AttributeDefinition],
        options: EvalOptions,
    ) -> Result<Self, BeTreeError<'_>> {
        let registry = Registry::with_definitions(definitions).map_err(BeTreeError::Event)?;
        Ok(Self {
            registry,
            rules: Slab::new(),
            options,
        })
    }

    pub fn insert<'a>(&mut self, id: T, expression: &'a str) -> Result<RuleKey, BeTreeError<'a>> {
        let predicate = parser::parse(expression).map_err(BeTreeError::ParseError)?;
        self.insert_node(id, predicate).map_err(BeTreeError::Event)
    }

    pub fn insert_node(&mut self, id: T, mut predicate: Node) -> Result<RuleKey, EventError> {
        validate_predicate(&self.registry, &predicate)?;
        assign_variable_id(&mut self.registry, &mut predicate);
        assign_predicate_id(&mut self.registry, &mut predicate);

        let bounds = predicate
            .variable_ids()
            .into_iter()
            .filter_map(|variable_id| {
                let domain = self.registry.domain(variable_id)?;
                let bound = get_variable_bound(domain, &predicate);
                (bound != *domain.bound()).then_some(VariableBound {
                    variable_id,
                    kind: domain.kind(),
                    bound,
                })
            })
            .collect_vec();

        be_tree_log!(
            log::Level::Debug,
            ctx: RULES_LOG_CTX,
            "rule_inserted",
            "key={} predicate=\"{}\" bounded_variables={}",
            self.rules.vacant_key(),
            predicate,
            bounds.len(),
        );
        let key = self.rules.insert(Rule {
            id,
            predicate,
            bounds,
        });
        Ok(RuleKey(key))
    }

    /// Removes a rule, returning its id; unknown keys are ignored.
    pub fn remove(&mut self, key: RuleKey) -> Option<T> {
        let mut rule = self.rules.try_remove(key.0)?;
        release_predicate_ids(&mut self.registry, &mut rule.predicate);
        be_tree_log!(
            log::Level::Debug,
            ctx: RULES_LOG_CTX,
            "rule_removed",
            "key={} predicate=\"{}\"",
            key.0,
            rule.predicate,
        );
        Some(rule.id)
    }

    pub fn make_event(&self) -> EventBuilder<'_> {
        EventBuilder::new(&self.registry)
    }

    /// Finds the rules that are true for the event.
    ///
    /// A rule whose evaluation fails is reported in [`Search::failures`] and does not prevent
    /// the other rules from being evaluated.
    pub fn search(&self, event: &Event, report: &mut Report) -> Search<'_, T> {
        let mut cache = MemoTable::with_capacity(self.registry.predicate_capacity());
        let mut matcher = Matcher::new(&self.options, &mut cache, report);
        let mut search = Search {
            matches: vec![],
            failures: vec![],
        };

        for (key, rule) in &self.rules {
            if self.options.prune() && rule.is_excluded_by(event) {
                be_tree_log!(log::Level::Trace, ctx: RULES_LOG_CTX, "rule_pruned", "key={}", key);
                continue;
            }
            match matcher.evaluate(event, &rule.predicate) {
                Ok(Truth::True) => search.matches.push(&rule.id),
                Ok(Truth::False | Truth::Undefined) => {}
                Err(error) => {
                    be_tree_log!(
                        log::Level::Warn,
                        ctx: RULES_LOG_CTX,
                        "rule_failed",
                        "key={} error={}",
                        key,
                        error,
                    );
                    search.failures.push((&rule.id, error));
                }
            }
        }
        search
    }

    pub fn get(&self, key: RuleKey) -> Option<&T> {
        self.rules.get(key.0).map(|rule| &rule.id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Outcome of [`RuleSet::search`].
#[derive(Debug)]
pub struct Search<'a, T> {
    matches: Vec<&'a T>,
    failures: Vec<(&'a T, EvalError)>,
}

impl<'a, T> Search<'a, T> {
    /// Ids of the matching rules, in insertion order of their keys.
    pub fn matches(&self) -> &[&'a T] {
        &self.matches
    }

    /// Ids of the rules that could not be evaluated.
    pub fn failures(&self) -> &[(&'a T, EvalError)] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        evaluation::MismatchPolicy,
        test_utils::{definitions, event_from_json, init_logging},
        values::{Value, ValueKind},
    };

    const RULES: [(u64, &str); 5] = [
        (1, "age >= 21 and country in (1, 2, 3)"),
        (2, "age < 18 or private"),
        (3, r#"city = "Montreal" and not (bidfloor > 2.5)"#),
        (4, "segment_ids in (10, 20) and not private"),
        (5, "age >= 21 and country in (3, 2, 1) or age < 5"),
    ];

    fn build_rule_set(options: EvalOptions) -> RuleSet<u64> {
        init_logging();
        let definitions = definitions();
        let mut rules = RuleSet::with_options(&definitions, options).unwrap();
        for (id, expression) in RULES {
            rules.insert(id, expression).unwrap();
        }
        rules
    }

    fn search_ids(rules: &RuleSet<u64>, json: &str) -> (Vec<u64>, Report) {
        let event = event_from_json(rules.registry(), json);
        let mut report = Report::new();
        let ids = rules
            .search(&event, &mut report)
            .matches()
            .iter()
            .map(|id| **id)
            .sorted()
            .collect();
        (ids, report)
    }

    #[test]
    fn can_build_a_rule_set() {
        let rules = build_rule_set(EvalOptions::default());

        assert_eq!(5, rules.len());
        assert_eq!(6, rules.registry().len());
    }

    #[test]
    fn return_an_error_on_duplicate_definitions() {
        let definitions = [
            AttributeDefinition::integer("age"),
            AttributeDefinition::boolean("age"),
        ];

        let result = RuleSet::<u64>::new(&definitions);

        assert!(matches!(
            result,
            Err(BeTreeError::Event(EventError::AlreadyPresent(_)))
        ));
    }

    #[test]
    fn return_an_error_on_an_invalid_expression() {
        let mut rules = build_rule_set(EvalOptions::default());

        let result = rules.insert(6, "age >= and");

        assert!(matches!(result, Err(BeTreeError::ParseError(_))));
        assert_eq!(5, rules.len());
    }

    #[test]
    fn return_an_error_on_an_undeclared_attribute() {
        let mut rules = build_rule_set(EvalOptions::default());

        let result = rules.insert(6, "age >= 21 and unknown = 1");

        assert!(matches!(
            result,
            Err(BeTreeError::Event(EventError::NonExisting(name))) if name == "unknown"
        ));
        assert_eq!(6, rules.registry().len());
    }

    #[test]
    fn find_the_matching_rules() {
        let rules = build_rule_set(EvalOptions::default());

        let (ids, _) = search_ids(
            &rules,
            r#"{"age": 25, "country": 2, "private": false, "segment_ids": [5, 20], "city": "Montreal", "bidfloor": 1.5}"#,
        );

        assert_eq!(vec![1, 3, 4, 5], ids);
    }

    #[test]
    fn absent_attributes_do_not_match() {
        let rules = build_rule_set(EvalOptions::default());

        let (ids, _) = search_ids(&rules, r#"{"country": 2, "city": "Montreal"}"#);

        assert!(ids.is_empty());
    }

    #[test]
    fn negations_of_absent_attributes_do_not_match() {
        let rules = build_rule_set(EvalOptions::default());

        let (ids, _) = search_ids(&rules, r#"{"city": "Montreal", "segment_ids": [10]}"#);

        assert!(ids.is_empty());
    }

    #[test]
    fn pruning_skips_rules_outside_of_their_bounds() {
        let pruned = build_rule_set(EvalOptions::default());
        let exhaustive = build_rule_set(EvalOptions::default().with_pruning(false));
        let event = r#"{"age": 40, "country": 9, "private": true, "city": "Quebec"}"#;

        let (pruned_ids, pruned_report) = search_ids(&pruned, event);
        let (exhaustive_ids, exhaustive_report) = search_ids(&exhaustive, event);

        assert_eq!(vec![2], pruned_ids);
        assert_eq!(exhaustive_ids, pruned_ids);
        assert!(pruned_report.evaluated < exhaustive_report.evaluated);
    }

    #[test]
    fn identical_sub_expressions_are_evaluated_once_per_search() {
        let rules = build_rule_set(EvalOptions::default().with_pruning(false));

        let (ids, report) = search_ids(&rules, r#"{"age": 30, "country": 1}"#);

        assert_eq!(vec![1, 5], ids);
        assert!(report.memoized >= 1);
    }

    #[test]
    fn each_search_starts_with_an_empty_cache() {
        let rules = build_rule_set(EvalOptions::default().with_pruning(false));

        let (adult, _) = search_ids(&rules, r#"{"age": 30, "country": 1}"#);
        let (minor, _) = search_ids(&rules, r#"{"age": 3, "country": 1}"#);

        assert_eq!(vec![1, 5], adult);
        assert_eq!(vec![2, 5], minor);
    }

    #[test]
    fn removed_rules_are_not_matched() {
        let mut rules = build_rule_set(EvalOptions::default());
        let key = rules.insert(6, "country = 2").unwrap();

        assert_eq!(Some(&6), rules.get(key));
        assert_eq!(Some(6), rules.remove(key));
        assert_eq!(None, rules.remove(key));

        let (ids, _) = search_ids(&rules, r#"{"country": 2}"#);
        assert!(!ids.contains(&6));
    }

    #[test]
    fn a_failing_rule_does_not_prevent_the_others_from_matching() {
        let options = EvalOptions::default().with_mismatch(MismatchPolicy::Fail);
        let rules = build_rule_set(options);
        let age = rules.registry().by_name("age").unwrap();
        let private = rules.registry().by_name("private").unwrap();
        let event: Event = [
            (age, Value::String("old".to_string())),
            (private, Value::Boolean(true)),
        ]
        .into_iter()
        .collect();
        let mut report = Report::new();

        let search = rules.search(&event, &mut report);

        assert!(search.matches().is_empty());
        let failed = search.failures().iter().map(|(id, _)| **id).sorted().collect_vec();
        assert_eq!(vec![1, 2, 5], failed);
        assert!(search.failures().iter().all(|(_, error)| matches!(
            error,
            EvalError::TypeMismatch {
                expected: ValueKind::Integer,
                actual: ValueKind::String,
                ..
            }
        )));
    }

    #[test]
    fn values_of_another_kind_are_not_pruned() {
        let options = EvalOptions::default().with_mismatch(MismatchPolicy::Fail);
        let mut rules = RuleSet::with_options(&definitions(), options).unwrap();
        rules.insert(1, "age >= 21").unwrap();
        let age = rules.registry().by_name("age").unwrap();
        let event: Event = [(age, Value::String("old".to_string()))]
            .into_iter()
            .collect();
        let mut report = Report::new();

        let search = rules.search(&event, &mut report);

        assert!(search.matches().is_empty());
        assert_eq!(1, search.failures().len());
        assert_eq!(1, report.evaluated);
    }

    #[test]
    fn values_of_another_kind_are_undefined_by_default() {
        let mut rules = RuleSet::new(&definitions()).unwrap();
        rules.insert(1, "age >= 21 or country = 2").unwrap();
        let age = rules.registry().by_name("age").unwrap();
        let country = rules.registry().by_name("country").unwrap();
        let event: Event = [
            (age, Value::String("old".to_string())),
            (country, Value::Integer(2)),
        ]
        .into_iter()
        .collect();
        let mut report = Report::new();

        let search = rules.search(&event, &mut report);

        assert_eq!(&[&1], search.matches());
        assert!(search.failures().is_empty());
    }

    #[test]
    fn removing_rules_frees_their_sub_expressions() {
        let mut rules = RuleSet::new(&definitions()).unwrap();

        for i in 0..1_000 {
            let key = rules
                .insert(i, &format!("age = {} and country = {i}", i % 120))
                .unwrap();
            rules.remove(key);
        }

        assert!(rules.is_empty());
        assert_eq!(0, rules.registry().predicate_count());
        assert!(rules.registry().predicate_capacity() <= 3);
    }

    #[test]
    fn removing_a_rule_keeps_the_sub_expressions_shared_with_others() {
        let mut rules = build_rule_set(EvalOptions::default().with_pruning(false));
        let key = rules.insert(6, "age >= 21 and country = 7").unwrap();
        let shared = rules.registry().predicate_count();

        rules.remove(key);

        // `age >= 21` is still used by rules 1 and 5.
        assert_eq!(shared - 2, rules.registry().predicate_count());
        let (ids, report) = search_ids(&rules, r#"{"age": 30, "country": 1}"#);
        assert_eq!(vec![1, 5], ids);
        assert!(report.memoized >= 1);
    }

    #[test]
    fn can_insert_a_prebuilt_predicate() {
        let mut rules = RuleSet::new(&definitions()).unwrap();
        let predicate = Node::and(
            Node::binary(
                crate::predicates::ComparisonOperator::GreaterThanEqual,
                "age",
                Value::Integer(65),
            ),
            Node::boolean(crate::predicates::BoolOperator::IsFalse, "private"),
        );

        rules.insert_node("senior", predicate).unwrap();

        let mut builder = rules.make_event();
        builder.with_integer("age", 70).unwrap();
        builder.with_boolean("private", false).unwrap();
        let event = builder.build().unwrap();
        let mut report = Report::new();
        assert_eq!(&[&"senior"], rules.search(&event, &mut report).matches());
    }
}
