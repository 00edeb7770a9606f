use crate::{
    ast::Node,
    error::EvalError,
    events::Event,
    logging::{be_tree_log, LogContext},
    predicates::CombiOperator,
    registry::PredicateId,
};
use std::ops::Not;

const EVALUATION_LOG_CTX: LogContext = LogContext::new("component=evaluation");

/// Result of a predicate under three-valued logic; `Undefined` stands for missing data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Truth {
    True,
    False,
    Undefined,
}

impl Truth {
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Undefined,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Undefined,
        }
    }

    #[inline]
    pub fn is_true(self) -> bool {
        self == Self::True
    }
}

impl Not for Truth {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Undefined => Self::Undefined,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Per-query counters, owned by the caller.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Report {
    /// Leaves evaluated against the event.
    pub evaluated: u64,
    /// Evaluated leaves that were true.
    pub matched: u64,
    /// Sub-expressions answered by the memoization cache.
    pub memoized: u64,
    /// Right operands skipped by short-circuiting.
    pub shorted: u64,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Results of sub-expressions already evaluated against the current event.
///
/// A cache is only valid for a single event and must be dropped or cleared before the next.
pub trait MemoCache {
    fn get(&self, id: PredicateId) -> Option<Truth>;

    fn insert(&mut self, id: PredicateId, result: Truth);
}

/// A cache that never remembers anything.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoMemo;

impl MemoCache for NoMemo {
    #[inline]
    fn get(&self, _: PredicateId) -> Option<Truth> {
        None
    }

    #[inline]
    fn insert(&mut self, _: PredicateId, _: Truth) {}
}

/// Dense cache indexed by predicate id.
#[derive(Clone, Default, Debug)]
pub struct MemoTable {
    results: Vec<Option<Truth>>,
}

impl MemoTable {
    pub fn with_capacity(predicates: usize) -> Self {
        Self {
            results: vec![None; predicates],
        }
    }

    pub fn clear(&mut self) {
        self.results.fill(None);
    }
}

impl MemoCache for MemoTable {
    #[inline]
    fn get(&self, id: PredicateId) -> Option<Truth> {
        self.results.get(id.index()).copied().flatten()
    }

    fn insert(&mut self, id: PredicateId, result: Truth) {
        if self.results.len() <= id.index() {
            self.results.resize(id.index() + 1, None);
        }
        self.results[id.index()] = Some(result);
    }
}

/// What to do when a predicate compares an attribute with a value it cannot be compared to.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum MismatchPolicy {
    /// The predicate is `Undefined` for this event.
    #[default]
    Undefined,
    /// The evaluation of the whole rule fails.
    Fail,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EvalOptions {
    mismatch: MismatchPolicy,
    memoize: bool,
    prune: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            mismatch: MismatchPolicy::default(),
            memoize: true,
            prune: true,
        }
    }
}

impl EvalOptions {
    pub fn with_mismatch(mut self, mismatch: MismatchPolicy) -> Self {
        self.mismatch = mismatch;
        self
    }

    pub fn with_memoization(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Skip rules whose bounds exclude the event before evaluating them.
    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    #[inline]
    pub fn mismatch(&self) -> MismatchPolicy {
        self.mismatch
    }

    #[inline]
    pub fn memoize(&self) -> bool {
        self.memoize
    }

    #[inline]
    pub fn prune(&self) -> bool {
        self.prune
    }
}

/// Evaluates bound predicates against an event, accumulating counters in a [`Report`].
pub struct Matcher<'a, C: MemoCache + ?Sized> {
    options: &'a EvalOptions,
    cache: &'a mut C,
    report: &'a mut Report,
}

impl<'a, C: MemoCache + ?Sized> Matcher<'a, C> {
    pub fn new(options: &'a EvalOptions, cache: &'a mut C, report: &'a mut Report) -> Self {
        Self {
            options,
            cache,
            report,
        }
    }

    /// # Panics
    ///
    /// When a variable of the predicate was never bound.
    pub fn evaluate(&mut self, event: &Event, node: &Node) -> Result<Truth, EvalError> {
        let id = node.predicate_id().filter(|_| self.options.memoize);
        if let Some(result) = id.and_then(|id| self.cache.get(id)) {
            self.report.memoized += 1;
            be_tree_log!(
                log::Level::Trace,
                ctx: EVALUATION_LOG_CTX,
                "memo_hit",
                "predicate={} result={:?}",
                node,
                result,
            );
            return Ok(result);
        }

        let result = match node {
            Node::Combi(expression) => {
                let lhs = self.evaluate(event, expression.lhs())?;
                match (expression.operator(), lhs) {
                    (CombiOperator::And, Truth::False) | (CombiOperator::Or, Truth::True) => {
                        self.report.shorted += 1;
                        lhs
                    }
                    (CombiOperator::And, lhs) => lhs.and(self.evaluate(event, expression.rhs())?),
                    (CombiOperator::Or, lhs) => lhs.or(self.evaluate(event, expression.rhs())?),
                }
            }
            Node::Not(expression) => !self.evaluate(event, expression.inner())?,
            Node::Binary(expression) => {
                let variable = expression.variable();
                let outcome = event.get(variable.id()).map(|value| {
                    expression
                        .operator()
                        .evaluate(variable.name(), value, expression.value())
                });
                self.leaf(node, outcome)?
            }
            Node::Bool(expression) => {
                let variable = expression.variable();
                let outcome = event
                    .get(variable.id())
                    .map(|value| expression.operator().evaluate(variable.name(), value));
                self.leaf(node, outcome)?
            }
            Node::List(expression) => {
                let variable = expression.variable();
                let outcome = event.get(variable.id()).map(|value| {
                    expression
                        .operator()
                        .evaluate(variable.name(), expression.list(), value)
                });
                self.leaf(node, outcome)?
            }
        };

        if let Some(id) = id {
            self.cache.insert(id, result);
        }
        Ok(result)
    }

    /// `outcome` is `None` when the attribute is absent from the event.
    fn leaf(
        &mut self,
        node: &Node,
        outcome: Option<Result<bool, EvalError>>,
    ) -> Result<Truth, EvalError> {
        self.report.evaluated += 1;
        let result = match outcome {
            None => Truth::Undefined,
            Some(Ok(result)) => Truth::from(result),
            Some(Err(error)) => match self.options.mismatch {
                MismatchPolicy::Fail => return Err(error),
                MismatchPolicy::Undefined => {
                    be_tree_log!(
                        log::Level::Warn,
                        ctx: EVALUATION_LOG_CTX,
                        "type_mismatch",
                        "predicate={} error={}",
                        node,
                        error,
                    );
                    Truth::Undefined
                }
            },
        };
        if result.is_true() {
            self.report.matched += 1;
        }
        Ok(result)
    }
}

/// Evaluates a bound predicate against an event, without memoization.
///
/// # Panics
///
/// When a variable of the predicate was never bound.
pub fn match_node(event: &Event, node: &Node, report: &mut Report) -> Result<Truth, EvalError> {
    let options = EvalOptions::default().with_memoization(false);
    Matcher::new(&options, &mut NoMemo, report).evaluate(event, node)
}
