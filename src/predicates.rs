use crate::{
    ast::Node,
    error::EvalError,
    events::EventError,
    lexer::is_identifier,
    registry::Registry,
    values::{Value, ValueKind},
};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum ComparisonOperator {
    LessThan,
    LessThanEqual,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl ComparisonOperator {
    /// The operator to use once both operands are swapped (`15 < price` is `price > 15`).
    pub fn flip(self) -> Self {
        match self {
            Self::LessThan => Self::GreaterThan,
            Self::LessThanEqual => Self::GreaterThanEqual,
            Self::GreaterThan => Self::LessThan,
            Self::GreaterThanEqual => Self::LessThanEqual,
            Self::Equal => Self::Equal,
            Self::NotEqual => Self::NotEqual,
        }
    }

    /// The operator that holds exactly when this one does not.
    pub fn negate(self) -> Self {
        match self {
            Self::LessThan => Self::GreaterThanEqual,
            Self::LessThanEqual => Self::GreaterThan,
            Self::GreaterThan => Self::LessThanEqual,
            Self::GreaterThanEqual => Self::LessThan,
            Self::Equal => Self::NotEqual,
            Self::NotEqual => Self::Equal,
        }
    }

    #[inline]
    fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }

    /// Compares the event's value (left operand) with the literal (right operand).
    pub(crate) fn evaluate(
        &self,
        name: &str,
        value: &Value,
        literal: &Value,
    ) -> Result<bool, EvalError> {
        match (value, literal) {
            (Value::Integer(a), Value::Integer(b)) => Ok(self.apply(a.cmp(b))),
            (Value::String(a), Value::String(b)) => Ok(self.apply(a.cmp(b))),
            (Value::Float(_) | Value::Integer(_), Value::Float(_) | Value::Integer(_)) => {
                Ok(self.apply(value.as_decimal().cmp(&literal.as_decimal())))
            }
            (Value::Boolean(a), Value::Boolean(b)) if self.is_equality() => {
                Ok(self.apply(a.cmp(b)))
            }
            (Value::Boolean(_) | Value::IntegerList(_), _) if value.kind() == literal.kind() => {
                Err(EvalError::UnsupportedOperator {
                    name: name.to_string(),
                    operator: *self,
                    kind: value.kind(),
                })
            }
            (value, literal) => Err(EvalError::TypeMismatch {
                name: name.to_string(),
                expected: literal.kind(),
                actual: value.kind(),
            }),
        }
    }

    #[inline]
    fn apply(&self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => ordering.is_lt(),
            Self::LessThanEqual => ordering.is_le(),
            Self::Equal => ordering.is_eq(),
            Self::NotEqual => ordering.is_ne(),
            Self::GreaterThan => ordering.is_gt(),
            Self::GreaterThanEqual => ordering.is_ge(),
        }
    }
}

impl Display for ComparisonOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let operator = match self {
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
        };
        write!(f, "{operator}")
    }
}

#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum CombiOperator {
    And,
    Or,
}

impl CombiOperator {
    /// Binding strength when printing; `and` binds tighter than `or`.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
        }
    }
}

impl Display for CombiOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "and"),
            Self::Or => write!(f, "or"),
        }
    }
}

#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum BoolOperator {
    IsTrue,
    IsFalse,
}

impl BoolOperator {
    pub fn negate(self) -> Self {
        match self {
            Self::IsTrue => Self::IsFalse,
            Self::IsFalse => Self::IsTrue,
        }
    }

    pub(crate) fn evaluate(&self, name: &str, value: &Value) -> Result<bool, EvalError> {
        match (self, value) {
            (Self::IsTrue, Value::Boolean(value)) => Ok(*value),
            (Self::IsFalse, Value::Boolean(value)) => Ok(!*value),
            (_, value) => Err(EvalError::TypeMismatch {
                name: name.to_string(),
                expected: ValueKind::Boolean,
                actual: value.kind(),
            }),
        }
    }
}

#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
pub enum SetOperator {
    In,
    NotIn,
}

impl SetOperator {
    pub fn negate(self) -> Self {
        match self {
            Self::In => Self::NotIn,
            Self::NotIn => Self::In,
        }
    }

    /// `haystack` must be sorted. A list value matches `in` when any of its elements is in the
    /// haystack and `not in` when none is.
    pub(crate) fn evaluate(
        &self,
        name: &str,
        haystack: &[i64],
        value: &Value,
    ) -> Result<bool, EvalError> {
        let found = match value {
            Value::Integer(needle) => haystack.binary_search(needle).is_ok(),
            Value::IntegerList(needles) => needles
                .iter()
                .any(|needle| haystack.binary_search(needle).is_ok()),
            value => {
                return Err(EvalError::TypeMismatch {
                    name: name.to_string(),
                    expected: ValueKind::Integer,
                    actual: value.kind(),
                })
            }
        };
        Ok(match self {
            Self::In => found,
            Self::NotIn => !found,
        })
    }
}

impl Display for SetOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::NotIn => write!(f, "not in"),
        }
    }
}

/// Checks every predicate of the expression against the domains declared in the registry.
pub fn validate_predicate(registry: &Registry, node: &Node) -> Result<(), EventError> {
    match node {
        Node::Combi(expression) => {
            validate_predicate(registry, expression.lhs())?;
            validate_predicate(registry, expression.rhs())
        }
        Node::Not(expression) => validate_predicate(registry, expression.inner()),
        Node::Binary(expression) => {
            let name = expression.variable().name();
            let kind = domain_kind(registry, name)?;
            let literal = expression.value().kind();
            match (kind, literal) {
                (ValueKind::Integer | ValueKind::Float, ValueKind::Integer | ValueKind::Float) => {
                    Ok(())
                }
                (ValueKind::String, ValueKind::String) => Ok(()),
                (ValueKind::Boolean, ValueKind::Boolean) if expression.operator().is_equality() => {
                    Ok(())
                }
                (ValueKind::Boolean, ValueKind::Boolean) => Err(EventError::InvalidOperator {
                    name: name.to_string(),
                    operator: expression.operator(),
                    kind,
                }),
                (expected, actual) => Err(EventError::MismatchingTypes {
                    name: name.to_string(),
                    expected,
                    actual,
                }),
            }
        }
        Node::Bool(expression) => {
            let name = expression.variable().name();
            match domain_kind(registry, name)? {
                ValueKind::Boolean => Ok(()),
                expected => Err(EventError::MismatchingTypes {
                    name: name.to_string(),
                    expected,
                    actual: ValueKind::Boolean,
                }),
            }
        }
        Node::List(expression) => {
            let name = expression.variable().name();
            match domain_kind(registry, name)? {
                ValueKind::Integer | ValueKind::IntegerList => Ok(()),
                expected => Err(EventError::MismatchingTypes {
                    name: name.to_string(),
                    expected,
                    actual: ValueKind::IntegerList,
                }),
            }
        }
    }
}

fn domain_kind(registry: &Registry, name: &str) -> Result<ValueKind, EventError> {
    if !is_identifier(name) {
        return Err(EventError::InvalidName(name.to_string()));
    }
    registry
        .domain_by_name(name)
        .map(|domain| domain.kind())
        .ok_or_else(|| EventError::NonExisting(name.to_string()))
}
