use crate::{
    ast::Node,
    predicates::{BoolOperator, CombiOperator, ComparisonOperator, SetOperator},
    registry::AttributeDomain,
    values::{Value, ValueBound, ValueKind},
};
use rust_decimal::Decimal;

/// Computes the values the attribute of `domain` may take for the predicate to be true.
///
/// An event whose value for the attribute lies outside of the returned bound cannot match. An
/// [`ValueBound::Empty`] bound means that the predicate can never be true.
///
/// # Panics
///
/// When a variable of the predicate was never bound.
pub fn get_variable_bound(domain: &AttributeDomain, node: &Node) -> ValueBound {
    variable_bound(domain, node, false)
}

/// `negated` is set under an odd number of `not`: the bound then covers the values for which the
/// sub-expression is false.
fn variable_bound(domain: &AttributeDomain, node: &Node, negated: bool) -> ValueBound {
    match node {
        Node::Combi(expression) => {
            let lhs = variable_bound(domain, expression.lhs(), negated);
            let rhs = variable_bound(domain, expression.rhs(), negated);
            match (expression.operator(), negated) {
                (CombiOperator::And, false) | (CombiOperator::Or, true) => lhs.intersect(&rhs),
                (CombiOperator::Or, false) | (CombiOperator::And, true) => lhs.union(&rhs),
            }
        }
        Node::Not(expression) => variable_bound(domain, expression.inner(), !negated),
        Node::Binary(expression) if expression.variable().id() == domain.variable_id() => {
            let operator = if negated {
                expression.operator().negate()
            } else {
                expression.operator()
            };
            comparison_bound(domain, operator, expression.value())
        }
        Node::Bool(expression) if expression.variable().id() == domain.variable_id() => {
            let operator = if negated {
                expression.operator().negate()
            } else {
                expression.operator()
            };
            match (domain.kind(), operator) {
                (ValueKind::Boolean, BoolOperator::IsTrue) => {
                    clamp(domain, ValueBound::boolean(true, true))
                }
                (ValueKind::Boolean, BoolOperator::IsFalse) => {
                    clamp(domain, ValueBound::boolean(false, false))
                }
                _ => domain.bound().clone(),
            }
        }
        Node::List(expression) if expression.variable().id() == domain.variable_id() => {
            let operator = if negated {
                expression.operator().negate()
            } else {
                expression.operator()
            };
            let list = expression.list();
            match (domain.kind(), operator) {
                (ValueKind::Integer, SetOperator::In) => match (list.first(), list.last()) {
                    (Some(min), Some(max)) => clamp(domain, ValueBound::integer(*min, *max)),
                    _ => ValueBound::Empty,
                },
                _ => domain.bound().clone(),
            }
        }
        Node::Binary(_) | Node::Bool(_) | Node::List(_) => domain.bound().clone(),
    }
}

fn comparison_bound(
    domain: &AttributeDomain,
    operator: ComparisonOperator,
    literal: &Value,
) -> ValueBound {
    let bound = match (domain.kind(), literal, literal.as_decimal()) {
        (ValueKind::Integer, Value::Integer(value), _) => integer_bound(operator, *value),
        (ValueKind::Float, _, Some(value)) => float_bound(operator, value),
        (ValueKind::Boolean, Value::Boolean(value), _) => match operator {
            ComparisonOperator::Equal => ValueBound::boolean(*value, *value),
            ComparisonOperator::NotEqual => ValueBound::boolean(!*value, !*value),
            _ => return domain.bound().clone(),
        },
        _ => return domain.bound().clone(),
    };
    clamp(domain, bound)
}

fn integer_bound(operator: ComparisonOperator, value: i64) -> ValueBound {
    match operator {
        ComparisonOperator::LessThan => value
            .checked_sub(1)
            .map_or(ValueBound::Empty, |max| ValueBound::integer(i64::MIN, max)),
        ComparisonOperator::LessThanEqual => ValueBound::integer(i64::MIN, value),
        ComparisonOperator::Equal => ValueBound::integer(value, value),
        ComparisonOperator::NotEqual => ValueBound::integer(i64::MIN, i64::MAX),
        ComparisonOperator::GreaterThan => value
            .checked_add(1)
            .map_or(ValueBound::Empty, |min| ValueBound::integer(min, i64::MAX)),
        ComparisonOperator::GreaterThanEqual => ValueBound::integer(value, i64::MAX),
    }
}

// Strict comparisons keep their limit: the bound stays closed.
fn float_bound(operator: ComparisonOperator, value: Decimal) -> ValueBound {
    match operator {
        ComparisonOperator::LessThan | ComparisonOperator::LessThanEqual => {
            ValueBound::float(Decimal::MIN, value)
        }
        ComparisonOperator::Equal => ValueBound::float(value, value),
        ComparisonOperator::NotEqual => ValueBound::float(Decimal::MIN, Decimal::MAX),
        ComparisonOperator::GreaterThan | ComparisonOperator::GreaterThanEqual => {
            ValueBound::float(value, Decimal::MAX)
        }
    }
}

#[inline]
fn clamp(domain: &AttributeDomain, bound: ValueBound) -> ValueBound {
    bound.intersect(domain.bound())
}
