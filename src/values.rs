use itertools::Itertools;
use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter};

#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(Decimal),
    String(String),
    IntegerList(Vec<i64>),
}

impl Value {
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::Integer(_) => ValueKind::Integer,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::IntegerList(_) => ValueKind::IntegerList,
        }
    }

    /// Numeric view of the value, promoting integers to decimals.
    #[inline]
    pub(crate) fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(value) => Some(Decimal::from(*value)),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            // A float without a fractional part would read back as an integer.
            Self::Float(value) if value.scale() == 0 => {
                write!(f, "{value}.0")
            }
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => {
                write!(f, "\"")?;
                for c in value.chars() {
                    match c {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Self::IntegerList(values) => write!(f, "({})", values.iter().join(", ")),
        }
    }
}

#[derive(Hash, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
    IntegerList,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::IntegerList => "integer list",
        };
        write!(f, "{name}")
    }
}

/// The closed interval of values a variable may take.
///
/// `Empty` means that no value can satisfy the constraint while `Unbounded` is used for the
/// kinds that have no ordering useful for pruning (strings and lists).
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ValueBound {
    Empty,
    Boolean { min: bool, max: bool },
    Integer { min: i64, max: i64 },
    Float { min: Decimal, max: Decimal },
    Unbounded,
}

impl ValueBound {
    /// The widest bound for a domain of the given kind.
    pub fn full(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Boolean => Self::Boolean {
                min: false,
                max: true,
            },
            ValueKind::Integer => Self::Integer {
                min: i64::MIN,
                max: i64::MAX,
            },
            ValueKind::Float => Self::Float {
                min: Decimal::MIN,
                max: Decimal::MAX,
            },
            ValueKind::String | ValueKind::IntegerList => Self::Unbounded,
        }
    }

    pub(crate) fn integer(min: i64, max: i64) -> Self {
        if min > max {
            Self::Empty
        } else {
            Self::Integer { min, max }
        }
    }

    pub(crate) fn float(min: Decimal, max: Decimal) -> Self {
        if min > max {
            Self::Empty
        } else {
            Self::Float { min, max }
        }
    }

    pub(crate) fn boolean(min: bool, max: bool) -> Self {
        if min & !max {
            Self::Empty
        } else {
            Self::Boolean { min, max }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Bound satisfied by both operands (conjunction).
    pub fn intersect(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Empty, _) | (_, Self::Empty) => Self::Empty,
            (Self::Unbounded, bound) | (bound, Self::Unbounded) => bound.clone(),
            (Self::Integer { min: a, max: b }, Self::Integer { min: c, max: d }) => {
                Self::integer(*a.max(c), *b.min(d))
            }
            (Self::Float { min: a, max: b }, Self::Float { min: c, max: d }) => {
                Self::float(*a.max(c), *b.min(d))
            }
            (Self::Boolean { min: a, max: b }, Self::Boolean { min: c, max: d }) => {
                Self::boolean(*a.max(c), *b.min(d))
            }
            (a, b) => unreachable!("intersecting bounds of different kinds ({a:?} and {b:?}) should never happen. This is a bug."),
        }
    }

    /// Smallest bound covering both operands (disjunction).
    pub fn union(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Empty, bound) | (bound, Self::Empty) => bound.clone(),
            (Self::Unbounded, _) | (_, Self::Unbounded) => Self::Unbounded,
            (Self::Integer { min: a, max: b }, Self::Integer { min: c, max: d }) => {
                Self::integer(*a.min(c), *b.max(d))
            }
            (Self::Float { min: a, max: b }, Self::Float { min: c, max: d }) => {
                Self::float(*a.min(c), *b.max(d))
            }
            (Self::Boolean { min: a, max: b }, Self::Boolean { min: c, max: d }) => {
                Self::boolean(*a.min(c), *b.max(d))
            }
            (a, b) => unreachable!("merging bounds of different kinds ({a:?} and {b:?}) should never happen. This is a bug."),
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Empty, _) => false,
            (Self::Unbounded, _) => true,
            (Self::Boolean { min, max }, Value::Boolean(value)) => min <= value && value <= max,
            (Self::Integer { min, max }, Value::Integer(value)) => min <= value && value <= max,
            (Self::Float { min, max }, value) => value
                .as_decimal()
                .is_some_and(|value| *min <= value && value <= *max),
            _ => false,
        }
    }
}
