use crate::{
    predicates::{BoolOperator, CombiOperator, ComparisonOperator, SetOperator},
    registry::{PredicateId, Registry, VariableId},
    values::Value,
};
use itertools::Itertools;
use std::fmt::{self, Display, Formatter};

pub type TreeNode = Box<Node>;

/// A boolean predicate.
///
/// Nodes are built with their variables unresolved; [`assign_variable_id`] must run on the
/// whole tree before it is evaluated or its bounds extracted.
#[derive(PartialEq, Clone, Debug)]
pub enum Node {
    Binary(BinaryExpr),
    Combi(CombiExpr),
    Bool(BoolExpr),
    List(ListExpr),
    Not(NotExpr),
}

/// An attribute referenced by a predicate.
#[derive(PartialEq, Clone, Debug)]
pub struct Variable {
    name: String,
    id: Option<VariableId>,
}

impl Variable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            id: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// # Panics
    ///
    /// When the predicate holding this variable was never bound.
    #[inline]
    pub fn id(&self) -> VariableId {
        match self.id {
            Some(id) => id,
            None => panic!(
                "variable '{}' has no id: the predicate must be bound before being used",
                self.name
            ),
        }
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct BinaryExpr {
    operator: ComparisonOperator,
    variable: Variable,
    value: Value,
    id: Option<PredicateId>,
}

impl BinaryExpr {
    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct CombiExpr {
    operator: CombiOperator,
    lhs: TreeNode,
    rhs: TreeNode,
    id: Option<PredicateId>,
}

impl CombiExpr {
    pub fn operator(&self) -> CombiOperator {
        self.operator
    }

    pub fn lhs(&self) -> &Node {
        &self.lhs
    }

    pub fn rhs(&self) -> &Node {
        &self.rhs
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct BoolExpr {
    operator: BoolOperator,
    variable: Variable,
    id: Option<PredicateId>,
}

impl BoolExpr {
    pub fn operator(&self) -> BoolOperator {
        self.operator
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct ListExpr {
    operator: SetOperator,
    variable: Variable,
    list: Vec<i64>,
    id: Option<PredicateId>,
}

impl ListExpr {
    pub fn operator(&self) -> SetOperator {
        self.operator
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Sorted and without duplicates.
    pub fn list(&self) -> &[i64] {
        &self.list
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct NotExpr {
    inner: TreeNode,
    id: Option<PredicateId>,
}

impl NotExpr {
    pub fn inner(&self) -> &Node {
        &self.inner
    }
}

/// The constructors accept any attribute name. Only identifiers that are not keywords survive
/// [`ast_to_string`] and [`crate::parse`]; [`crate::validate_predicate`] rejects the others.
impl Node {
    pub fn binary(operator: ComparisonOperator, name: &str, value: Value) -> Self {
        Self::Binary(BinaryExpr {
            operator,
            variable: Variable::new(name),
            value,
            id: None,
        })
    }

    pub fn combi(operator: CombiOperator, lhs: Node, rhs: Node) -> Self {
        Self::Combi(CombiExpr {
            operator,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            id: None,
        })
    }

    #[inline]
    pub fn and(lhs: Node, rhs: Node) -> Self {
        Self::combi(CombiOperator::And, lhs, rhs)
    }

    #[inline]
    pub fn or(lhs: Node, rhs: Node) -> Self {
        Self::combi(CombiOperator::Or, lhs, rhs)
    }

    pub fn boolean(operator: BoolOperator, name: &str) -> Self {
        Self::Bool(BoolExpr {
            operator,
            variable: Variable::new(name),
            id: None,
        })
    }

    pub fn list(operator: SetOperator, name: &str, mut list: Vec<i64>) -> Self {
        list.sort_unstable();
        list.dedup();
        Self::List(ListExpr {
            operator,
            variable: Variable::new(name),
            list,
            id: None,
        })
    }

    /// Negates a node; a boolean test absorbs the negation (`not private`).
    pub fn not(inner: Node) -> Self {
        match inner {
            Self::Bool(expression) => Self::Bool(BoolExpr {
                operator: expression.operator.negate(),
                variable: expression.variable,
                id: None,
            }),
            inner => Self::Not(NotExpr {
                inner: Box::new(inner),
                id: None,
            }),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Binary(_) | Self::Bool(_) | Self::List(_))
    }

    #[inline]
    pub fn predicate_id(&self) -> Option<PredicateId> {
        match self {
            Self::Binary(expression) => expression.id,
            Self::Combi(expression) => expression.id,
            Self::Bool(expression) => expression.id,
            Self::List(expression) => expression.id,
            Self::Not(expression) => expression.id,
        }
    }

    fn predicate_id_mut(&mut self) -> &mut Option<PredicateId> {
        match self {
            Self::Binary(expression) => &mut expression.id,
            Self::Combi(expression) => &mut expression.id,
            Self::Bool(expression) => &mut expression.id,
            Self::List(expression) => &mut expression.id,
            Self::Not(expression) => &mut expression.id,
        }
    }

    /// The variable tested by a leaf.
    pub fn variable(&self) -> Option<&Variable> {
        match self {
            Self::Binary(expression) => Some(&expression.variable),
            Self::Bool(expression) => Some(&expression.variable),
            Self::List(expression) => Some(&expression.variable),
            Self::Combi(_) | Self::Not(_) => None,
        }
    }

    /// Distinct ids of the variables referenced by the tree, in ascending order.
    pub fn variable_ids(&self) -> Vec<VariableId> {
        let mut ids = vec![];
        self.collect_variable_ids(&mut ids);
        ids.into_iter().sorted().dedup().collect()
    }

    fn collect_variable_ids(&self, ids: &mut Vec<VariableId>) {
        match self {
            Self::Combi(expression) => {
                expression.lhs.collect_variable_ids(ids);
                expression.rhs.collect_variable_ids(ids);
            }
            Self::Not(expression) => expression.inner.collect_variable_ids(ids),
            leaf => {
                if let Some(variable) = leaf.variable() {
                    ids.push(variable.id());
                }
            }
        }
    }

    /// Binding strength when printing; leaves and negations never need parentheses.
    fn precedence(&self) -> u8 {
        match self {
            Self::Combi(expression) => expression.operator.precedence(),
            _ => u8::MAX,
        }
    }
}

/// Resolves the id of every variable of the tree, registering the names the registry has never
/// seen. Running it more than once is harmless.
pub fn assign_variable_id(registry: &mut Registry, node: &mut Node) {
    match node {
        Node::Binary(expression) => bind(registry, &mut expression.variable),
        Node::Bool(expression) => bind(registry, &mut expression.variable),
        Node::List(expression) => bind(registry, &mut expression.variable),
        Node::Combi(expression) => {
            assign_variable_id(registry, &mut expression.lhs);
            assign_variable_id(registry, &mut expression.rhs);
        }
        Node::Not(expression) => assign_variable_id(registry, &mut expression.inner),
    }
}

#[inline]
fn bind(registry: &mut Registry, variable: &mut Variable) {
    variable.id = Some(registry.lookup_or_register(&variable.name));
}

/// Gives every sub-expression the id of its canonical form so that identical sub-expressions,
/// within a predicate or across predicates sharing the registry, are memoized together.
pub fn assign_predicate_id(registry: &mut Registry, node: &mut Node) {
    match node {
        Node::Combi(expression) => {
            assign_predicate_id(registry, &mut expression.lhs);
            assign_predicate_id(registry, &mut expression.rhs);
        }
        Node::Not(expression) => assign_predicate_id(registry, &mut expression.inner),
        Node::Binary(_) | Node::Bool(_) | Node::List(_) => {}
    }
    let id = registry.predicate_id(&node.to_string());
    *node.predicate_id_mut() = Some(id);
}

/// Gives back the predicate ids taken by [`assign_predicate_id`] and clears them from the tree.
pub fn release_predicate_ids(registry: &mut Registry, node: &mut Node) {
    match node {
        Node::Combi(expression) => {
            release_predicate_ids(registry, &mut expression.lhs);
            release_predicate_ids(registry, &mut expression.rhs);
        }
        Node::Not(expression) => release_predicate_ids(registry, &mut expression.inner),
        Node::Binary(_) | Node::Bool(_) | Node::List(_) => {}
    }
    if let Some(id) = node.predicate_id_mut().take() {
        registry.release_predicate_id(id);
    }
}

/// Canonical textual form of the predicate; parsing it back yields an equal tree.
#[inline]
pub fn ast_to_string(node: &Node) -> String {
    node.to_string()
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(expression) => write!(
                f,
                "{} {} {}",
                expression.variable.name, expression.operator, expression.value
            ),
            Self::Bool(expression) => match expression.operator {
                BoolOperator::IsTrue => write!(f, "{}", expression.variable.name),
                BoolOperator::IsFalse => write!(f, "not {}", expression.variable.name),
            },
            Self::List(expression) => write!(
                f,
                "{} {} ({})",
                expression.variable.name,
                expression.operator,
                expression.list.iter().join(", ")
            ),
            Self::Not(expression) if expression.inner.is_leaf() => {
                write!(f, "not {}", expression.inner)
            }
            Self::Not(expression) => match *expression.inner {
                Self::Not(_) => write!(f, "not {}", expression.inner),
                _ => write!(f, "not ({})", expression.inner),
            },
            Self::Combi(expression) => {
                let precedence = expression.operator.precedence();
                if expression.lhs.precedence() < precedence {
                    write!(f, "({})", expression.lhs)?;
                } else {
                    write!(f, "{}", expression.lhs)?;
                }
                write!(f, " {} ", expression.operator)?;
                // Operators are parsed left-associative, a nested right operand keeps its group.
                if expression.rhs.precedence() <= precedence {
                    write!(f, "({})", expression.rhs)
                } else {
                    write!(f, "{}", expression.rhs)
                }
            }
        }
    }
}
