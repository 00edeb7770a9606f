use crate::{
    events::EventError,
    logging::{be_tree_log, LogContext},
    strings::StringTable,
    values::{ValueBound, ValueKind},
};
use rust_decimal::Decimal;

const REGISTRY_LOG_CTX: LogContext = LogContext::new("component=registry");

/// Dense index of an attribute inside a [`Registry`] and an [`crate::Event`].
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash, Debug)]
pub struct VariableId(usize);

impl VariableId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Identity of a canonical sub-expression, shared by every predicate containing it.
#[derive(Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash, Debug)]
pub struct PredicateId(usize);

impl PredicateId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct AttributeDefinition {
    name: String,
    kind: ValueKind,
    bound: ValueBound,
    allow_undefined: bool,
}

impl AttributeDefinition {
    pub fn boolean(name: &str) -> Self {
        Self::new(name, ValueKind::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    /// An integer attribute whose values must lie in `[min, max]`.
    pub fn bounded_integer(name: &str, min: i64, max: i64) -> Self {
        Self {
            bound: ValueBound::integer(min, max),
            ..Self::integer(name)
        }
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, ValueKind::Float)
    }

    /// A float attribute whose values must lie in `[min, max]`.
    pub fn bounded_float(name: &str, min: Decimal, max: Decimal) -> Self {
        Self {
            bound: ValueBound::float(min, max),
            ..Self::float(name)
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ValueKind::String)
    }

    pub fn integer_list(name: &str) -> Self {
        Self::new(name, ValueKind::IntegerList)
    }

    /// Events are allowed to omit this attribute.
    pub fn allow_undefined(mut self) -> Self {
        self.allow_undefined = true;
        self
    }

    fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            bound: ValueBound::full(kind),
            allow_undefined: false,
        }
    }
}

/// Type and bound metadata of a registered attribute.
#[derive(Clone, Debug)]
pub struct AttributeDomain {
    variable_id: VariableId,
    name: String,
    kind: ValueKind,
    bound: ValueBound,
    allow_undefined: bool,
}

impl AttributeDomain {
    pub fn variable_id(&self) -> VariableId {
        self.variable_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn bound(&self) -> &ValueBound {
        &self.bound
    }

    pub fn allow_undefined(&self) -> bool {
        self.allow_undefined
    }
}

/// Owns the attribute name to variable id mapping, the attribute domains and the predicate
/// ids used for memoization.
///
/// Names can be registered before their domain is known: binding a predicate registers every
/// attribute it mentions, a domain can be attached to it later with [`Registry::add_domain`].
#[derive(Default, Debug)]
pub struct Registry {
    names: StringTable,
    domains: Vec<Option<AttributeDomain>>,
    predicates: StringTable,
    predicate_uses: Vec<usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            names: StringTable::new(),
            domains: vec![],
            predicates: StringTable::new(),
            predicate_uses: vec![],
        }
    }

    pub fn with_definitions(definitions: &[AttributeDefinition]) -> Result<Self, EventError> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.add_domain(definition)?;
        }
        Ok(registry)
    }

    pub fn add_domain(&mut self, definition: &AttributeDefinition) -> Result<VariableId, EventError> {
        let variable_id = self.lookup_or_register(&definition.name);
        let slot = &mut self.domains[variable_id.0];
        if slot.is_some() {
            return Err(EventError::AlreadyPresent(definition.name.clone()));
        }

        *slot = Some(AttributeDomain {
            variable_id,
            name: definition.name.clone(),
            kind: definition.kind,
            bound: definition.bound.clone(),
            allow_undefined: definition.allow_undefined,
        });
        Ok(variable_id)
    }

    pub fn lookup_or_register(&mut self, name: &str) -> VariableId {
        if let Some(index) = self.names.get(name) {
            return VariableId(index);
        }

        let index = self.names.get_or_update(name);
        self.domains.push(None);
        be_tree_log!(
            log::Level::Debug,
            ctx: REGISTRY_LOG_CTX,
            "variable_registered",
            "name={} variable_id={}",
            name,
            index,
        );
        VariableId(index)
    }

    pub fn by_name(&self, name: &str) -> Option<VariableId> {
        self.names.get(name).map(VariableId)
    }

    pub fn name(&self, id: VariableId) -> Option<&str> {
        self.names.by_id(id.0)
    }

    pub fn domain(&self, id: VariableId) -> Option<&AttributeDomain> {
        self.domains.get(id.0).and_then(Option::as_ref)
    }

    pub fn domain_by_name(&self, name: &str) -> Option<&AttributeDomain> {
        self.by_name(name).and_then(|id| self.domain(id))
    }

    pub fn domain_bounds(&self, id: VariableId) -> Option<(ValueKind, &ValueBound)> {
        self.domain(id).map(|domain| (domain.kind, &domain.bound))
    }

    pub fn domains(&self) -> impl Iterator<Item = &AttributeDomain> {
        self.domains.iter().flatten()
    }

    /// Number of registered variables, with or without a domain.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Interns a canonical sub-expression and takes a reference on its id.
    pub(crate) fn predicate_id(&mut self, canonical: &str) -> PredicateId {
        let index = self.predicates.get_or_update(canonical);
        if self.predicate_uses.len() <= index {
            self.predicate_uses.resize(index + 1, 0);
        }
        self.predicate_uses[index] += 1;
        PredicateId(index)
    }

    /// Drops a reference on a predicate id; the id is recycled once nothing refers to it.
    pub(crate) fn release_predicate_id(&mut self, id: PredicateId) {
        let Some(uses) = self.predicate_uses.get_mut(id.0) else {
            return;
        };
        if *uses == 0 {
            return;
        }
        *uses -= 1;
        if *uses == 0 {
            if let Some(canonical) = self.predicates.remove(id.0) {
                be_tree_log!(
                    log::Level::Trace,
                    ctx: REGISTRY_LOG_CTX,
                    "predicate_released",
                    "predicate_id={} predicate=\"{}\"",
                    id.0,
                    canonical,
                );
            }
        }
    }

    /// Number of predicate ids in use.
    pub fn predicate_count(&self) -> usize {
        self.predicates.len()
    }

    /// Upper bound of the predicate ids in use, for sizing tables indexed by them.
    pub fn predicate_capacity(&self) -> usize {
        self.predicates.capacity()
    }
}
