//! Entity set references consumed by the URL builder

use uuid::Uuid;

/// Primitive type of an entity set key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKeyType {
    Int32,
    Int64,
    String,
    Guid,
}

impl EntityKeyType {
    /// EDM type name, e.g. `Edm.Int32`.
    #[must_use]
    pub fn edm_name(self) -> &'static str {
        match self {
            EntityKeyType::Int32 => "Edm.Int32",
            EntityKeyType::Int64 => "Edm.Int64",
            EntityKeyType::String => "Edm.String",
            EntityKeyType::Guid => "Edm.Guid",
        }
    }
}

/// A named, addressable collection of entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    name: String,
    key_type: EntityKeyType,
}

impl EntitySet {
    #[must_use]
    pub fn new(name: impl Into<String>, key_type: EntityKeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key_type(&self) -> EntityKeyType {
        self.key_type
    }
}

/// Renders an entity key as an OData key predicate: `(12345)` or `('Milk')`.
///
/// String keys are wrapped in single quotes verbatim; embedded quotes are not
/// doubled.
pub trait KeyLiteral {
    fn key_literal(&self) -> String;
}

macro_rules! integer_key_literal {
    ($($t:ty),*) => {
        $(
            impl KeyLiteral for $t {
                fn key_literal(&self) -> String {
                    format!("({self})")
                }
            }
        )*
    };
}

integer_key_literal!(i16, i32, i64, u16, u32, u64);

impl KeyLiteral for str {
    fn key_literal(&self) -> String {
        format!("('{self}')")
    }
}

impl KeyLiteral for String {
    fn key_literal(&self) -> String {
        self.as_str().key_literal()
    }
}

impl KeyLiteral for Uuid {
    fn key_literal(&self) -> String {
        format!("({self})")
    }
}

impl<T: KeyLiteral + ?Sized> KeyLiteral for &T {
    fn key_literal(&self) -> String {
        (**self).key_literal()
    }
}

/// The entity sets exposed by a service, in registration order.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDataModel {
    entity_sets: Vec<EntitySet>,
}

impl EntityDataModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity set; a set with the same name replaces the earlier one.
    #[must_use]
    pub fn with_entity_set(mut self, entity_set: EntitySet) -> Self {
        match self
            .entity_sets
            .iter_mut()
            .find(|es| es.name.eq_ignore_ascii_case(&entity_set.name))
        {
            Some(existing) => *existing = entity_set,
            None => self.entity_sets.push(entity_set),
        }
        self
    }

    #[must_use]
    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    #[must_use]
    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets
            .iter()
            .find(|es| es.name.eq_ignore_ascii_case(name))
    }

    /// Resolve the entity set addressed by a request path such as
    /// `/odata/Products('Milk')/Name`.
    ///
    /// The first segment after the route prefix is used, with any key
    /// predicate stripped.
    #[must_use]
    pub fn entity_set_for_path(&self, path: &str, route_prefix: &str) -> Option<&EntitySet> {
        let lower = path.to_ascii_lowercase();
        let start = lower.find(&route_prefix.to_ascii_lowercase())? + route_prefix.len();
        let segment = path[start..]
            .trim_start_matches('/')
            .split(['/', '?'])
            .next()?;
        let name = segment.split('(').next()?;
        if name.is_empty() {
            return None;
        }
        self.entity_set(name)
    }
}
