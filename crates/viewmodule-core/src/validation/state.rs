#![forbid(unsafe_code)]

//! Validation results and the per-view-model error table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::property::PropertyName;

/// Result of validating one property, or the entity as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationState {
    /// Errors attributed to a single property.
    PropertyErrors {
        property: PropertyName,
        errors: Vec<String>,
    },
    /// Errors about the object as a whole (cross-field rules).
    EntityErrors(Vec<String>),
}

impl ValidationState {
    #[must_use]
    pub fn property(property: PropertyName, errors: Vec<String>) -> Self {
        Self::PropertyErrors { property, errors }
    }

    #[must_use]
    pub fn entity(errors: Vec<String>) -> Self {
        Self::EntityErrors(errors)
    }

    #[must_use]
    pub fn scope(&self) -> ErrorScope {
        match self {
            Self::PropertyErrors { property, .. } => ErrorScope::Property(*property),
            Self::EntityErrors(_) => ErrorScope::Entity,
        }
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        match self {
            Self::PropertyErrors { errors, .. } | Self::EntityErrors(errors) => errors,
        }
    }

    fn into_parts(self) -> (ErrorScope, Vec<String>) {
        match self {
            Self::PropertyErrors { property, errors } => (ErrorScope::Property(property), errors),
            Self::EntityErrors(errors) => (ErrorScope::Entity, errors),
        }
    }
}

/// Where a set of errors is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorScope {
    Property(PropertyName),
    Entity,
}

impl fmt::Display for ErrorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, "{name}"),
            Self::Entity => f.write_str("<entity>"),
        }
    }
}

/// Producer of validation states: a property's own validator, or a
/// view-model hook identified by registration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValidationSource {
    Property(PropertyName),
    Hook(usize),
}

impl From<PropertyName> for ValidationSource {
    fn from(property: PropertyName) -> Self {
        Self::Property(property)
    }
}

/// Current validation errors of a view-model.
///
/// Each scope holds the errors of its most recent evaluation: a new state for
/// a scope replaces the whole list, whichever source or trigger produced it.
/// The table also remembers which scopes every source wrote last time; when
/// that source runs again and no longer reports one of them, the scope is
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTable {
    /// Non-empty error lists only.
    scopes: BTreeMap<ErrorScope, Vec<String>>,
    produced: BTreeMap<ValidationSource, BTreeSet<ErrorScope>>,
}

impl ErrorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one evaluation of `source`. States for the same scope within
    /// `states` are concatenated. Returns the scopes whose error list changed,
    /// in scope order.
    pub fn replace(
        &mut self,
        source: impl Into<ValidationSource>,
        states: impl IntoIterator<Item = ValidationState>,
    ) -> Vec<ErrorScope> {
        let mut fresh: BTreeMap<ErrorScope, Vec<String>> = BTreeMap::new();
        for state in states {
            let (scope, errors) = state.into_parts();
            fresh.entry(scope).or_default().extend(errors);
        }

        let written: BTreeSet<ErrorScope> = fresh.keys().copied().collect();
        let previous = self.produced.insert(source.into(), written).unwrap_or_default();
        for scope in previous {
            fresh.entry(scope).or_default();
        }

        let mut changed = Vec::new();
        for (scope, errors) in fresh {
            let current = self.scopes.get(&scope).map_or(&[][..], Vec::as_slice);
            if current == errors.as_slice() {
                continue;
            }
            if errors.is_empty() {
                self.scopes.remove(&scope);
            } else {
                self.scopes.insert(scope, errors);
            }
            changed.push(scope);
        }
        changed
    }

    /// Errors currently shown for one scope.
    #[must_use]
    pub fn errors_for(&self, scope: ErrorScope) -> Vec<String> {
        self.scopes.get(&scope).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn property_errors(&self, property: PropertyName) -> Vec<String> {
        self.errors_for(ErrorScope::Property(property))
    }

    #[must_use]
    pub fn entity_errors(&self) -> Vec<String> {
        self.errors_for(ErrorScope::Entity)
    }

    /// Properties that currently have at least one error.
    #[must_use]
    pub fn invalid_properties(&self) -> Vec<PropertyName> {
        self.scopes
            .keys()
            .filter_map(|scope| match scope {
                ErrorScope::Property(p) => Some(*p),
                ErrorScope::Entity => None,
            })
            .collect()
    }

    /// True iff no property and no entity error is present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn clear(&mut self) {
        self.scopes.clear();
        self.produced.clear();
    }
}
