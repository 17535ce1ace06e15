#![forbid(unsafe_code)]

//! Stable property identifiers.
//!
//! A [`PropertyName`] is a `Copy` symbol wrapping a `&'static str`. View-models
//! declare their names as constants once and refer to them everywhere else, so
//! dependency declarations never carry free-form runtime strings.

use std::fmt;

/// Identifier of a logical property on a view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropertyName(&'static str);

impl PropertyName {
    /// Create a property name from a static symbol.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The underlying symbol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

/// Aggregate validity flag maintained by every view-model.
pub const IS_VALID: PropertyName = PropertyName::new("is_valid");

/// True while at least one async command of the view-model is running.
pub const OPERATION_EXECUTING: PropertyName = PropertyName::new("operation_executing");
