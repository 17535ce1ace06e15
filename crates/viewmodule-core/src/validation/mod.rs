#![forbid(unsafe_code)]

//! Validation: composable rule chains and error aggregation.

pub mod rules;
pub mod state;

pub use rules::{
    Validator, greater_than, in_range, less_than, max_length, min_length, not_blank, not_equal,
};
pub use state::{ErrorScope, ErrorTable, ValidationSource, ValidationState};
