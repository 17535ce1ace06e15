#![forbid(unsafe_code)]

//! Core: observable cells, dependency propagation, guarded commands, and
//! validation for reactive view-models.
//!
//! A view-model is declared with a [`ViewModelBuilder`]: backing cells,
//! computed property names and the edges between them, cell validators and
//! validation hooks. [`ViewModelBuilder::build`] freezes the declaration into
//! a [`ViewModelCore`], which re-notifies dependents in topological order
//! whenever a cell changes and keeps [`IS_VALID`] and
//! [`OPERATION_EXECUTING`] current.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Async commands run as
//! local tasks on the owner thread; see [`TaskSpawner`].

pub mod cancel;
pub mod command;
pub mod error;
pub mod event;
pub mod graph;
pub mod property;
pub mod reactive;
pub mod validation;
pub mod viewmodel;

pub use cancel::{CancelSource, CancelToken, Cancelled};
pub use command::{
    AsyncCommand, Command, CommandFault, CommandState, NotifyCommand, RunOutcome, TaskSpawner,
    TokioLocalSpawner,
};
pub use error::{GraphError, Result};
pub use event::{EventChannel, Subscription};
pub use graph::{DependencyGraph, DependencyGraphBuilder};
pub use property::{IS_VALID, OPERATION_EXECUTING, PropertyName};
pub use reactive::{Computed, ObservableCell, Tracked};
pub use validation::{
    ErrorScope, ErrorTable, ValidationSource, ValidationState, Validator, greater_than, in_range,
    less_than, max_length, min_length, not_blank, not_equal,
};
pub use viewmodel::{ViewModelBuilder, ViewModelConfig, ViewModelCore};
