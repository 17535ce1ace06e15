#![forbid(unsafe_code)]

//! Guarded commands.
//!
//! - [`Command`]: synchronous; runs its action only while `can_execute()`.
//! - [`AsyncCommand`]: spawns a cancellable action, single-flight, with
//!   guaranteed cleanup after every run.
//!
//! Both expose an executability-changed channel that the owning view-model
//! fires whenever one of the command's declared dependencies is notified, and
//! both implement [`NotifyCommand`] so a UI layer can treat them alike.
//!
//! # Invariants
//!
//! - `execute()` on a disabled command is a no-op returning `false`.
//! - An async command accepts `execute()` only in [`CommandState::Idle`].
//! - Every accepted async run ends in `Idle` with a fresh cancellation scope,
//!   whatever way the action exits.

pub mod async_command;
pub mod fault;
pub mod spawn;
pub mod sync;

pub use async_command::{AsyncCommand, CommandState, RunOutcome};
pub use fault::CommandFault;
pub use spawn::{TaskSpawner, TokioLocalSpawner};
pub use sync::Command;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::event::Subscription;

static NEXT_COMMAND_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_command_id() -> u64 {
    NEXT_COMMAND_ID.fetch_add(1, Ordering::Relaxed)
}

/// The surface a UI layer binds to.
pub trait NotifyCommand {
    /// Whether `execute()` would currently be accepted.
    fn can_execute(&self) -> bool;

    /// Run (or start) the command. Returns whether it was accepted.
    fn execute(&self) -> bool;

    /// Listen for changes of `can_execute()`.
    fn subscribe_can_execute_changed(&self, callback: Box<dyn Fn()>) -> Subscription;
}

/// Receiver of executability-changed requests from the owning view-model.
pub(crate) trait ExecutabilityNotifier {
    fn raise_can_execute_changed(&self);
}

/// Bookkeeping of in-flight async runs, implemented by the view-model core.
pub(crate) trait OperationTracker {
    fn enter_operation(&self);
    fn exit_operation(&self);
}
