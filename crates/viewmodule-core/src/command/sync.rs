#![forbid(unsafe_code)]

//! Synchronous guarded commands.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::event::{EventChannel, Subscription};

use super::{ExecutabilityNotifier, NotifyCommand, next_command_id};

pub(crate) struct SyncInner {
    id: u64,
    action: Box<dyn Fn()>,
    can_execute: Box<dyn Fn() -> bool>,
    can_execute_changed: EventChannel<()>,
}

impl ExecutabilityNotifier for SyncInner {
    fn raise_can_execute_changed(&self) {
        self.can_execute_changed.emit(&());
    }
}

/// A command whose action runs immediately when enabled.
///
/// Cloning creates another handle to the same command.
#[derive(Clone)]
pub struct Command {
    inner: Rc<SyncInner>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// Always-enabled command.
    pub fn new(action: impl Fn() + 'static) -> Self {
        Self::checked(action, || true)
    }

    /// Command enabled while `can_execute` returns true. Pair it with a
    /// view-model via
    /// [`ViewModelCore::command_sync_checked`](crate::ViewModelCore::command_sync_checked)
    /// to have executability-changed fire on dependency changes.
    pub fn checked(action: impl Fn() + 'static, can_execute: impl Fn() -> bool + 'static) -> Self {
        Self {
            inner: Rc::new(SyncInner {
                id: next_command_id(),
                action: Box::new(action),
                can_execute: Box::new(can_execute),
                can_execute_changed: EventChannel::new(),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn can_execute(&self) -> bool {
        (self.inner.can_execute)()
    }

    /// Run the action if enabled. Never fails for a disabled command.
    pub fn execute(&self) -> bool {
        if !self.can_execute() {
            tracing::debug!(
                message = "command.rejected",
                command_id = self.inner.id,
                reason = "disabled"
            );
            return false;
        }
        tracing::trace!(message = "command.execute", command_id = self.inner.id);
        (self.inner.action)();
        true
    }

    pub fn subscribe_can_execute_changed(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.can_execute_changed.subscribe(move |()| callback())
    }

    /// Ask subscribers to re-query `can_execute()`.
    pub fn raise_can_execute_changed(&self) {
        self.inner.raise_can_execute_changed();
    }

    pub(crate) fn notifier(&self) -> Weak<dyn ExecutabilityNotifier> {
        let weak: Weak<SyncInner> = Rc::downgrade(&self.inner);
        weak
    }
}

impl NotifyCommand for Command {
    fn can_execute(&self) -> bool {
        Command::can_execute(self)
    }

    fn execute(&self) -> bool {
        Command::execute(self)
    }

    fn subscribe_can_execute_changed(&self, callback: Box<dyn Fn()>) -> Subscription {
        Command::subscribe_can_execute_changed(self, callback)
    }
}
