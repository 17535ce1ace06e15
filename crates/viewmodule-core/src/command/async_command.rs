#![forbid(unsafe_code)]

//! Single-flight, cancellable async commands.
//!
//! An accepted `execute()` moves the command to [`CommandState::Running`],
//! hands the action a [`CancelToken`] of the current scope and spawns the
//! resulting future through the configured [`TaskSpawner`]. However the run
//! ends (completion, cancellation, fault, panic, or the task being dropped
//! unpolled) a run guard performs the cleanup:
//!
//! 1. deliver a real fault to the fault handler (cancellation is absorbed),
//! 2. dispose the run's cancel source and install a fresh one,
//! 3. record the outcome and return to [`CommandState::Idle`],
//! 4. lower the owner's in-flight counter,
//! 5. fire executability-changed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::rc::{Rc, Weak};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::cancel::{CancelSource, CancelToken};
use crate::event::{EventChannel, Subscription};

use super::fault::CommandFault;
use super::spawn::TaskSpawner;
use super::{ExecutabilityNotifier, NotifyCommand, OperationTracker, next_command_id};

type Action = Box<dyn Fn(CancelToken) -> LocalBoxFuture<'static, Result<(), CommandFault>>>;
type FaultHandler = Box<dyn Fn(&CommandFault)>;

/// Lifecycle of an async command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandState {
    Idle,
    Running,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Faulted,
}

impl RunOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Faulted => "faulted",
        }
    }
}

pub(crate) struct AsyncParts {
    pub(crate) action: Action,
    pub(crate) can_execute: Box<dyn Fn() -> bool>,
    pub(crate) on_fault: Option<FaultHandler>,
    pub(crate) spawner: Rc<dyn TaskSpawner>,
    pub(crate) tracker: Option<Weak<dyn OperationTracker>>,
}

pub(crate) fn box_action<F, Fut>(action: F) -> Action
where
    F: Fn(CancelToken) -> Fut + 'static,
    Fut: Future<Output = Result<(), CommandFault>> + 'static,
{
    Box::new(move |token| action(token).boxed_local())
}

pub(crate) struct AsyncInner {
    id: u64,
    action: Action,
    can_execute: Box<dyn Fn() -> bool>,
    on_fault: Option<FaultHandler>,
    state: Cell<CommandState>,
    last_outcome: Cell<Option<RunOutcome>>,
    runs: Cell<u64>,
    source: RefCell<CancelSource>,
    can_execute_changed: EventChannel<()>,
    spawner: Rc<dyn TaskSpawner>,
    tracker: Option<Weak<dyn OperationTracker>>,
}

impl AsyncInner {
    fn tracker(&self) -> Option<Rc<dyn OperationTracker>> {
        self.tracker.as_ref().and_then(Weak::upgrade)
    }

    fn report_fault(&self, fault: &CommandFault) {
        tracing::warn!(message = "command.fault", command_id = self.id, error = %fault);
        if let Some(handler) = &self.on_fault {
            handler(fault);
        }
    }
}

impl ExecutabilityNotifier for AsyncInner {
    fn raise_can_execute_changed(&self) {
        self.can_execute_changed.emit(&());
    }
}

/// Cleanup of one run. Dropping an unfinished guard ends the run as
/// cancelled.
struct RunGuard {
    inner: Rc<AsyncInner>,
    run: u64,
    finished: bool,
}

impl RunGuard {
    fn finish(&mut self, outcome: RunOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        let inner = &self.inner;

        let old = inner.source.replace(CancelSource::new());
        old.dispose();
        inner.last_outcome.set(Some(outcome));
        inner.state.set(CommandState::Idle);
        tracing::debug!(
            message = "command.finish",
            command_id = inner.id,
            run = self.run,
            outcome = outcome.as_str()
        );

        if let Some(tracker) = inner.tracker() {
            tracker.exit_operation();
        }
        inner.raise_can_execute_changed();
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.finish(RunOutcome::Cancelled);
    }
}

/// An asynchronous command with cooperative cancellation.
///
/// Cloning creates another handle to the same command. A spawned run keeps
/// the command alive until its cleanup has completed.
#[derive(Clone)]
pub struct AsyncCommand {
    inner: Rc<AsyncInner>,
}

impl fmt::Debug for AsyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncCommand")
            .field("id", &self.inner.id)
            .field("state", &self.inner.state.get())
            .field("runs", &self.inner.runs.get())
            .field("last_outcome", &self.inner.last_outcome.get())
            .finish_non_exhaustive()
    }
}

impl AsyncCommand {
    /// Standalone, always-enabled command.
    pub fn new<F, Fut>(spawner: Rc<dyn TaskSpawner>, action: F) -> Self
    where
        F: Fn(CancelToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandFault>> + 'static,
    {
        Self::checked(spawner, action, || true, None::<fn(&CommandFault)>)
    }

    /// Standalone command with an executability predicate and an optional
    /// fault handler. Not linked to any view-model, so executability-changed
    /// only fires around runs or through
    /// [`raise_can_execute_changed`](Self::raise_can_execute_changed).
    pub fn checked<F, Fut, H>(
        spawner: Rc<dyn TaskSpawner>,
        action: F,
        can_execute: impl Fn() -> bool + 'static,
        on_fault: Option<H>,
    ) -> Self
    where
        F: Fn(CancelToken) -> Fut + 'static,
        Fut: Future<Output = Result<(), CommandFault>> + 'static,
        H: Fn(&CommandFault) + 'static,
    {
        Self::from_parts(AsyncParts {
            action: box_action(action),
            can_execute: Box::new(can_execute),
            on_fault: on_fault.map(|h| Box::new(h) as FaultHandler),
            spawner,
            tracker: None,
        })
    }

    pub(crate) fn from_parts(parts: AsyncParts) -> Self {
        Self {
            inner: Rc::new(AsyncInner {
                id: next_command_id(),
                action: parts.action,
                can_execute: parts.can_execute,
                on_fault: parts.on_fault,
                state: Cell::new(CommandState::Idle),
                last_outcome: Cell::new(None),
                runs: Cell::new(0),
                source: RefCell::new(CancelSource::new()),
                can_execute_changed: EventChannel::new(),
                spawner: parts.spawner,
                tracker: parts.tracker,
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// True when idle and the predicate allows it.
    #[must_use]
    pub fn can_execute(&self) -> bool {
        self.inner.state.get() == CommandState::Idle && (self.inner.can_execute)()
    }

    /// Start a run. Returns `false` (and does nothing) while a run is in
    /// flight or the predicate rejects.
    pub fn execute(&self) -> bool {
        let inner = &self.inner;
        if inner.state.get() == CommandState::Running {
            tracing::debug!(
                message = "command.rejected",
                command_id = inner.id,
                reason = "in_flight"
            );
            return false;
        }
        if !(inner.can_execute)() {
            tracing::debug!(
                message = "command.rejected",
                command_id = inner.id,
                reason = "disabled"
            );
            return false;
        }

        let run = inner.runs.get() + 1;
        inner.runs.set(run);
        inner.state.set(CommandState::Running);
        let token = inner.source.borrow().token();
        tracing::debug!(
            message = "command.start",
            command_id = inner.id,
            run,
            scope_id = token.id()
        );

        if let Some(tracker) = inner.tracker() {
            tracker.enter_operation();
        }
        inner.raise_can_execute_changed();

        let mut guard = RunGuard {
            inner: Rc::clone(inner),
            run,
            finished: false,
        };
        let action = AssertUnwindSafe(|| (inner.action)(token));
        let fut = match std::panic::catch_unwind(action) {
            Ok(fut) => fut,
            Err(payload) => {
                inner.report_fault(&CommandFault::from_panic(payload));
                guard.finish(RunOutcome::Faulted);
                return true;
            }
        };

        let task = async move {
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => RunOutcome::Completed,
                Ok(Err(fault)) if fault.is_cancellation() => RunOutcome::Cancelled,
                Ok(Err(fault)) => {
                    guard.inner.report_fault(&fault);
                    RunOutcome::Faulted
                }
                Err(payload) => {
                    guard.inner.report_fault(&CommandFault::from_panic(payload));
                    RunOutcome::Faulted
                }
            };
            guard.finish(outcome);
        };
        inner.spawner.spawn(task.boxed_local());
        true
    }

    /// Request cancellation of the in-flight run. Returns `false` when idle;
    /// the next run's scope is never affected.
    pub fn cancel(&self) -> bool {
        if self.inner.state.get() != CommandState::Running {
            tracing::trace!(message = "cancel.ignored", command_id = self.inner.id);
            return false;
        }
        self.inner.source.borrow().cancel();
        true
    }

    /// Token of the current scope: the running one, or the one the next run
    /// will receive.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.inner.source.borrow().token()
    }

    #[must_use]
    pub fn state(&self) -> CommandState {
        self.inner.state.get()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == CommandState::Running
    }

    /// Outcome of the most recent finished run.
    #[must_use]
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.inner.last_outcome.get()
    }

    /// Number of accepted runs.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.inner.runs.get()
    }

    pub fn subscribe_can_execute_changed(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.can_execute_changed.subscribe(move |()| callback())
    }

    pub fn raise_can_execute_changed(&self) {
        self.inner.raise_can_execute_changed();
    }

    pub(crate) fn notifier(&self) -> Weak<dyn ExecutabilityNotifier> {
        let weak: Weak<AsyncInner> = Rc::downgrade(&self.inner);
        weak
    }
}

impl NotifyCommand for AsyncCommand {
    fn can_execute(&self) -> bool {
        AsyncCommand::can_execute(self)
    }

    fn execute(&self) -> bool {
        AsyncCommand::execute(self)
    }

    fn subscribe_can_execute_changed(&self, callback: Box<dyn Fn()>) -> Subscription {
        AsyncCommand::subscribe_can_execute_changed(self, callback)
    }
}
