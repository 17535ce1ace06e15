#![forbid(unsafe_code)]

//! A scripted session against [`HelloWorldViewModel`].
//!
//! Must run inside a [`tokio::task::LocalSet`]: greetings are local tasks.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::Notify;
use viewmodule_core::RunOutcome;

use crate::cli::Opts;
use crate::error::Result;
use crate::hello_world::{GreetSettings, HelloWorldViewModel};

/// What happened during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub full_name: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub outcomes: Vec<RunOutcome>,
    pub messages: Vec<String>,
    /// Property-changed notifications observed.
    pub notifications: usize,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name: {}", self.full_name)?;
        if !self.valid {
            writeln!(f, "cannot greet:")?;
            for error in &self.errors {
                writeln!(f, "  {error}")?;
            }
        }
        for (i, outcome) in self.outcomes.iter().enumerate() {
            writeln!(f, "run {}: {}", i + 1, outcome.as_str())?;
        }
        for message in &self.messages {
            writeln!(f, "> {message}")?;
        }
        Ok(())
    }
}

/// Wait until `say_hello` is idle. Every executability change wakes the
/// waiter; permits left over from earlier changes only cause a recheck.
async fn until_idle(vm: &HelloWorldViewModel, wake: &Notify) {
    while vm.say_hello().is_running() {
        wake.notified().await;
    }
}

/// Enter the names from `opts`, greet once, and optionally start a second
/// greeting and cancel it.
///
/// # Errors
///
/// Only view-model wiring errors; greeting failures are part of the report.
pub async fn run(opts: &Opts) -> Result<SessionReport> {
    let vm = HelloWorldViewModel::new(GreetSettings {
        delay: opts.delay(),
        fail: opts.fail,
    })?;

    let notifications = Rc::new(Cell::new(0usize));
    let _changes = {
        let count = Rc::clone(&notifications);
        vm.core().subscribe_property_changed(move |name| {
            count.set(count.get() + 1);
            tracing::debug!(message = "property.changed", property = %name);
        })
    };
    let wake = Rc::new(Notify::new());
    let _idle = {
        let wake = Rc::clone(&wake);
        vm.say_hello()
            .subscribe_can_execute_changed(move || wake.notify_one())
    };

    if let Some(first) = &opts.first {
        vm.set_first_name(first.as_str());
    }
    if let Some(last) = &opts.last {
        vm.set_last_name(last.as_str());
    }

    let mut outcomes = Vec::new();
    let valid = vm.core().is_valid();
    if valid {
        tracing::info!(message = "session.greet", name = %vm.full_name());
        if vm.say_hello().execute() {
            until_idle(&vm, &wake).await;
            outcomes.extend(vm.say_hello().last_outcome());
        }

        if let Some(after) = opts.cancel_after()
            && vm.say_hello().execute()
        {
            tokio::time::sleep(after).await;
            if vm.cancel().execute() {
                tracing::info!(message = "session.cancel", after = ?after);
            }
            until_idle(&vm, &wake).await;
            outcomes.extend(vm.say_hello().last_outcome());
        }
    } else {
        tracing::warn!(message = "session.invalid", errors = vm.error_summary().len());
    }

    Ok(SessionReport {
        full_name: vm.full_name(),
        valid,
        errors: vm.error_summary(),
        outcomes,
        messages: vm.messages(),
        notifications: notifications.get(),
    })
}
