#![forbid(unsafe_code)]

//! Where async command runs are executed.

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

/// Executes async command runs on the view-model's owner thread.
pub trait TaskSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Spawns with [`tokio::task::spawn_local`].
///
/// # Panics
///
/// `spawn` panics when called outside a `tokio::task::LocalSet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLocalSpawner;

impl TaskSpawner for TokioLocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        // Detached: completion is observed through command state.
        drop(tokio::task::spawn_local(task));
    }
}

impl TaskSpawner for futures::executor::LocalSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        // A failed spawn drops the task, and the run guard inside it restores
        // the command to idle.
        if let Err(err) = self.spawn_local(task) {
            tracing::error!(message = "spawn.failed", error = %err);
        }
    }
}
