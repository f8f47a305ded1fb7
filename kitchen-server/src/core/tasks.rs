//! Background task management
//!
//! [`BackgroundTasks`] owns the join handles and the shared shutdown token.
//! [`TaskRegistry`] is the cloneable side: it records what each task is
//! doing so `/health` can report a sync loop that died.
//!
//! # Task kinds
//!
//! - [`TaskKind::Worker`] - long-running worker (the sync loop)
//! - [`TaskKind::Listener`] - reacts to upstream changes (the fleet view)
//! - [`TaskKind::Periodic`] - timer-driven housekeeping (log cleanup)

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Worker,
    Listener,
    Periodic,
}

/// Lifecycle of one registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    /// Returned after shutdown was requested
    Stopped,
    /// Returned on its own while the server was still up
    Exited,
    Panicked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub name: &'static str,
    pub kind: TaskKind,
    pub status: TaskStatus,
}

/// Shared view of every registered task's status
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    reports: Arc<Mutex<Vec<TaskReport>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TaskReport>> {
        self.reports.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, name: &'static str, kind: TaskKind) -> usize {
        let mut reports = self.lock();
        reports.push(TaskReport {
            name,
            kind,
            status: TaskStatus::Running,
        });
        reports.len() - 1
    }

    fn set_status(&self, index: usize, status: TaskStatus) {
        if let Some(report) = self.lock().get_mut(index) {
            report.status = status;
        }
    }

    pub fn reports(&self) -> Vec<TaskReport> {
        self.lock().clone()
    }

    /// Tasks that are no longer running
    pub fn failed(&self) -> Vec<TaskReport> {
        self.lock()
            .iter()
            .filter(|r| r.status != TaskStatus::Running)
            .cloned()
            .collect()
    }
}

/// Background task manager
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new(registry);
/// let token = tasks.shutdown_token();
/// tasks.spawn("sync_loop", TaskKind::Worker, sync_loop.run());
/// tasks.spawn("fleet_view", TaskKind::Listener, fleet.run(token));
///
/// tasks.shutdown().await;
/// ```
pub struct BackgroundTasks {
    registry: TaskRegistry,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new(registry: TaskRegistry) -> Self {
        Self {
            registry,
            handles: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token tasks listen on for the shutdown signal
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register and start a background task
    ///
    /// A panic is caught and recorded as [`TaskStatus::Panicked`].
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let index = self.registry.register(name, kind);
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();

        let handle = tokio::spawn(async move {
            let status = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if shutdown.is_cancelled() => TaskStatus::Stopped,
                Ok(()) => {
                    tracing::warn!(task = name, ?kind, "Background task exited before shutdown");
                    TaskStatus::Exited
                }
                Err(panic) => {
                    tracing::error!(
                        task = name,
                        ?kind,
                        panic = %panic_message(panic.as_ref()),
                        "Background task panicked"
                    );
                    TaskStatus::Panicked
                }
            };
            registry.set_status(index, status);
        });

        tracing::debug!(task = name, ?kind, "Registered background task");
        self.handles.push((name, handle));
    }

    pub fn log_summary(&self) {
        let reports = self.registry.reports();
        let count = |kind| reports.iter().filter(|r| r.kind == kind).count();
        tracing::info!(
            total = reports.len(),
            workers = count(TaskKind::Worker),
            listeners = count(TaskKind::Listener),
            periodic = count(TaskKind::Periodic),
            "Background tasks registered"
        );
    }

    /// Cancel every task and wait for all of them to return
    pub async fn shutdown(self) {
        tracing::info!(tasks = self.handles.len(), "Shutting down background tasks");
        self.shutdown.cancel();

        for (name, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(task = name, error = ?e, "Task join failed");
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
