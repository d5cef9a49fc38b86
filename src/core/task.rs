//! Where a new unit of work runs.
//!
//! Inheritance is decided explicitly by [`resolve_placement`] instead of by
//! looking at what a closure happens to capture:
//!
//! - work created on main inherits main, because main is unique;
//! - work created in an actor that captures the actor's handle is *mediated*:
//!   it runs on its own, and every touch of the actor goes back through the
//!   handle and is checked against the actor's domain at that point;
//! - everything else is independent and runs nonisolated.
//!
//! A detached task cannot borrow the actor's context, so it cannot act as if
//! it were still inside the actor:
//!
//! ```compile_fail
//! use isolation_lab::core::actor::{Actor, Context};
//! struct Probe;
//! impl Actor for Probe {}
//! fn leak(cx: &Context<Probe>) {
//!     cx.spawn_detached(|_| async move { let _ = cx.id(); });
//! }
//! ```

use crate::core::actor::{Actor, ActorRef, Context};
use crate::core::domain::{DomainId, ExecutionDomain, Nonisolated};
use crate::core::main_actor::MainToken;
use crate::utils::error::{LabError, Result};
use serde::Serialize;
use std::future::Future;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPlacement {
    /// Runs inside the creator's domain.
    Inherited(DomainId),
    /// Runs independently; reaches the named actor only through its handle.
    Mediated(DomainId),
    Independent,
}

impl TaskPlacement {
    /// The domain the task body itself executes in.
    pub fn execution_domain(&self) -> DomainId {
        match self {
            TaskPlacement::Inherited(domain) => *domain,
            TaskPlacement::Mediated(_) | TaskPlacement::Independent => DomainId::Nonisolated,
        }
    }

    pub fn inherits(&self, domain: DomainId) -> bool {
        matches!(self, TaskPlacement::Inherited(d) if *d == domain)
    }
}

pub fn resolve_placement(creator: DomainId, captures_owner: bool) -> TaskPlacement {
    if creator.is_globally_unique() {
        return TaskPlacement::Inherited(creator);
    }
    match creator {
        DomainId::Actor(_) if captures_owner => TaskPlacement::Mediated(creator),
        _ => TaskPlacement::Independent,
    }
}

#[derive(Debug)]
pub struct TaskHandle<T> {
    placement: TaskPlacement,
    join: JoinHandle<T>,
}

impl<T> TaskHandle<T> {
    pub fn placement(&self) -> TaskPlacement {
        self.placement
    }

    pub fn domain(&self) -> DomainId {
        self.placement.execution_domain()
    }

    pub fn abort(&self) {
        self.join.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn join(self) -> Result<T> {
        self.join.await.map_err(|e| LabError::TaskFailed {
            message: if e.is_cancelled() {
                "task was aborted".to_string()
            } else {
                format!("task panicked: {}", e)
            },
        })
    }
}

/// Runs `f` outside every domain.
pub fn spawn_detached<F, Fut>(f: F) -> TaskHandle<Fut::Output>
where
    F: FnOnce(Nonisolated) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    TaskHandle {
        placement: TaskPlacement::Independent,
        join: tokio::spawn(f(Nonisolated::new())),
    }
}

impl MainToken {
    /// Spawns work that inherits main. The future may hold `!Send` state.
    /// Fails with `DomainExited` once the main domain behind this token is gone.
    pub fn spawn<F, Fut>(&self, f: F) -> Result<TaskHandle<Fut::Output>>
    where
        F: FnOnce(MainToken) -> Fut,
        Fut: Future + 'static,
        Fut::Output: 'static,
    {
        if !self.is_live() {
            return Err(LabError::DomainExited {
                domain: self.domain_id(),
            });
        }
        let placement = resolve_placement(self.domain_id(), false);
        Ok(TaskHandle {
            placement,
            join: tokio::task::spawn_local(f(self.clone())),
        })
    }
}

impl<A: Actor> Context<A> {
    /// Spawns work that does not inherit this actor's domain.
    pub fn spawn_detached<F, Fut>(&self, f: F) -> TaskHandle<Fut::Output>
    where
        F: FnOnce(Nonisolated) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        tracing::trace!("🧵 {} spawned an independent task", self.domain_id());
        spawn_detached(f)
    }

    /// Spawns work that captures this actor's handle. Every use of the handle
    /// inside `f` runs back in the actor's domain.
    pub fn spawn_capturing<F, Fut>(&self, f: F) -> Result<TaskHandle<Fut::Output>>
    where
        F: FnOnce(ActorRef<A>) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let closed = || LabError::MailboxClosed {
            actor: format!("{} ({})", self.name, self.id),
        };
        if self.is_stopping() {
            return Err(closed());
        }
        let myself = self.myself().ok_or_else(closed)?;
        let placement = resolve_placement(self.domain_id(), true);
        tracing::trace!("🧵 {} spawned a mediated task", self.domain_id());
        Ok(TaskHandle {
            placement,
            join: tokio::spawn(f(myself)),
        })
    }
}
