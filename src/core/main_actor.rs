//! The main domain: one serial context on one thread.
//!
//! Code running there receives a [`MainToken`]. The token is `!Send`, so it
//! cannot be smuggled into an actor or a detached task:
//!
//! ```compile_fail
//! use isolation_lab::core::main_actor::MainToken;
//! fn leak(token: MainToken) {
//!     std::thread::spawn(move || drop(token));
//! }
//! ```
//!
//! Nor can it be carried out of [`Runtime::run_main`]:
//!
//! ```compile_fail
//! use isolation_lab::{Runtime, RuntimeConfig};
//! async fn escape(runtime: Runtime) {
//!     let _token = runtime.run_main(|token| async move { token }).await;
//! }
//! ```
//!
//! A token stashed some other way goes stale when main exits: every
//! `Isolated` check and [`MainToken::spawn`] then fail with
//! `LabError::DomainExited`.
//!
//! Other domains reach main through a [`MainHandle`], which is Sendable.

use crate::core::domain::{sealed, DomainId, ExecutionDomain};
use crate::core::runtime::Runtime;
use crate::utils::error::{LabError, Result};
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::task::LocalSet;

/// 每次進入 main 都是新的 incarnation，跨 Runtime 也不重複
static NEXT_MAIN_INCARNATION: AtomicU64 = AtomicU64::new(1);

type MainJob = Box<dyn FnOnce(&MainToken) + Send>;

#[derive(Clone, Debug)]
pub struct MainHandle {
    tx: mpsc::Sender<MainJob>,
}

impl MainHandle {
    /// Hops onto main, runs `f` there and hands the result back.
    pub async fn run<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&MainToken) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: MainJob = Box::new(move |token| {
            let _ = tx.send(f(token));
        });
        self.tx.send(job).await.map_err(|_| closed())?;
        rx.await.map_err(|_| closed())
    }

    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }
}

fn closed() -> LabError {
    LabError::MailboxClosed {
        actor: DomainId::Main.to_string(),
    }
}

struct MainSession {
    incarnation: u64,
    live: Cell<bool>,
}

/// Proof of running on main. `Rc` keeps it `!Send` and `!Sync`.
#[derive(Clone)]
pub struct MainToken {
    handle: MainHandle,
    runtime: Runtime,
    session: Rc<MainSession>,
}

impl MainToken {
    /// False once the main domain that issued this token has exited.
    pub fn is_live(&self) -> bool {
        self.session.live.get()
    }

    pub fn handle(&self) -> MainHandle {
        self.handle.clone()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl sealed::Sealed for MainToken {
    fn incarnation(&self) -> Option<u64> {
        self.is_live().then_some(self.session.incarnation)
    }
}

impl ExecutionDomain for MainToken {
    fn domain_id(&self) -> DomainId {
        DomainId::Main
    }
}

impl std::fmt::Debug for MainToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainToken").finish_non_exhaustive()
    }
}

/// Ends the session and frees the runtime's main slot, also on panic.
struct SessionGuard {
    session: Rc<MainSession>,
    runtime: Runtime,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.live.set(false);
        self.runtime.release_main();
    }
}

pub(crate) async fn enter<F, Fut>(runtime: Runtime, f: F) -> Result<Fut::Output>
where
    F: FnOnce(MainToken) -> Fut,
    Fut: Future,
    Fut::Output: Send,
{
    runtime.claim_main()?;
    let session = Rc::new(MainSession {
        incarnation: NEXT_MAIN_INCARNATION.fetch_add(1, Ordering::Relaxed),
        live: Cell::new(true),
    });
    let _guard = SessionGuard {
        session: Rc::clone(&session),
        runtime: runtime.clone(),
    };

    let capacity = runtime.config().main_queue_capacity.max(1);
    let (tx, mut rx) = mpsc::channel::<MainJob>(capacity);
    let token = MainToken {
        handle: MainHandle { tx },
        runtime,
        session,
    };
    let loop_token = token.clone();

    tracing::debug!("🏠 Entering main domain #{}", token.session.incarnation);
    let local = LocalSet::new();
    let output = local
        .run_until(async move {
            tokio::task::spawn_local(async move {
                while let Some(job) = rx.recv().await {
                    job(&loop_token);
                }
            });
            f(token).await
        })
        .await;
    tracing::debug!("🏠 Leaving main domain");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::isolated::Isolated;
    use crate::core::runtime::RuntimeConfig;
    use std::cell::RefCell;

    #[tokio::test]
    async fn test_handle_runs_jobs_on_main() {
        let runtime = Runtime::new(RuntimeConfig::default());

        let domain = runtime
            .run_main(|token| async move {
                let handle = token.handle();
                // 從另一個 domain 跳回 main
                tokio::spawn(async move { handle.run(|main| main.domain_id()).await })
                    .await
                    .unwrap()
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(domain, DomainId::Main);
    }

    #[tokio::test]
    async fn test_handle_fails_after_main_exits() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let handle = runtime
            .run_main(|token| async move { token.handle() })
            .await
            .unwrap();

        let err = handle.run(|_| ()).await.unwrap_err();
        assert!(matches!(err, LabError::MailboxClosed { .. }));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_stashed_token_goes_stale_after_exit() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let stash: RefCell<Option<MainToken>> = RefCell::new(None);

        let value = runtime
            .run_main(|token| {
                stash.replace(Some(token.clone()));
                async move { Isolated::new(5u32, &token) }
            })
            .await
            .unwrap();

        let token = stash.take().unwrap();
        assert!(!token.is_live());

        let err = value.with_mut(&token, |v| *v += 1).unwrap_err();
        assert!(matches!(err, LabError::DomainExited { domain: DomainId::Main }));

        let err = token.spawn(|_| async {}).unwrap_err();
        assert!(matches!(err, LabError::DomainExited { .. }));
    }

    #[tokio::test]
    async fn test_main_cannot_be_entered_twice() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let inner = runtime.clone();

        let nested = runtime
            .run_main(|_| async move { inner.run_main(|_| async {}).await })
            .await
            .unwrap();
        assert!(matches!(nested, Err(LabError::MainAlreadyActive)));

        // 離開之後可以再次進入
        assert!(runtime.run_main(|_| async {}).await.is_ok());
    }

    #[tokio::test]
    async fn test_each_entry_is_a_new_incarnation() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let first = runtime
            .run_main(|token| async move { Isolated::new(1u8, &token) })
            .await
            .unwrap();

        let err = runtime
            .run_main(|token| async move { first.with(&token, |v| *v) })
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, LabError::IsolationViolation { .. }));
    }
}
