use crate::core::actor::{self, Actor, ActorRef};
use crate::core::domain::ActorId;
use crate::core::main_actor;
use crate::core::main_actor::MainToken;
use crate::core::transfer::TransferLog;
use crate::utils::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

fn default_capacity() -> usize {
    64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// 每個 actor 信箱的容量，滿了之後呼叫端會被暫停
    #[serde(default = "default_capacity")]
    pub mailbox_capacity: usize,
    #[serde(default = "default_capacity")]
    pub main_queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_capacity(),
            main_queue_capacity: default_capacity(),
        }
    }
}

/// Actor ids are process-wide so that two runtimes never hand out the same
/// domain.
static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

struct RuntimeInner {
    config: RuntimeConfig,
    actors_spawned: AtomicU64,
    main_active: AtomicBool,
    transfers: TransferLog,
}

/// Owner of actor ids, the transfer log and the entry point into main.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                config,
                actors_spawned: AtomicU64::new(0),
                main_active: AtomicBool::new(false),
                transfers: TransferLog::new(),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub fn transfer_log(&self) -> &TransferLog {
        &self.inner.transfers
    }

    pub fn actors_spawned(&self) -> u64 {
        self.inner.actors_spawned.load(Ordering::Relaxed)
    }

    /// Starts `actor` in a fresh domain. Must be called inside a tokio runtime.
    pub fn spawn_actor<A: Actor>(&self, actor: A) -> ActorRef<A> {
        let id = ActorId(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed));
        self.inner.actors_spawned.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("🧩 Spawning {} as {}", actor.name(), id);
        actor::start(actor, id, self.clone())
    }

    /// Enters the main domain on the current thread and runs `f` there.
    ///
    /// The main domain lives until `f`'s future completes. Main-inherited
    /// tasks still pending at that point are dropped. Fails with
    /// `MainAlreadyActive` while another `run_main` of this runtime is running.
    pub async fn run_main<F, Fut>(&self, f: F) -> Result<Fut::Output>
    where
        F: FnOnce(MainToken) -> Fut,
        Fut: Future,
        Fut::Output: Send,
    {
        main_actor::enter(self.clone(), f).await
    }

    pub(crate) fn claim_main(&self) -> Result<()> {
        self.inner
            .main_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| LabError::MainAlreadyActive)
    }

    pub(crate) fn release_main(&self) {
        self.inner.main_active.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("actors_spawned", &self.actors_spawned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Idle;

    impl Actor for Idle {}

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: RuntimeConfig = toml::from_str("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(config.mailbox_capacity, 64);
    }

    #[tokio::test]
    async fn test_actor_ids_are_unique() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let first = runtime.spawn_actor(Idle);
        let second = runtime.spawn_actor(Idle);

        assert_ne!(first.id(), second.id());
        assert_eq!(runtime.actors_spawned(), 2);
    }

    #[tokio::test]
    async fn test_actor_ids_are_unique_across_runtimes() {
        let a = Runtime::new(RuntimeConfig::default());
        let b = Runtime::new(RuntimeConfig::default());
        let in_a = a.spawn_actor(Idle);
        let in_b = b.spawn_actor(Idle);

        assert_ne!(in_a.id(), in_b.id());
        assert_eq!(a.actors_spawned(), 1);
        assert_eq!(b.actors_spawned(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_main_entry_is_rejected() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

        let first = runtime.run_main(|_| async move {
            let _ = gate_rx.await;
        });
        let second = async {
            let result = runtime.run_main(|_| async {}).await;
            let _ = gate_tx.send(());
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(LabError::MainAlreadyActive)));
    }
}
