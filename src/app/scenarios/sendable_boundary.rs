use crate::app::scenarios::SENDABLE_BOUNDARY;
use crate::core::actor::{Actor, Context, Handler, Message};
use crate::core::domain::Nonisolated;
use crate::core::runtime::Runtime;
use crate::core::sendable::{assert_sendable, require_sendable, UncheckedSendable};
use crate::core::task::spawn_detached;
use crate::domain::model::{Item, ScenarioOutcome};
use crate::domain::ports::Scenario;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::cell::Cell;
use std::sync::Arc;

/// Immutable catalog snapshot, safe to share by reference.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub items: Vec<Item>,
}

#[derive(Debug, Default)]
pub struct AuditActor {
    seen: usize,
}

impl Actor for AuditActor {
    fn name(&self) -> &str {
        "AuditActor"
    }
}

pub struct Inspect(pub Arc<CatalogSnapshot>);

impl Message for Inspect {
    type Reply = usize;
}

/// Hands over a value that is only Sendable by assertion.
pub struct Adopt(pub UncheckedSendable<Cell<u32>>);

impl Message for Adopt {
    type Reply = u32;
}

#[async_trait]
impl Handler<Inspect> for AuditActor {
    async fn handle(&mut self, msg: Inspect, _cx: &mut Context<Self>) -> usize {
        self.seen += msg.0.items.len();
        self.seen
    }
}

#[async_trait]
impl Handler<Adopt> for AuditActor {
    async fn handle(&mut self, msg: Adopt, _cx: &mut Context<Self>) -> u32 {
        let cell = msg.0.into_inner();
        cell.set(cell.get() * 2);
        cell.get()
    }
}

pub struct SendableBoundaryScenario;

#[async_trait(?Send)]
impl Scenario for SendableBoundaryScenario {
    fn name(&self) -> &str {
        SENDABLE_BOUNDARY
    }

    fn description(&self) -> &str {
        "Sendable values cross domains and stay usable by the sender"
    }

    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome> {
        let mut outcome = ScenarioOutcome::new();
        assert_sendable::<Arc<CatalogSnapshot>>();

        let snapshot = Arc::new(CatalogSnapshot {
            items: vec![
                Item {
                    id: 1,
                    title: "alpha".to_string(),
                },
                Item {
                    id: 2,
                    title: "beta".to_string(),
                },
            ],
        });
        let audit = runtime.spawn_actor(AuditActor::default());

        let seen = audit.ask(Inspect(Arc::clone(&snapshot))).await?;
        outcome.check(seen == 2, "actor read the shared snapshot");
        outcome.check(
            snapshot.items[0].title == "alpha",
            "sender keeps reading the snapshot after sharing it",
        );

        // ActorRef 本身也是 Sendable，可以交給獨立的 task
        let relay = audit.clone();
        let relayed = Arc::clone(&snapshot);
        let forward = move |_: Nonisolated| async move { relay.ask(Inspect(relayed)).await };
        require_sendable(&forward);
        let seen = spawn_detached(forward).join().await??;
        outcome.check(seen == 4, "an actor handle crossed into an independent task");

        // SAFETY: the cell is moved into the actor and never touched here again.
        let asserted = unsafe { UncheckedSendable::new(Cell::new(21)) };
        let doubled = audit.ask(Adopt(asserted)).await?;
        outcome.check(doubled == 42, "an asserted-Sendable cell crossed by move");

        outcome.observe("Rc, Cell and RefCell captures never reach this point: the build rejects them");
        Ok(outcome)
    }
}
