use crate::app::scenarios::TASK_INHERITANCE;
use crate::core::actor::{Actor, ActorRef, Context, Handler, Message};
use crate::core::domain::{DomainId, ExecutionDomain};
use crate::core::isolated::Isolated;
use crate::core::main_actor::MainToken;
use crate::core::runtime::Runtime;
use crate::core::task::{TaskHandle, TaskPlacement};
use crate::domain::model::ScenarioOutcome;
use crate::domain::ports::Scenario;
use crate::utils::error::{LabError, Result};
use async_trait::async_trait;

/// Actor whose ledger is bound to its own domain once it starts.
#[derive(Debug, Default)]
pub struct LedgerActor {
    ledger: Option<Isolated<u64>>,
}

impl LedgerActor {
    fn ledger(&self) -> Result<&Isolated<u64>> {
        self.ledger.as_ref().ok_or_else(|| LabError::ScenarioFailed {
            scenario: TASK_INHERITANCE.to_string(),
            message: "ledger used before the actor started".to_string(),
        })
    }
}

#[async_trait]
impl Actor for LedgerActor {
    fn name(&self) -> &str {
        "LedgerActor"
    }

    async fn started(&mut self, cx: &mut Context<Self>) {
        self.ledger = Some(Isolated::new(100, &*cx));
    }
}

/// Spawns a task that carries an alias of the ledger but not the actor.
pub struct SpawnDetachedReader;

impl Message for SpawnDetachedReader {
    type Reply = Result<TaskHandle<Result<u64>>>;
}

/// Spawns a task that captures the actor handle and goes through it.
pub struct SpawnCapturingWriter;

impl Message for SpawnCapturingWriter {
    type Reply = Result<TaskHandle<Result<u64>>>;
}

#[async_trait]
impl Handler<SpawnDetachedReader> for LedgerActor {
    async fn handle(
        &mut self,
        _msg: SpawnDetachedReader,
        cx: &mut Context<Self>,
    ) -> Result<TaskHandle<Result<u64>>> {
        let ledger = self.ledger()?.share(&*cx)?;
        Ok(cx.spawn_detached(move |token| async move { ledger.with(&token, |v| *v) }))
    }
}

#[async_trait]
impl Handler<SpawnCapturingWriter> for LedgerActor {
    async fn handle(
        &mut self,
        _msg: SpawnCapturingWriter,
        cx: &mut Context<Self>,
    ) -> Result<TaskHandle<Result<u64>>> {
        cx.spawn_capturing(|me: ActorRef<LedgerActor>| async move {
            me.run(|actor, cx| {
                actor.ledger()?.with_mut(&*cx, |v| {
                    *v += 1;
                    *v
                })
            })
            .await?
        })
    }
}

pub struct TaskInheritanceScenario;

#[async_trait(?Send)]
impl Scenario for TaskInheritanceScenario {
    fn name(&self) -> &str {
        TASK_INHERITANCE
    }

    fn description(&self) -> &str {
        "main tasks inherit main; actor tasks inherit only through the captured actor"
    }

    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome> {
        let ledger = runtime.spawn_actor(LedgerActor::default());
        runtime
            .run_main(|main| observe_inheritance(main, ledger))
            .await?
    }
}

async fn observe_inheritance(
    main: MainToken,
    ledger: ActorRef<LedgerActor>,
) -> Result<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();

    let title = Isolated::new(String::from("Inbox"), &main);
    let alias = title.share(&main)?;
    let task = main.spawn(move |main| async move {
        alias.with_mut(&main, |t| t.push_str(" (3)"))?;
        alias.with(&main, |t| t.clone())
    })?;
    outcome.check(
        task.placement() == TaskPlacement::Inherited(DomainId::Main),
        "a task created on main inherits main",
    );
    let shown = task.join().await??;
    outcome.check(
        shown == "Inbox (3)",
        "the main task updated main-only state without a violation",
    );

    let actor_domain = ledger.domain();
    let detached = ledger.ask(SpawnDetachedReader).await??;
    outcome.check(
        detached.placement() == TaskPlacement::Independent && !detached.placement().inherits(actor_domain),
        format!("a task spawned in {} without capturing it runs {}", actor_domain, detached.domain()),
    );
    outcome.check(
        matches!(
            detached.join().await?,
            Err(LabError::IsolationViolation { .. })
        ),
        "the independent task is refused access to the actor's ledger",
    );

    let capturing = ledger.ask(SpawnCapturingWriter).await??;
    outcome.check(
        capturing.placement() == TaskPlacement::Mediated(actor_domain),
        "a task capturing the actor is mediated by it",
    );
    let balance = capturing.join().await??;
    outcome.check(
        balance == 101,
        "the capturing task updated the ledger through the actor",
    );

    Ok(outcome)
}
