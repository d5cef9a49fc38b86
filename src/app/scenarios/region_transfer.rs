use crate::app::scenarios::REGION_TRANSFER;
use crate::core::actor::{Actor, ActorRef, Context, Handler, Message};
use crate::core::domain::ExecutionDomain;
use crate::core::isolated::Isolated;
use crate::core::main_actor::MainToken;
use crate::core::runtime::Runtime;
use crate::core::transfer::{RejectReason, Transfer, TransferLog, TransferState};
use crate::domain::model::ScenarioOutcome;
use crate::domain::ports::Scenario;
use crate::utils::error::{LabError, Result};
use async_trait::async_trait;
use std::cell::Cell;

/// Editable document. `Send` but not `Sync`, so it can be handed off but
/// never shared.
#[derive(Debug)]
pub struct Draft {
    pub lines: Vec<String>,
    pub revision: Cell<u32>,
}

impl Draft {
    pub fn new(first_line: &str) -> Self {
        Self {
            lines: vec![first_line.to_string()],
            revision: Cell::new(1),
        }
    }

    fn append(&mut self, line: &str) -> usize {
        self.lines.push(line.to_string());
        self.revision.set(self.revision.get() + 1);
        self.lines.len()
    }
}

#[derive(Debug, Default)]
pub struct EditorActor {
    draft: Option<Isolated<Draft>>,
}

impl Actor for EditorActor {
    fn name(&self) -> &str {
        "EditorActor"
    }
}

pub struct AdoptDraft(pub Transfer<Draft>);

impl Message for AdoptDraft {
    type Reply = Result<usize>;
}

/// Lends a same-domain alias of the adopted draft.
pub struct LendDraft;

impl Message for LendDraft {
    type Reply = Result<Isolated<Draft>>;
}

#[async_trait]
impl Handler<AdoptDraft> for EditorActor {
    async fn handle(&mut self, msg: AdoptDraft, cx: &mut Context<Self>) -> Result<usize> {
        let owned = msg.0.receive(&*cx);
        let lines = owned.with_mut(&*cx, |draft| draft.append("edited by the editor"))?;
        self.draft = Some(owned);
        Ok(lines)
    }
}

#[async_trait]
impl Handler<LendDraft> for EditorActor {
    async fn handle(&mut self, _msg: LendDraft, cx: &mut Context<Self>) -> Result<Isolated<Draft>> {
        let draft = self.draft.as_ref().ok_or_else(|| LabError::ScenarioFailed {
            scenario: REGION_TRANSFER.to_string(),
            message: "no draft adopted yet".to_string(),
        })?;
        draft.share(&*cx)
    }
}

pub struct RegionTransferScenario;

#[async_trait(?Send)]
impl Scenario for RegionTransferScenario {
    fn name(&self) -> &str {
        REGION_TRANSFER
    }

    fn description(&self) -> &str {
        "non-Sendable values cross only by explicit, alias-free transfer"
    }

    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome> {
        let editor = runtime.spawn_actor(EditorActor::default());
        let log = runtime.transfer_log().clone();
        runtime
            .run_main(|main| hand_off_draft(main, editor, log))
            .await?
    }
}

async fn hand_off_draft(
    main: MainToken,
    editor: ActorRef<EditorActor>,
    log: TransferLog,
) -> Result<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let draft = Isolated::new(Draft::new("written on main"), &main);
    let preview = draft.share(&main)?;

    let draft = match draft.transfer(&main, &log) {
        Ok(_) => {
            outcome.check(false, "transfer with a live alias was rejected");
            return Ok(outcome);
        }
        Err(rejected) => {
            outcome.check(
                rejected.reason == RejectReason::StillReferenced { aliases: 1 },
                format!("transfer with a live alias was rejected ({})", rejected.reason),
            );
            rejected.value
        }
    };
    outcome.check(
        draft.with(&main, |d| d.lines.len())? == 1,
        "the rejected draft is still usable by its owner",
    );

    drop(preview);
    let transfer = draft.transfer(&main, &log)?;
    let transfer_id = transfer.id();
    let lines = editor.ask(AdoptDraft(transfer)).await??;
    outcome.check(lines == 2, "the editor adopted and edited the draft");
    outcome.check(
        log.state_of(transfer_id) == Some(TransferState::Received),
        format!("transfer #{} ended in the received state", transfer_id),
    );

    let lent = editor.ask(LendDraft).await??;
    outcome.check(
        lent.owner() == editor.domain(),
        format!("the draft now belongs to {}", lent.owner()),
    );
    outcome.check(
        matches!(
            lent.with(&main, |d| d.lines.len()),
            Err(LabError::IsolationViolation { .. })
        ),
        format!("{} can no longer read the draft", main.domain_id()),
    );
    match lent.transfer(&main, &log) {
        Err(rejected) => outcome.check(
            matches!(rejected.reason, RejectReason::NotOwner { .. }),
            "the former owner cannot hand the draft off again",
        ),
        Ok(_) => outcome.check(false, "the former owner cannot hand the draft off again"),
    }

    Ok(outcome)
}
