use crate::adapters::repository::ActorItemRepository;
use crate::app::list_view::ListView;
use crate::app::scenarios::LIST_VIEW;
use crate::core::domain::DomainId;
use crate::core::main_actor::MainToken;
use crate::core::runtime::Runtime;
use crate::core::task::TaskPlacement;
use crate::domain::model::{Item, ScenarioOutcome};
use crate::domain::ports::Scenario;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub struct ListViewScenario {
    seed: Vec<Item>,
    fail_first: bool,
}

impl ListViewScenario {
    pub fn new(seed: Vec<Item>, fail_first: bool) -> Self {
        Self { seed, fail_first }
    }
}

#[async_trait(?Send)]
impl Scenario for ListViewScenario {
    fn name(&self) -> &str {
        LIST_VIEW
    }

    fn description(&self) -> &str {
        "a main-bound view refreshes from a repository actor"
    }

    async fn run(&self, runtime: &Runtime) -> Result<ScenarioOutcome> {
        let repository = ActorItemRepository::spawn(runtime, self.seed.clone());
        let fail_first = self.fail_first;
        runtime
            .run_main(|main| refresh_view(main, repository, fail_first))
            .await?
    }
}

async fn refresh_view(
    main: MainToken,
    repository: ActorItemRepository,
    fail_first: bool,
) -> Result<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let view = ListView::new(Arc::new(repository.clone()), &main);

    if fail_first {
        repository.fail_next_fetch().await?;
    }

    let first = view.refresh(&main)?;
    outcome.check(
        first.placement() == TaskPlacement::Inherited(DomainId::Main),
        "the refresh task inherits main",
    );
    let result = first.join().await?;
    let shown = view.items(&main)?;

    if fail_first {
        outcome.check(result.is_err(), "the failing fetch is reported to the caller");
        outcome.check(shown.is_empty(), "the view kept its previous (empty) items");
        outcome.check(
            view.last_error(&main)?.is_some(),
            "the view recorded the fetch error",
        );
    } else {
        let count = result?;
        outcome.check(
            count == shown.len(),
            format!("the view shows the {} fetched item(s)", count),
        );
    }
    outcome.observe(format!(
        "repository served {} fetch(es) so far",
        repository.fetch_count().await?
    ));

    // 成功之後再失敗一次：畫面應保留上一批資料
    let before = view.items(&main)?;
    repository.fail_next_fetch().await?;
    let failed = view.refresh(&main)?.join().await?;
    let after = view.snapshot(&main)?;
    outcome.check(failed.is_err(), "a later failing refresh surfaces its error");
    outcome.check(after.items == before, "a failed refresh keeps the prior items");
    outcome.check(after.last_error.is_some(), "the failure is visible in the view state");

    Ok(outcome)
}
