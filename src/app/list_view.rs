use crate::core::isolated::Isolated;
use crate::core::main_actor::MainToken;
use crate::core::task::TaskHandle;
use crate::domain::model::Item;
use crate::domain::ports::ItemRepository;
use crate::utils::error::Result;
use std::sync::Arc;

/// 畫面狀態，只能在 main domain 上讀寫
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub items: Vec<Item>,
    pub last_error: Option<String>,
    pub refreshes: u32,
}

/// List-rendering stand-in bound to the main domain.
pub struct ListView {
    state: Isolated<ListState>,
    repository: Arc<dyn ItemRepository>,
}

impl ListView {
    pub fn new(repository: Arc<dyn ItemRepository>, main: &MainToken) -> Self {
        Self {
            state: Isolated::new(ListState::default(), main),
            repository,
        }
    }

    pub fn snapshot(&self, main: &MainToken) -> Result<ListState> {
        self.state.with(main, |state| state.clone())
    }

    pub fn items(&self, main: &MainToken) -> Result<Vec<Item>> {
        self.state.with(main, |state| state.items.clone())
    }

    pub fn last_error(&self, main: &MainToken) -> Result<Option<String>> {
        self.state.with(main, |state| state.last_error.clone())
    }

    /// Fetches from the repository on a main-inherited task and applies the
    /// result on main. A failed fetch keeps the current items, records the
    /// error in the state and returns it through the handle.
    pub fn refresh(&self, main: &MainToken) -> Result<TaskHandle<Result<usize>>> {
        let state = self.state.share(main)?;
        let repository = Arc::clone(&self.repository);

        main.spawn(move |main| async move {
            match repository.fetch_items().await {
                Ok(items) => {
                    let count = items.len();
                    state.with_mut(&main, |s| {
                        s.items = items;
                        s.last_error = None;
                        s.refreshes += 1;
                    })?;
                    tracing::info!("🖼️ List view shows {} item(s)", count);
                    Ok(count)
                }
                Err(e) => {
                    tracing::warn!("🖼️ List view refresh failed: {}", e);
                    state.with_mut(&main, |s| s.last_error = Some(e.to_string()))?;
                    Err(e)
                }
            }
        })
    }
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
