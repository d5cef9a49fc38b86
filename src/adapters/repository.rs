use crate::core::actor::{Actor, ActorRef, Context, Handler, Message};
use crate::core::runtime::Runtime;
use crate::domain::model::Item;
use crate::domain::ports::ItemRepository;
use crate::utils::error::{LabError, Result};
use async_trait::async_trait;

/// Repository state owned by its own actor domain.
///
/// Starts empty unless seeded, so a plain fetch returns no items.
#[derive(Debug, Default)]
pub struct RepositoryActor {
    items: Vec<Item>,
    fail_next: bool,
    fetches: u64,
}

impl RepositoryActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }
}

impl Actor for RepositoryActor {
    fn name(&self) -> &str {
        "RepositoryActor"
    }
}

pub struct FetchItems;

impl Message for FetchItems {
    type Reply = Result<Vec<Item>>;
}

pub struct StoreItem(pub Item);

impl Message for StoreItem {
    type Reply = usize;
}

/// Makes the next fetch fail once.
pub struct FailNextFetch;

impl Message for FailNextFetch {
    type Reply = ();
}

pub struct FetchCount;

impl Message for FetchCount {
    type Reply = u64;
}

#[async_trait]
impl Handler<FetchItems> for RepositoryActor {
    async fn handle(&mut self, _msg: FetchItems, cx: &mut Context<Self>) -> Result<Vec<Item>> {
        self.fetches += 1;
        if std::mem::take(&mut self.fail_next) {
            tracing::warn!("📦 {} fetch #{} failed", cx.id(), self.fetches);
            return Err(LabError::RepositoryError {
                message: format!("fetch #{} was configured to fail", self.fetches),
            });
        }
        tracing::debug!("📦 {} returning {} item(s)", cx.id(), self.items.len());
        Ok(self.items.clone())
    }
}

#[async_trait]
impl Handler<StoreItem> for RepositoryActor {
    async fn handle(&mut self, msg: StoreItem, _cx: &mut Context<Self>) -> usize {
        match self.items.iter_mut().find(|item| item.id == msg.0.id) {
            Some(existing) => *existing = msg.0,
            None => self.items.push(msg.0),
        }
        self.items.len()
    }
}

#[async_trait]
impl Handler<FailNextFetch> for RepositoryActor {
    async fn handle(&mut self, _msg: FailNextFetch, _cx: &mut Context<Self>) {
        self.fail_next = true;
    }
}

#[async_trait]
impl Handler<FetchCount> for RepositoryActor {
    async fn handle(&mut self, _msg: FetchCount, _cx: &mut Context<Self>) -> u64 {
        self.fetches
    }
}

/// `ItemRepository` backed by a `RepositoryActor`.
#[derive(Debug, Clone)]
pub struct ActorItemRepository {
    actor: ActorRef<RepositoryActor>,
}

impl ActorItemRepository {
    pub fn spawn(runtime: &Runtime, seed: Vec<Item>) -> Self {
        Self {
            actor: runtime.spawn_actor(RepositoryActor::with_items(seed)),
        }
    }

    pub fn actor(&self) -> &ActorRef<RepositoryActor> {
        &self.actor
    }

    pub async fn store(&self, item: Item) -> Result<usize> {
        self.actor.ask(StoreItem(item)).await
    }

    pub async fn fail_next_fetch(&self) -> Result<()> {
        self.actor.ask(FailNextFetch).await
    }

    pub async fn fetch_count(&self) -> Result<u64> {
        self.actor.ask(FetchCount).await
    }
}

#[async_trait]
impl ItemRepository for ActorItemRepository {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        self.actor.ask(FetchItems).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::runtime::RuntimeConfig;

    fn item(id: u64, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_defaults_to_empty() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let repo = ActorItemRepository::spawn(&runtime, Vec::new());

        assert!(repo.fetch_items().await.unwrap().is_empty());
        assert_eq!(repo.fetch_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_replaces_by_id() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let repo = ActorItemRepository::spawn(&runtime, vec![item(1, "one")]);

        assert_eq!(repo.store(item(2, "two")).await.unwrap(), 2);
        assert_eq!(repo.store(item(1, "uno")).await.unwrap(), 2);

        let items = repo.fetch_items().await.unwrap();
        assert_eq!(items[0].title, "uno");
    }

    #[tokio::test]
    async fn test_failure_is_reported_once() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let repo = ActorItemRepository::spawn(&runtime, vec![item(1, "one")]);

        repo.fail_next_fetch().await.unwrap();
        let err = repo.fetch_items().await.unwrap_err();
        assert!(matches!(err, LabError::RepositoryError { .. }));
        assert_eq!(repo.fetch_items().await.unwrap().len(), 1);
    }
}
