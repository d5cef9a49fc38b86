use isolation_lab::adapters::repository::ActorItemRepository;
use isolation_lab::app::list_view::ListView;
use isolation_lab::domain::model::Item;
use isolation_lab::domain::ports::ItemRepository;
use isolation_lab::{LabError, Runtime, RuntimeConfig};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn items(titles: &[&str]) -> Vec<Item> {
    titles
        .iter()
        .enumerate()
        .map(|(i, title)| Item {
            id: i as u64 + 1,
            title: title.to_string(),
        })
        .collect()
}

#[tokio::test]
async fn test_empty_repository_fetch_returns_no_items() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let repository = ActorItemRepository::spawn(&runtime, Vec::new());

    let fetched = assert_ok!(repository.fetch_items().await);
    assert!(fetched.is_empty());
    assert_eq!(assert_ok!(repository.fetch_count().await), 1);
}

#[tokio::test]
async fn test_list_view_shows_repository_items() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let repository = ActorItemRepository::spawn(&runtime, items(&["milk", "eggs"]));
    let shared: Arc<dyn ItemRepository> = Arc::new(repository.clone());

    let result = runtime
        .run_main(|main| async move {
            let view = ListView::new(shared, &main);
            let count = view.refresh(&main)?.join().await??;
            let state = view.snapshot(&main)?;
            Ok::<_, LabError>((count, state))
        })
        .await
        .and_then(|inner| inner);

    let (count, state) = assert_ok!(result);
    assert_eq!(count, 2);
    assert_eq!(state.items, items(&["milk", "eggs"]));
    assert_eq!(state.refreshes, 1);
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_items() {
    let runtime = Runtime::new(RuntimeConfig::default());
    let repository = ActorItemRepository::spawn(&runtime, items(&["milk"]));
    let shared: Arc<dyn ItemRepository> = Arc::new(repository.clone());

    let result = runtime
        .run_main(|main| async move {
            let view = ListView::new(shared, &main);
            view.refresh(&main)?.join().await??;

            repository.fail_next_fetch().await?;
            let failed = view.refresh(&main)?.join().await?;
            assert_err!(failed);

            let state = view.snapshot(&main)?;
            Ok::<_, LabError>(state)
        })
        .await
        .and_then(|inner| inner);

    let state = assert_ok!(result);
    assert_eq!(state.items, items(&["milk"]));
    assert_eq!(state.refreshes, 1);
    assert!(state.last_error.is_some());
}
