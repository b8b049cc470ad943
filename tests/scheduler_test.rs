mod utils;

use shuukan::modules::download_control::{
    DownloadControlStateAccessor, DownloadControlStateAccessorImpl, DownloadControlStateScheduler,
};
use std::collections::HashSet;
use std::sync::Arc;
use utils::doubles::{FixedClock, RecordingMergeLockAccessor, TestAppConfig};
use utils::factories::{anime_with_source, entry, week};

const HOST: &str = "anime.example.org";

async fn scheduler_over(
    temp: &tempfile::TempDir,
    entries: Vec<(&str, u32)>, // (id, next download week of 2024)
) -> DownloadControlStateScheduler {
    let config = Arc::new(TestAppConfig::new(temp.path().to_path_buf(), &[HOST]));
    let accessor = Arc::new(DownloadControlStateAccessorImpl::new(
        config,
        Arc::new(RecordingMergeLockAccessor::default()),
    ));

    for (anime_id, next_week) in entries {
        accessor
            .create_or_update(
                HOST,
                anime_id,
                entry(
                    0,
                    week(2024, 9),
                    week(2024, next_week),
                    anime_with_source("Some Anime", HOST, anime_id),
                ),
            )
            .await
            .unwrap();
    }

    DownloadControlStateScheduler::new(accessor, Arc::new(FixedClock::in_week(2024, 11)))
}

fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[tokio::test]
async fn test_entries_due_this_week_are_scheduled() {
    let temp = tempfile::tempdir().unwrap();
    let scheduler = scheduler_over(&temp, vec![("1", 11), ("2", 12), ("3", 14)]).await;

    let scheduled = scheduler
        .find_entries_scheduled_for_current_week(HOST)
        .await
        .unwrap();

    assert_eq!(scheduled, ids(&["1"]));
}

#[tokio::test]
async fn test_overdue_entries_are_scheduled_too() {
    let temp = tempfile::tempdir().unwrap();
    let scheduler = scheduler_over(&temp, vec![("1", 10), ("2", 11), ("3", 12)]).await;

    let scheduled = scheduler
        .find_entries_scheduled_for_current_week(HOST)
        .await
        .unwrap();

    assert_eq!(scheduled, ids(&["1", "2"]));
}

#[tokio::test]
async fn test_not_scheduled_is_the_complement_within_existing_entries() {
    let temp = tempfile::tempdir().unwrap();
    let scheduler = scheduler_over(&temp, vec![("1", 10), ("2", 11), ("3", 12), ("4", 20)]).await;

    let scheduled = scheduler
        .find_entries_scheduled_for_current_week(HOST)
        .await
        .unwrap();
    let not_scheduled = scheduler
        .find_entries_not_scheduled_for_current_week(HOST)
        .await
        .unwrap();

    assert_eq!(not_scheduled, ids(&["3", "4"]));
    assert!(scheduled.is_disjoint(&not_scheduled));
    assert_eq!(scheduled.len() + not_scheduled.len(), 4);
}

#[tokio::test]
async fn test_empty_store_schedules_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let scheduler = scheduler_over(&temp, vec![]).await;

    assert!(scheduler
        .find_entries_scheduled_for_current_week(HOST)
        .await
        .unwrap()
        .is_empty());
    assert!(scheduler
        .find_entries_not_scheduled_for_current_week(HOST)
        .await
        .unwrap()
        .is_empty());
}
