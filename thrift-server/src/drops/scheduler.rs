//! Drop Scheduler
//!
//! Two timed jobs drive the drop lifecycle:
//! - a 1s countdown tick that refreshes the per-drop countdown snapshots
//!   and takes overdue scheduled drops live,
//! - a 30s completion sweep that closes out live drops whose items have
//!   all sold.
//!
//! The tick bodies take the current time as a parameter, so tests can walk
//! a simulated clock without sleeping.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use shared::models::DropStatus;
use shared::util::now_millis;
use sqlx::SqlitePool;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::db::repository::drop as drop_repo;
use crate::utils::AppResult;

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
const COMPLETION_SWEEP: Duration = Duration::from_secs(30);

/// Countdown broken into display units.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CountdownView {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CountdownView {
    fn from_remaining_ms(remaining: i64) -> Self {
        let total_seconds = remaining.max(0) / 1000;
        Self {
            days: total_seconds / 86_400,
            hours: (total_seconds % 86_400) / 3_600,
            minutes: (total_seconds % 3_600) / 60,
            seconds: total_seconds % 60,
        }
    }
}

/// Remaining time per scheduled drop, refreshed every tick. Shared between
/// the scheduler (writer) and the drop service / API (readers and teardown).
#[derive(Clone, Default)]
pub struct CountdownTracker {
    remaining: Arc<DashMap<String, i64>>,
}

impl CountdownTracker {
    pub fn set(&self, drop_id: &str, remaining_ms: i64) {
        self.remaining.insert(drop_id.to_string(), remaining_ms);
    }

    pub fn remove(&self, drop_id: &str) {
        self.remaining.remove(drop_id);
    }

    pub fn snapshot(&self, drop_id: &str) -> Option<CountdownView> {
        self.remaining
            .get(drop_id)
            .map(|entry| CountdownView::from_remaining_ms(*entry))
    }

    pub fn all(&self) -> Vec<(String, CountdownView)> {
        self.remaining
            .iter()
            .map(|entry| (entry.key().clone(), CountdownView::from_remaining_ms(*entry.value())))
            .collect()
    }

    fn retain_ids(&self, ids: &[String]) {
        self.remaining.retain(|key, _| ids.iter().any(|id| id == key));
    }
}

/// Refresh countdowns and activate scheduled drops whose time has come.
/// Returns the number of drops taken live.
pub async fn countdown_tick(
    pool: &SqlitePool,
    countdowns: &CountdownTracker,
    now_ms: i64,
) -> AppResult<usize> {
    let mut activated = 0;
    for due in drop_repo::due_scheduled(pool, now_ms).await? {
        // Guarded update; a racing manual activation just wins the race
        if drop_repo::activate(pool, &due.id, now_ms).await? {
            countdowns.remove(&due.id);
            info!(drop_id = %due.id, name = %due.name, "Scheduled drop is now live");
            activated += 1;
        }
    }

    let scheduled = drop_repo::find_by_status(pool, DropStatus::Scheduled).await?;
    let ids: Vec<String> = scheduled.iter().map(|d| d.id.clone()).collect();
    countdowns.retain_ids(&ids);
    for drop in &scheduled {
        if let Some(at) = drop.scheduled_at {
            countdowns.set(&drop.id, at - now_ms);
        }
    }

    Ok(activated)
}

/// Complete live drops whose member items have all sold. A drop with no
/// members is left alone. Returns the number of drops completed.
pub async fn completion_sweep(pool: &SqlitePool, now_ms: i64) -> AppResult<usize> {
    let mut completed = 0;
    for drop_id in drop_repo::live_fully_sold(pool).await? {
        if drop_repo::complete(pool, &drop_id, now_ms).await? {
            info!(drop_id = %drop_id, "Drop sold out, marked completed");
            completed += 1;
        }
    }
    Ok(completed)
}

pub struct DropScheduler {
    pool: SqlitePool,
    countdowns: CountdownTracker,
}

impl DropScheduler {
    pub fn new(pool: SqlitePool, countdowns: CountdownTracker) -> Self {
        Self { pool, countdowns }
    }

    /// Run until the shutdown token fires. The first countdown tick also
    /// catches up drops that came due while the server was down.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Drop scheduler started");
        let mut countdown = interval(COUNTDOWN_TICK);
        let mut sweep = interval(COMPLETION_SWEEP);

        loop {
            tokio::select! {
                _ = countdown.tick() => {
                    if let Err(e) = countdown_tick(&self.pool, &self.countdowns, now_millis()).await {
                        error!(error = %e, "Countdown tick failed");
                    }
                }
                _ = sweep.tick() => {
                    if let Err(e) = completion_sweep(&self.pool, now_millis()).await {
                        error!(error = %e, "Completion sweep failed");
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Drop scheduler stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::item as item_repo;
    use crate::db::DbService;
    use shared::models::{Drop, ItemCondition, ItemCreate};

    async fn seed_item(pool: &SqlitePool, name: &str) -> String {
        let item = item_repo::create(
            pool,
            ItemCreate {
                name: name.to_string(),
                description: String::new(),
                price: 25.0,
                cost: 5.0,
                category: "tshirt".to_string(),
                size: "M".to_string(),
                condition: ItemCondition::Good,
                images: vec!["https://img.test/a.jpg".to_string()],
            },
        )
        .await
        .unwrap();
        item.id
    }

    async fn seed_drop(pool: &SqlitePool, status: DropStatus, item_ids: Vec<String>, scheduled_at: Option<i64>) -> String {
        let drop = Drop {
            id: format!("drop_test_{}", rand::random::<u32>()),
            name: "Test drop".to_string(),
            description: None,
            status,
            item_ids,
            scheduled_at,
            activated_at: None,
            completed_at: None,
            created_at: 1_000,
            updated_at: 1_000,
        };
        drop_repo::save_with_assignments(pool, &drop).await.unwrap();
        drop.id
    }

    #[tokio::test]
    async fn tick_activates_due_drops_once() {
        let db = DbService::in_memory().await.unwrap();
        let countdowns = CountdownTracker::default();
        let item = seed_item(&db.pool, "Due").await;
        let drop_id = seed_drop(&db.pool, DropStatus::Scheduled, vec![item], Some(10_000)).await;

        // Not due yet: countdown is tracked, nothing activates
        let activated = countdown_tick(&db.pool, &countdowns, 7_000).await.unwrap();
        assert_eq!(activated, 0);
        let view = countdowns.snapshot(&drop_id).unwrap();
        assert_eq!(view.seconds, 3);
        assert_eq!(countdowns.all().len(), 1);

        let activated = countdown_tick(&db.pool, &countdowns, 10_000).await.unwrap();
        assert_eq!(activated, 1);
        assert!(countdowns.snapshot(&drop_id).is_none());

        // Second tick over the same state is a no-op
        let activated = countdown_tick(&db.pool, &countdowns, 11_000).await.unwrap();
        assert_eq!(activated, 0);

        let drop = drop_repo::find_by_id(&db.pool, &drop_id).await.unwrap().unwrap();
        assert_eq!(drop.status, DropStatus::Live);
        assert_eq!(drop.activated_at, Some(10_000));
    }

    #[tokio::test]
    async fn tick_catches_up_overdue_drops() {
        let db = DbService::in_memory().await.unwrap();
        let countdowns = CountdownTracker::default();
        let item = seed_item(&db.pool, "Overdue").await;
        let drop_id = seed_drop(&db.pool, DropStatus::Scheduled, vec![item], Some(5_000)).await;

        // First tick happens long after the release time (server restart)
        let activated = countdown_tick(&db.pool, &countdowns, 500_000).await.unwrap();
        assert_eq!(activated, 1);
        let drop = drop_repo::find_by_id(&db.pool, &drop_id).await.unwrap().unwrap();
        assert_eq!(drop.status, DropStatus::Live);
    }

    #[tokio::test]
    async fn sweep_completes_only_sold_out_drops() {
        let db = DbService::in_memory().await.unwrap();
        let sold = seed_item(&db.pool, "Sold").await;
        let unsold = seed_item(&db.pool, "Unsold").await;
        let drop_id = seed_drop(
            &db.pool,
            DropStatus::Live,
            vec![sold.clone(), unsold.clone()],
            None,
        )
        .await;

        item_repo::set_available(&db.pool, &sold, false).await.unwrap();
        let completed = completion_sweep(&db.pool, 20_000).await.unwrap();
        assert_eq!(completed, 0);

        item_repo::set_available(&db.pool, &unsold, false).await.unwrap();
        let completed = completion_sweep(&db.pool, 30_000).await.unwrap();
        assert_eq!(completed, 1);

        let drop = drop_repo::find_by_id(&db.pool, &drop_id).await.unwrap().unwrap();
        assert_eq!(drop.status, DropStatus::Completed);
        assert_eq!(drop.completed_at, Some(30_000));

        // Sweeping again changes nothing
        let completed = completion_sweep(&db.pool, 40_000).await.unwrap();
        assert_eq!(completed, 0);
    }

    #[tokio::test]
    async fn sweep_ignores_drops_with_no_members() {
        let db = DbService::in_memory().await.unwrap();
        let drop_id = seed_drop(&db.pool, DropStatus::Live, vec![], None).await;

        let completed = completion_sweep(&db.pool, 10_000).await.unwrap();
        assert_eq!(completed, 0);
        let drop = drop_repo::find_by_id(&db.pool, &drop_id).await.unwrap().unwrap();
        assert_eq!(drop.status, DropStatus::Live);
    }

    #[test]
    fn countdown_breaks_into_display_units() {
        let view = CountdownView::from_remaining_ms(
            ((2 * 86_400 + 3 * 3_600 + 4 * 60 + 5) * 1000) + 999,
        );
        assert_eq!(view.days, 2);
        assert_eq!(view.hours, 3);
        assert_eq!(view.minutes, 4);
        assert_eq!(view.seconds, 5);

        // Past-due clamps to zero
        let view = CountdownView::from_remaining_ms(-5_000);
        assert_eq!(view.seconds, 0);
    }
}
