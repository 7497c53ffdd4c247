//! Randomized drop lifecycle exercise.
//!
//! Runs a long random sequence of editor saves, schedule changes,
//! activations, sales, sweeps and deletions against one database, checking
//! after every step that the two sides of the item/drop assignment agree
//! and that statuses only move along the lifecycle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::models::{DropSave, DropStatus, ItemCondition, ItemCreate, ScheduleType};
use thrift_server::db::repository::{drop as drop_repo, item as item_repo};
use thrift_server::db::DbService;
use thrift_server::drops::scheduler::{completion_sweep, countdown_tick, CountdownTracker};
use thrift_server::drops::DropService;

const SEED: u64 = 0x5eed_7217;
const STEPS: usize = 200;

async fn seed_items(db: &DbService, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let item = item_repo::create(
            &db.pool,
            ItemCreate {
                name: format!("Item {i}"),
                description: String::new(),
                price: 20.0 + i as f64,
                cost: 5.0,
                category: "tshirt".to_string(),
                size: "M".to_string(),
                condition: ItemCondition::Good,
                images: vec![format!("https://img.test/{i}.jpg")],
            },
        )
        .await
        .unwrap();
        ids.push(item.id);
    }
    ids
}

async fn assert_consistent(db: &DbService) {
    let drops = drop_repo::find_all(&db.pool).await.unwrap();
    let items = item_repo::find_all(&db.pool).await.unwrap();

    for drop in &drops {
        assert!(
            drop.item_ids.len() <= 10,
            "drop {} exceeds member limit",
            drop.id
        );
        match drop.status {
            DropStatus::Scheduled => {
                assert!(drop.scheduled_at.is_some(), "scheduled drop without time")
            }
            DropStatus::Draft => assert!(drop.scheduled_at.is_none(), "draft kept a release time"),
            DropStatus::Live => assert!(drop.activated_at.is_some(), "live drop never activated"),
            DropStatus::Completed => {
                assert!(drop.completed_at.is_some(), "completed drop without timestamp")
            }
        }
        for item_id in &drop.item_ids {
            let item = items
                .iter()
                .find(|i| &i.id == item_id)
                .expect("drop references missing item");
            assert_eq!(
                item.drop_id.as_deref(),
                Some(drop.id.as_str()),
                "membership without back-reference"
            );
        }
    }
    for item in &items {
        if let Some(drop_id) = &item.drop_id {
            let drop = drops
                .iter()
                .find(|d| &d.id == drop_id)
                .expect("item references missing drop");
            assert!(
                drop.item_ids.contains(&item.id),
                "back-reference without membership"
            );
        }
    }
}

#[tokio::test]
async fn random_operation_sequence_keeps_assignments_consistent() {
    let db = DbService::in_memory().await.unwrap();
    let countdowns = CountdownTracker::default();
    let service = DropService::new(db.pool.clone(), countdowns.clone());
    let mut rng = StdRng::seed_from_u64(SEED);

    let items = seed_items(&db, 12).await;
    let mut now: i64 = 1_000_000;

    for step in 0..STEPS {
        now += rng.gen_range(500..5_000);
        let drops = drop_repo::find_all(&db.pool).await.unwrap();
        let free: Vec<String> = item_repo::find_unassigned(&db.pool)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();

        match rng.gen_range(0..8) {
            // Create a draft or scheduled drop from free items
            0 | 1 => {
                if free.is_empty() {
                    continue;
                }
                let take = rng.gen_range(1..=free.len().min(3));
                let picked: Vec<String> = free.iter().take(take).cloned().collect();
                let schedule = rng.gen_bool(0.5);
                let save = DropSave {
                    name: format!("Drop step {step}"),
                    description: None,
                    item_ids: picked,
                    schedule_type: if schedule {
                        ScheduleType::Schedule
                    } else {
                        ScheduleType::Draft
                    },
                    scheduled_at: schedule.then(|| now + rng.gen_range(1_000..30_000)),
                };
                service.save(None, save, now).await.unwrap();
            }
            // Edit an editable drop's membership
            2 => {
                let editable: Vec<_> = drops
                    .iter()
                    .filter(|d| {
                        matches!(d.status, DropStatus::Draft | DropStatus::Scheduled)
                    })
                    .collect();
                if editable.is_empty() {
                    continue;
                }
                let target = editable[rng.gen_range(0..editable.len())];
                let mut members = target.item_ids.clone();
                if !free.is_empty() && members.len() < 10 && rng.gen_bool(0.5) {
                    members.push(free[0].clone());
                } else if members.len() > 1 {
                    members.pop();
                }
                let schedule = target.status == DropStatus::Scheduled;
                let save = DropSave {
                    name: target.name.clone(),
                    description: target.description.clone(),
                    item_ids: members,
                    schedule_type: if schedule {
                        ScheduleType::Schedule
                    } else {
                        ScheduleType::Draft
                    },
                    scheduled_at: schedule.then(|| now + rng.gen_range(1_000..30_000)),
                };
                service.save(Some(target.id.clone()), save, now).await.unwrap();
            }
            // Cancel a scheduled drop
            3 => {
                if let Some(target) = drops.iter().find(|d| d.status == DropStatus::Scheduled) {
                    service.cancel_schedule(&target.id, now).await.unwrap();
                }
            }
            // Scheduler tick, possibly past some release times
            4 => {
                now += rng.gen_range(0..60_000);
                countdown_tick(&db.pool, &countdowns, now).await.unwrap();
            }
            // Sell a random assigned item
            5 => {
                let assigned: Vec<_> = item_repo::find_all(&db.pool)
                    .await
                    .unwrap()
                    .into_iter()
                    .filter(|i| i.available && i.drop_id.is_some())
                    .collect();
                if let Some(item) = assigned.first() {
                    item_repo::set_available(&db.pool, &item.id, false)
                        .await
                        .unwrap();
                }
            }
            // Completion sweep
            6 => {
                completion_sweep(&db.pool, now).await.unwrap();
            }
            // Delete a non-live drop
            _ => {
                let deletable: Vec<_> = drops
                    .iter()
                    .filter(|d| d.status.deletable())
                    .collect();
                if let Some(target) = deletable.first() {
                    service.delete(&target.id).await.unwrap();
                }
            }
        }

        assert_consistent(&db).await;
    }

    // End state: run everything due to completion and re-check
    now += 120_000;
    countdown_tick(&db.pool, &countdowns, now).await.unwrap();
    completion_sweep(&db.pool, now).await.unwrap();
    assert_consistent(&db).await;
}
