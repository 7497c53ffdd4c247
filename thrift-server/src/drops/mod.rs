//! Drop Management
//!
//! A drop is a time-boxed release of 1-10 inventory items. This module owns
//! every status transition: the editor save path (draft / schedule / go
//! live now), manual activation, cancellation, completion and deletion.
//! The scheduler in [`scheduler`] drives the timed transitions through the
//! same guarded repository calls, so a tick racing an admin click resolves
//! to a single winner.

pub mod scheduler;

use serde::Serialize;
use shared::models::{Drop, DropSave, DropStatus, ScheduleType};
use shared::util::entity_id;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::repository::{drop as drop_repo, item as item_repo};
use crate::utils::{AppError, AppResult};

use self::scheduler::CountdownTracker;

/// Drops grouped by lifecycle stage, newest first within each group.
#[derive(Debug, Serialize)]
pub struct DropBoard {
    pub live: Vec<Drop>,
    pub scheduled: Vec<Drop>,
    pub drafts: Vec<Drop>,
    pub completed: Vec<Drop>,
}

#[derive(Clone)]
pub struct DropService {
    pool: SqlitePool,
    countdowns: CountdownTracker,
}

impl DropService {
    pub fn new(pool: SqlitePool, countdowns: CountdownTracker) -> Self {
        Self { pool, countdowns }
    }

    pub fn countdowns(&self) -> &CountdownTracker {
        &self.countdowns
    }

    /// Create or update a drop from the editor.
    ///
    /// Validates the payload, claims the member items, and lands the drop in
    /// the stage the schedule type asks for. Live and completed drops are
    /// not editable.
    pub async fn save(
        &self,
        id: Option<String>,
        data: DropSave,
        now_ms: i64,
    ) -> AppResult<Drop> {
        let name = data.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Drop name is required".into()));
        }
        if data.item_ids.is_empty() || data.item_ids.len() > 10 {
            return Err(AppError::Validation(
                "A drop needs between 1 and 10 items".into(),
            ));
        }
        let scheduled_at = match data.schedule_type {
            ScheduleType::Schedule => {
                let at = data.scheduled_at.ok_or_else(|| {
                    AppError::Validation("A scheduled drop needs a release time".into())
                })?;
                if at <= now_ms {
                    return Err(AppError::Validation(
                        "Scheduled time must be in the future".into(),
                    ));
                }
                Some(at)
            }
            _ => None,
        };

        let existing = match &id {
            Some(id) => {
                let drop = drop_repo::find_by_id(&self.pool, id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Drop {id} not found")))?;
                if matches!(drop.status, DropStatus::Live | DropStatus::Completed) {
                    return Err(AppError::Conflict(
                        "Only draft or scheduled drops can be edited".into(),
                    ));
                }
                Some(drop)
            }
            None => None,
        };
        let drop_id = existing
            .as_ref()
            .map(|d| d.id.clone())
            .unwrap_or_else(|| entity_id("drop"));

        // Items must exist and be free (or already members of this drop)
        let items = item_repo::find_by_ids(&self.pool, &data.item_ids).await?;
        for wanted in &data.item_ids {
            let item = items
                .iter()
                .find(|i| &i.id == wanted)
                .ok_or_else(|| AppError::NotFound(format!("Item {wanted} not found")))?;
            if let Some(owner) = &item.drop_id {
                if owner != &drop_id {
                    return Err(AppError::Conflict(format!(
                        "Item {} is already in another drop",
                        item.id
                    )));
                }
            }
        }

        let (status, activated_at) = match data.schedule_type {
            ScheduleType::Draft => (DropStatus::Draft, None),
            ScheduleType::Schedule => (DropStatus::Scheduled, None),
            ScheduleType::Now => (DropStatus::Live, Some(now_ms)),
        };

        let drop = Drop {
            id: drop_id.clone(),
            name,
            description: data.description,
            status,
            item_ids: data.item_ids,
            scheduled_at,
            activated_at,
            completed_at: None,
            created_at: existing.as_ref().map(|d| d.created_at).unwrap_or(now_ms),
            updated_at: now_ms,
        };
        drop_repo::save_with_assignments(&self.pool, &drop).await?;

        if drop.status != DropStatus::Scheduled {
            self.countdowns.remove(&drop_id);
        }
        info!(drop_id = %drop.id, status = drop.status.as_str(), "Drop saved");
        Ok(drop)
    }

    /// Put a draft on the release calendar.
    pub async fn schedule(&self, id: &str, scheduled_at: i64, now_ms: i64) -> AppResult<Drop> {
        if scheduled_at <= now_ms {
            return Err(AppError::Validation(
                "Scheduled time must be in the future".into(),
            ));
        }
        if !drop_repo::schedule(&self.pool, id, scheduled_at, now_ms).await? {
            let drop = self.require(id).await?;
            return Err(AppError::Conflict(format!(
                "Drop is {}, not draft",
                drop.status.as_str()
            )));
        }
        info!(drop_id = %id, scheduled_at, "Drop scheduled");
        self.require(id).await
    }

    /// Move the release time of a scheduled drop.
    pub async fn reschedule(&self, id: &str, scheduled_at: i64, now_ms: i64) -> AppResult<Drop> {
        if scheduled_at <= now_ms {
            return Err(AppError::Validation(
                "Scheduled time must be in the future".into(),
            ));
        }
        if !drop_repo::reschedule(&self.pool, id, scheduled_at, now_ms).await? {
            return Err(self.not_scheduled(id).await?);
        }
        info!(drop_id = %id, scheduled_at, "Drop rescheduled");
        self.require(id).await
    }

    /// Pull a scheduled drop back to draft and forget its release time.
    pub async fn cancel_schedule(&self, id: &str, now_ms: i64) -> AppResult<Drop> {
        if !drop_repo::cancel_schedule(&self.pool, id, now_ms).await? {
            return Err(self.not_scheduled(id).await?);
        }
        self.countdowns.remove(id);
        info!(drop_id = %id, "Drop schedule cancelled");
        self.require(id).await
    }

    /// Take a scheduled drop live. Idempotent: activating an already-live
    /// drop is a no-op, so the scheduler tick and the admin button can race
    /// without a double activation.
    pub async fn activate(&self, id: &str, now_ms: i64) -> AppResult<Drop> {
        if drop_repo::activate(&self.pool, id, now_ms).await? {
            self.countdowns.remove(id);
            info!(drop_id = %id, "Drop activated");
            return self.require(id).await;
        }
        let drop = self.require(id).await?;
        match drop.status {
            DropStatus::Live => Ok(drop),
            other => Err(AppError::Conflict(format!(
                "Cannot activate a {} drop",
                other.as_str()
            ))),
        }
    }

    /// Close out a live drop.
    pub async fn complete(&self, id: &str, now_ms: i64) -> AppResult<Drop> {
        if !drop_repo::complete(&self.pool, id, now_ms).await? {
            let drop = self.require(id).await?;
            if drop.status == DropStatus::Completed {
                return Ok(drop);
            }
            return Err(AppError::Conflict(format!(
                "Cannot complete a {} drop",
                drop.status.as_str()
            )));
        }
        info!(drop_id = %id, "Drop completed");
        self.require(id).await
    }

    /// Delete a drop and release its items. Live drops are protected.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let drop = self.require(id).await?;
        if !drop.status.deletable() {
            return Err(AppError::Conflict("Cannot delete a live drop".into()));
        }
        drop_repo::delete_with_unassign(&self.pool, id).await?;
        self.countdowns.remove(id);
        info!(drop_id = %id, "Drop deleted");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> AppResult<Drop> {
        self.require(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Drop>> {
        Ok(drop_repo::find_all(&self.pool).await?)
    }

    /// Admin board view: one bucket per lifecycle stage. Scheduled drops
    /// run soonest-first, live and completed newest-first.
    pub async fn list_grouped(&self) -> AppResult<DropBoard> {
        let mut board = DropBoard {
            live: Vec::new(),
            scheduled: Vec::new(),
            drafts: Vec::new(),
            completed: Vec::new(),
        };
        for drop in drop_repo::find_all(&self.pool).await? {
            match drop.status {
                DropStatus::Live => board.live.push(drop),
                DropStatus::Scheduled => board.scheduled.push(drop),
                DropStatus::Draft => board.drafts.push(drop),
                DropStatus::Completed => board.completed.push(drop),
            }
        }
        board.scheduled.sort_by_key(|d| d.scheduled_at);
        board.live.sort_by_key(|d| std::cmp::Reverse(d.activated_at));
        board.completed.sort_by_key(|d| std::cmp::Reverse(d.completed_at));
        Ok(board)
    }

    async fn require(&self, id: &str) -> AppResult<Drop> {
        drop_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Drop {id} not found")))
    }

    /// Distinguish "gone" from "wrong state" after a guarded update matched
    /// nothing.
    async fn not_scheduled(&self, id: &str) -> AppResult<AppError> {
        let drop = self.require(id).await?;
        Ok(AppError::Conflict(format!(
            "Drop is {}, not scheduled",
            drop.status.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{ItemCondition, ItemCreate};
    use shared::util::now_millis;

    async fn setup() -> DropService {
        let db = DbService::in_memory().await.unwrap();
        DropService::new(db.pool, CountdownTracker::default())
    }

    async fn seed_item(service: &DropService, name: &str) -> String {
        let item = item_repo::create(
            &service.pool,
            ItemCreate {
                name: name.to_string(),
                description: String::new(),
                price: 30.0,
                cost: 10.0,
                category: "hoodie".to_string(),
                size: "L".to_string(),
                condition: ItemCondition::Good,
                images: vec!["https://img.test/1.jpg".to_string()],
            },
        )
        .await
        .unwrap();
        item.id
    }

    fn draft_save(name: &str, item_ids: Vec<String>) -> DropSave {
        DropSave {
            name: name.to_string(),
            description: None,
            item_ids,
            schedule_type: ScheduleType::Draft,
            scheduled_at: None,
        }
    }

    /// Both sides of the assignment relation must agree.
    async fn assert_assignments_consistent(service: &DropService) {
        let drops = drop_repo::find_all(&service.pool).await.unwrap();
        let items = item_repo::find_all(&service.pool).await.unwrap();
        for drop in &drops {
            for item_id in &drop.item_ids {
                let item = items.iter().find(|i| &i.id == item_id).unwrap();
                assert_eq!(item.drop_id.as_deref(), Some(drop.id.as_str()));
            }
        }
        for item in &items {
            if let Some(drop_id) = &item.drop_id {
                let drop = drops.iter().find(|d| &d.id == drop_id).unwrap();
                assert!(drop.item_ids.contains(&item.id));
            }
        }
    }

    #[tokio::test]
    async fn save_rejects_empty_name_and_bad_item_counts() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Hokies Hoodie").await;

        let err = service
            .save(None, draft_save("   ", vec![item.clone()]), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .save(None, draft_save("Empty", vec![]), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut eleven = vec![item];
        for i in 0..10 {
            eleven.push(seed_item(&service, &format!("Item {i}")).await);
        }
        let err = service
            .save(None, draft_save("Too many", eleven), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn save_allows_one_and_ten_items() {
        let service = setup().await;
        let now = now_millis();

        let one = vec![seed_item(&service, "Solo").await];
        let drop = service.save(None, draft_save("One", one), now).await.unwrap();
        assert_eq!(drop.item_ids.len(), 1);

        let mut ten = Vec::new();
        for i in 0..10 {
            ten.push(seed_item(&service, &format!("Ten {i}")).await);
        }
        let drop = service.save(None, draft_save("Ten", ten), now).await.unwrap();
        assert_eq!(drop.item_ids.len(), 10);
        assert_assignments_consistent(&service).await;
    }

    #[tokio::test]
    async fn scheduling_requires_future_time() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Jacket").await;

        let save = DropSave {
            name: "Past".to_string(),
            description: None,
            item_ids: vec![item.clone()],
            schedule_type: ScheduleType::Schedule,
            scheduled_at: Some(now - 1),
        };
        let err = service.save(None, save, now).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let save = DropSave {
            name: "Future".to_string(),
            description: None,
            item_ids: vec![item],
            schedule_type: ScheduleType::Schedule,
            scheduled_at: Some(now + 60_000),
        };
        let drop = service.save(None, save, now).await.unwrap();
        assert_eq!(drop.status, DropStatus::Scheduled);
        assert_eq!(drop.scheduled_at, Some(now + 60_000));
    }

    #[tokio::test]
    async fn item_cannot_join_two_drops() {
        let service = setup().await;
        let now = now_millis();
        let shared_item = seed_item(&service, "Contested").await;

        service
            .save(None, draft_save("First", vec![shared_item.clone()]), now)
            .await
            .unwrap();
        let err = service
            .save(None, draft_save("Second", vec![shared_item]), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_assignments_consistent(&service).await;
    }

    #[tokio::test]
    async fn racing_saves_leave_the_item_with_the_last_writer() {
        let service = setup().await;
        let now = now_millis();
        let contested = seed_item(&service, "Contested").await;

        // Two editors passed the free-item check before either wrote.
        // Replay both writes at the repository level; the second must take
        // sole ownership on both sides of the relation.
        let claim = |id: &str| Drop {
            id: id.to_string(),
            name: format!("Drop {id}"),
            description: None,
            status: DropStatus::Draft,
            item_ids: vec![contested.clone()],
            scheduled_at: None,
            activated_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        drop_repo::save_with_assignments(&service.pool, &claim("drop_a"))
            .await
            .unwrap();
        drop_repo::save_with_assignments(&service.pool, &claim("drop_b"))
            .await
            .unwrap();

        let item = item_repo::find_by_id(&service.pool, &contested)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.drop_id.as_deref(), Some("drop_b"));

        let loser = drop_repo::find_by_id(&service.pool, "drop_a")
            .await
            .unwrap()
            .unwrap();
        assert!(loser.item_ids.is_empty());
        let winner = drop_repo::find_by_id(&service.pool, "drop_b")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(winner.item_ids, vec![contested]);
        assert_assignments_consistent(&service).await;
    }

    #[tokio::test]
    async fn editing_reassigns_by_diff() {
        let service = setup().await;
        let now = now_millis();
        let keep = seed_item(&service, "Keep").await;
        let removed = seed_item(&service, "Removed").await;
        let added = seed_item(&service, "Added").await;

        let drop = service
            .save(None, draft_save("Edit me", vec![keep.clone(), removed.clone()]), now)
            .await
            .unwrap();
        service
            .save(
                Some(drop.id.clone()),
                draft_save("Edit me", vec![keep.clone(), added.clone()]),
                now + 1,
            )
            .await
            .unwrap();

        let freed = item_repo::find_by_id(&service.pool, &removed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(freed.drop_id, None);
        let claimed = item_repo::find_by_id(&service.pool, &added)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.drop_id, Some(drop.id.clone()));
        assert_assignments_consistent(&service).await;
    }

    #[tokio::test]
    async fn activate_is_idempotent_and_guarded() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Tee").await;
        let save = DropSave {
            name: "Launch".to_string(),
            description: None,
            item_ids: vec![item],
            schedule_type: ScheduleType::Schedule,
            scheduled_at: Some(now + 60_000),
        };
        let drop = service.save(None, save, now).await.unwrap();

        let live = service.activate(&drop.id, now + 60_000).await.unwrap();
        assert_eq!(live.status, DropStatus::Live);
        assert_eq!(live.activated_at, Some(now + 60_000));

        // Second activation keeps the original timestamp
        let again = service.activate(&drop.id, now + 61_000).await.unwrap();
        assert_eq!(again.activated_at, Some(now + 60_000));

        let err = service
            .complete(&drop.id, now + 62_000)
            .await
            .map(|_| ())
            .and(service.activate(&drop.id, now + 63_000).await.map(|_| ()))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn schedule_moves_a_draft_onto_the_calendar() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Crewneck").await;
        let drop = service
            .save(None, draft_save("Later", vec![item]), now)
            .await
            .unwrap();

        let err = service.schedule(&drop.id, now - 1, now).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let scheduled = service.schedule(&drop.id, now + 60_000, now).await.unwrap();
        assert_eq!(scheduled.status, DropStatus::Scheduled);
        assert_eq!(scheduled.scheduled_at, Some(now + 60_000));

        // Already scheduled; the draft guard rejects a second schedule
        let err = service
            .schedule(&drop.id, now + 90_000, now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // But the release time can still be moved
        let moved = service
            .reschedule(&drop.id, now + 90_000, now)
            .await
            .unwrap();
        assert_eq!(moved.scheduled_at, Some(now + 90_000));
    }

    #[tokio::test]
    async fn cancel_returns_drop_to_draft() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Hat").await;
        let save = DropSave {
            name: "Maybe".to_string(),
            description: None,
            item_ids: vec![item],
            schedule_type: ScheduleType::Schedule,
            scheduled_at: Some(now + 60_000),
        };
        let drop = service.save(None, save, now).await.unwrap();

        let draft = service.cancel_schedule(&drop.id, now + 1).await.unwrap();
        assert_eq!(draft.status, DropStatus::Draft);
        assert_eq!(draft.scheduled_at, None);

        // Cancelling a draft is a conflict
        let err = service.cancel_schedule(&drop.id, now + 2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn live_drops_cannot_be_deleted_or_edited() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Jersey").await;
        let save = DropSave {
            name: "Hot".to_string(),
            description: None,
            item_ids: vec![item.clone()],
            schedule_type: ScheduleType::Now,
            scheduled_at: None,
        };
        let drop = service.save(None, save, now).await.unwrap();
        assert_eq!(drop.status, DropStatus::Live);

        let err = service.delete(&drop.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service
            .save(Some(drop.id.clone()), draft_save("Hot", vec![item]), now + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Completed drops can go
        service.complete(&drop.id, now + 2).await.unwrap();
        service.delete(&drop.id).await.unwrap();
        assert_assignments_consistent(&service).await;
    }

    #[tokio::test]
    async fn deleting_a_draft_frees_its_items() {
        let service = setup().await;
        let now = now_millis();
        let item = seed_item(&service, "Freed").await;
        let drop = service
            .save(None, draft_save("Doomed", vec![item.clone()]), now)
            .await
            .unwrap();

        service.delete(&drop.id).await.unwrap();
        let freed = item_repo::find_by_id(&service.pool, &item)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(freed.drop_id, None);
    }

    #[tokio::test]
    async fn board_groups_by_stage() {
        let service = setup().await;
        let now = now_millis();
        let a = seed_item(&service, "A").await;
        let b = seed_item(&service, "B").await;

        service.save(None, draft_save("Draft one", vec![a]), now).await.unwrap();
        let save = DropSave {
            name: "Live one".to_string(),
            description: None,
            item_ids: vec![b],
            schedule_type: ScheduleType::Now,
            scheduled_at: None,
        };
        service.save(None, save, now).await.unwrap();

        let board = service.list_grouped().await.unwrap();
        assert_eq!(board.drafts.len(), 1);
        assert_eq!(board.live.len(), 1);
        assert!(board.scheduled.is_empty());
        assert!(board.completed.is_empty());
    }
}
