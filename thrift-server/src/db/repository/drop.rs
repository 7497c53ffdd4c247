//! Drop Repository
//!
//! The assignment relation is stored twice (`inventory_item.drop_id` and
//! `drop_item`) so both "items of this drop" and "drop of this item" are
//! single-index lookups. Every write that touches the relation goes through
//! `save_with_assignments` or `delete_with_unassign`, each a single
//! transaction, so the two sides cannot drift.

use std::collections::HashMap;

use shared::models::{Drop, DropStatus};
use sqlx::{FromRow, SqlitePool};

use super::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
struct DropRow {
    id: String,
    name: String,
    description: Option<String>,
    status: String,
    scheduled_at: Option<i64>,
    activated_at: Option<i64>,
    completed_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl DropRow {
    fn into_drop(self, item_ids: Vec<String>) -> Drop {
        Drop {
            id: self.id,
            name: self.name,
            description: self.description,
            status: DropStatus::parse(&self.status).unwrap_or(DropStatus::Draft),
            item_ids,
            scheduled_at: self.scheduled_at,
            activated_at: self.activated_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, status, scheduled_at, \
     activated_at, completed_at, created_at, updated_at FROM drops";

async fn load_item_ids(
    pool: &SqlitePool,
    drop_ids: &[String],
) -> RepoResult<HashMap<String, Vec<String>>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    if drop_ids.is_empty() {
        return Ok(map);
    }
    let placeholders = vec!["?"; drop_ids.len()].join(", ");
    let sql = format!(
        "SELECT drop_id, item_id FROM drop_item WHERE drop_id IN ({placeholders}) ORDER BY item_id"
    );
    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for id in drop_ids {
        query = query.bind(id);
    }
    for (drop_id, item_id) in query.fetch_all(pool).await? {
        map.entry(drop_id).or_default().push(item_id);
    }
    Ok(map)
}

async fn attach_item_ids(pool: &SqlitePool, rows: Vec<DropRow>) -> RepoResult<Vec<Drop>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut members = load_item_ids(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let item_ids = members.remove(&row.id).unwrap_or_default();
            row.into_drop(item_ids)
        })
        .collect())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Drop>> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = sqlx::query_as::<_, DropRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let mut members = load_item_ids(pool, std::slice::from_ref(&row.id)).await?;
            let item_ids = members.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_drop(item_ids)))
        }
        None => Ok(None),
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Drop>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DropRow>(&sql).fetch_all(pool).await?;
    attach_item_ids(pool, rows).await
}

pub async fn find_by_status(pool: &SqlitePool, status: DropStatus) -> RepoResult<Vec<Drop>> {
    let sql = format!("{SELECT_COLUMNS} WHERE status = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, DropRow>(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;
    attach_item_ids(pool, rows).await
}

/// Scheduled drops whose release time has arrived.
pub async fn due_scheduled(pool: &SqlitePool, now_ms: i64) -> RepoResult<Vec<Drop>> {
    let sql = format!(
        "{SELECT_COLUMNS} WHERE status = 'scheduled' AND scheduled_at IS NOT NULL \
         AND scheduled_at <= ? ORDER BY scheduled_at"
    );
    let rows = sqlx::query_as::<_, DropRow>(&sql)
        .bind(now_ms)
        .fetch_all(pool)
        .await?;
    attach_item_ids(pool, rows).await
}

/// Ids of live drops whose member set is non-empty and fully sold out.
pub async fn live_fully_sold(pool: &SqlitePool) -> RepoResult<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT d.id FROM drops d \
         WHERE d.status = 'live' \
           AND EXISTS (SELECT 1 FROM drop_item di WHERE di.drop_id = d.id) \
           AND NOT EXISTS ( \
               SELECT 1 FROM drop_item di \
               JOIN inventory_item i ON i.id = di.item_id \
               WHERE di.drop_id = d.id AND i.available = 1)",
    )
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Upsert the drop row and bring the assignment relation in line with
/// `drop.item_ids`: items leaving the drop get `drop_id` cleared, items
/// joining get it set, and the `drop_item` rows are rewritten. Claimed
/// items also lose any membership row another drop still holds, so two
/// saves racing on the same item resolve to the last writer owning it on
/// both sides. One transaction end to end.
pub async fn save_with_assignments(pool: &SqlitePool, drop: &Drop) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO drops \
         (id, name, description, status, scheduled_at, activated_at, completed_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         ON CONFLICT(id) DO UPDATE SET \
         name = ?2, description = ?3, status = ?4, scheduled_at = ?5, \
         activated_at = ?6, completed_at = ?7, updated_at = ?9",
    )
    .bind(&drop.id)
    .bind(&drop.name)
    .bind(&drop.description)
    .bind(drop.status.as_str())
    .bind(drop.scheduled_at)
    .bind(drop.activated_at)
    .bind(drop.completed_at)
    .bind(drop.created_at)
    .bind(drop.updated_at)
    .execute(&mut *tx)
    .await?;

    // Clear items removed from the drop
    if drop.item_ids.is_empty() {
        sqlx::query("UPDATE inventory_item SET drop_id = NULL WHERE drop_id = ?")
            .bind(&drop.id)
            .execute(&mut *tx)
            .await?;
    } else {
        let placeholders = vec!["?"; drop.item_ids.len()].join(", ");
        let sql = format!(
            "UPDATE inventory_item SET drop_id = NULL WHERE drop_id = ?1 AND id NOT IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(&drop.id);
        for item_id in &drop.item_ids {
            query = query.bind(item_id);
        }
        query.execute(&mut *tx).await?;
    }

    // Claim the current members; a missing item aborts the whole save
    for item_id in &drop.item_ids {
        let rows = sqlx::query("UPDATE inventory_item SET drop_id = ? WHERE id = ?")
            .bind(&drop.id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        if rows.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Item {item_id} not found")));
        }
    }

    // Evict claimed items from any other drop's member rows; the pre-save
    // conflict check runs outside this transaction and can lose a race.
    if !drop.item_ids.is_empty() {
        let placeholders = vec!["?"; drop.item_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM drop_item WHERE drop_id != ? AND item_id IN ({placeholders})"
        );
        let mut query = sqlx::query(&sql).bind(&drop.id);
        for item_id in &drop.item_ids {
            query = query.bind(item_id);
        }
        query.execute(&mut *tx).await?;
    }

    sqlx::query("DELETE FROM drop_item WHERE drop_id = ?")
        .bind(&drop.id)
        .execute(&mut *tx)
        .await?;
    for item_id in &drop.item_ids {
        sqlx::query("INSERT INTO drop_item (drop_id, item_id) VALUES (?, ?)")
            .bind(&drop.id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Guarded draft -> scheduled transition.
pub async fn schedule(
    pool: &SqlitePool,
    id: &str,
    scheduled_at: i64,
    now_ms: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE drops SET status = 'scheduled', scheduled_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'draft'",
    )
    .bind(scheduled_at)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded scheduled -> live transition. Returns false when the drop was
/// not in `scheduled` (already activated or otherwise moved on).
pub async fn activate(pool: &SqlitePool, id: &str, now_ms: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE drops SET status = 'live', activated_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'scheduled'",
    )
    .bind(now_ms)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded live -> completed transition.
pub async fn complete(pool: &SqlitePool, id: &str, now_ms: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE drops SET status = 'completed', completed_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'live'",
    )
    .bind(now_ms)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded scheduled -> draft transition; also forgets the release time.
pub async fn cancel_schedule(pool: &SqlitePool, id: &str, now_ms: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE drops SET status = 'draft', scheduled_at = NULL, updated_at = ? \
         WHERE id = ? AND status = 'scheduled'",
    )
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Move the release time of an already-scheduled drop.
pub async fn reschedule(
    pool: &SqlitePool,
    id: &str,
    scheduled_at: i64,
    now_ms: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE drops SET scheduled_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'scheduled'",
    )
    .bind(scheduled_at)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Delete the drop and release its items back to the unassigned pool.
pub async fn delete_with_unassign(pool: &SqlitePool, id: &str) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE inventory_item SET drop_id = NULL WHERE drop_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let rows = sqlx::query("DELETE FROM drops WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Drop {id} not found")));
    }

    tx.commit().await?;
    Ok(())
}
