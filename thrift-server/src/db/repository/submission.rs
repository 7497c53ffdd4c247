//! Seller Submission Repository

use std::collections::HashMap;

use shared::models::{InventoryItem, SellerSubmission, SubmissionCreate, SubmissionStatus};
use shared::util::{entity_id, now_millis};
use sqlx::{FromRow, SqlitePool};

use super::{item, RepoResult};

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    item_type: String,
    description: String,
    condition: String,
    era: String,
    estimate: String,
    status: String,
    admin_price: Option<f64>,
    admin_notes: Option<String>,
    reviewed_at: Option<i64>,
    seller_approved_at: Option<i64>,
    created_at: i64,
}

impl SubmissionRow {
    fn into_submission(self, photos: Vec<String>) -> SellerSubmission {
        SellerSubmission {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            item_type: self.item_type,
            description: self.description,
            condition: self.condition,
            era: self.era,
            estimate: self.estimate,
            photos,
            status: SubmissionStatus::parse(&self.status).unwrap_or(SubmissionStatus::PendingAdmin),
            admin_price: self.admin_price,
            admin_notes: self.admin_notes,
            reviewed_at: self.reviewed_at,
            seller_approved_at: self.seller_approved_at,
            created_at: self.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, email, phone, item_type, description, condition, \
     era, estimate, status, admin_price, admin_notes, reviewed_at, seller_approved_at, created_at \
     FROM seller_submission";

async fn load_photos(pool: &SqlitePool, ids: &[String]) -> RepoResult<HashMap<String, Vec<String>>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT submission_id, url FROM submission_photo \
         WHERE submission_id IN ({placeholders}) ORDER BY submission_id, position"
    );
    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    for (submission_id, url) in query.fetch_all(pool).await? {
        map.entry(submission_id).or_default().push(url);
    }
    Ok(map)
}

/// Persist a new submission from the public form.
pub async fn create(
    pool: &SqlitePool,
    data: SubmissionCreate,
    estimate: String,
) -> RepoResult<SellerSubmission> {
    let submission = SellerSubmission {
        id: entity_id("sub"),
        name: data.name,
        email: data.email,
        phone: data.phone,
        item_type: data.item_type,
        description: data.description,
        condition: data.condition,
        era: data.era,
        estimate,
        photos: data.photos,
        status: SubmissionStatus::PendingAdmin,
        admin_price: None,
        admin_notes: None,
        reviewed_at: None,
        seller_approved_at: None,
        created_at: now_millis(),
    };

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO seller_submission \
         (id, name, email, phone, item_type, description, condition, era, estimate, status, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&submission.id)
    .bind(&submission.name)
    .bind(&submission.email)
    .bind(&submission.phone)
    .bind(&submission.item_type)
    .bind(&submission.description)
    .bind(&submission.condition)
    .bind(&submission.era)
    .bind(&submission.estimate)
    .bind(submission.status.as_str())
    .bind(submission.created_at)
    .execute(&mut *tx)
    .await?;

    for (position, url) in submission.photos.iter().enumerate() {
        sqlx::query("INSERT INTO submission_photo (submission_id, position, url) VALUES (?, ?, ?)")
            .bind(&submission.id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(submission)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<SellerSubmission>> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = sqlx::query_as::<_, SubmissionRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let mut photos = load_photos(pool, std::slice::from_ref(&row.id)).await?;
            let urls = photos.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_submission(urls)))
        }
        None => Ok(None),
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<SellerSubmission>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, SubmissionRow>(&sql)
        .fetch_all(pool)
        .await?;
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut photos = load_photos(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let urls = photos.remove(&row.id).unwrap_or_default();
            row.into_submission(urls)
        })
        .collect())
}

/// Guarded pending_admin -> pending_seller transition (the admin's offer).
pub async fn admin_review(
    pool: &SqlitePool,
    id: &str,
    price: f64,
    notes: Option<&str>,
    now_ms: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE seller_submission SET status = 'pending_seller', admin_price = ?, \
         admin_notes = ?, reviewed_at = ? WHERE id = ? AND status = 'pending_admin'",
    )
    .bind(price)
    .bind(notes)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Guarded pending_seller -> approved transition; inserts the spawned
/// inventory item in the same transaction so a submission can never be
/// approved without its item (or vice versa).
pub async fn approve_with_item(
    pool: &SqlitePool,
    id: &str,
    spawned: &InventoryItem,
    now_ms: i64,
) -> RepoResult<bool> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE seller_submission SET status = 'approved', seller_approved_at = ? \
         WHERE id = ? AND status = 'pending_seller'",
    )
    .bind(now_ms)
    .bind(id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(false);
    }

    item::insert(&mut tx, spawned).await?;
    tx.commit().await?;
    Ok(true)
}

/// Guarded rejection from either pending state. The reason lands in
/// `admin_notes`; an earlier review timestamp is preserved.
pub async fn reject(pool: &SqlitePool, id: &str, reason: &str, now_ms: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE seller_submission SET status = 'rejected', admin_notes = ?, \
         reviewed_at = COALESCE(reviewed_at, ?) \
         WHERE id = ? AND status IN ('pending_admin', 'pending_seller')",
    )
    .bind(reason)
    .bind(now_ms)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
