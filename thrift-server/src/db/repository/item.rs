//! Inventory Item Repository

use std::collections::HashMap;

use shared::models::{InventoryItem, ItemCondition, ItemCreate, ItemUpdate};
use shared::util::{entity_id, now_millis};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
struct ItemRow {
    id: String,
    name: String,
    description: String,
    price: f64,
    cost: f64,
    category: String,
    size: String,
    condition: String,
    available: bool,
    drop_id: Option<String>,
    submission_id: Option<String>,
    created_at: i64,
}

impl ItemRow {
    fn into_item(self, images: Vec<String>) -> InventoryItem {
        InventoryItem {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            cost: self.cost,
            category: self.category,
            size: self.size,
            // Defaulting for rows written before the enum was closed
            condition: ItemCondition::parse(&self.condition).unwrap_or(ItemCondition::Good),
            images,
            available: self.available,
            drop_id: self.drop_id,
            submission_id: self.submission_id,
            created_at: self.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, cost, category, size, \
     condition, available, drop_id, submission_id, created_at FROM inventory_item";

/// Load image lists for a set of items, keyed by item id.
async fn load_images(pool: &SqlitePool, ids: &[String]) -> RepoResult<HashMap<String, Vec<String>>> {
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    if ids.is_empty() {
        return Ok(map);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT item_id, url FROM item_image WHERE item_id IN ({placeholders}) ORDER BY item_id, position"
    );
    let mut query = sqlx::query_as::<_, (String, String)>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    for (item_id, url) in query.fetch_all(pool).await? {
        map.entry(item_id).or_default().push(url);
    }
    Ok(map)
}

async fn attach_images(pool: &SqlitePool, rows: Vec<ItemRow>) -> RepoResult<Vec<InventoryItem>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut images = load_images(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let imgs = images.remove(&row.id).unwrap_or_default();
            row.into_item(imgs)
        })
        .collect())
}

/// Insert a fully-constructed item inside an open transaction.
///
/// Used by `create` and by the submission workflow, which spawns an item
/// in the same transaction that flips the submission to `approved`.
pub async fn insert(conn: &mut SqliteConnection, item: &InventoryItem) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO inventory_item \
         (id, name, description, price, cost, category, size, condition, available, drop_id, submission_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&item.id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price)
    .bind(item.cost)
    .bind(&item.category)
    .bind(&item.size)
    .bind(item.condition.as_str())
    .bind(item.available)
    .bind(&item.drop_id)
    .bind(&item.submission_id)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, url) in item.images.iter().enumerate() {
        sqlx::query("INSERT INTO item_image (item_id, position, url) VALUES (?, ?, ?)")
            .bind(&item.id)
            .bind(position as i64)
            .bind(url)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Create a new inventory item (admin action)
pub async fn create(pool: &SqlitePool, data: ItemCreate) -> RepoResult<InventoryItem> {
    let item = InventoryItem {
        id: entity_id("item"),
        name: data.name,
        description: data.description,
        price: data.price,
        cost: data.cost,
        category: data.category,
        size: data.size,
        condition: data.condition,
        images: data.images,
        available: true,
        drop_id: None,
        submission_id: None,
        created_at: now_millis(),
    };

    let mut tx = pool.begin().await?;
    insert(&mut tx, &item).await?;
    tx.commit().await?;
    Ok(item)
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<InventoryItem>> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = sqlx::query_as::<_, ItemRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let images = load_images(pool, std::slice::from_ref(&row.id)).await?;
            let imgs = images.into_values().next().unwrap_or_default();
            Ok(Some(row.into_item(imgs)))
        }
        None => Ok(None),
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<InventoryItem>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ItemRow>(&sql).fetch_all(pool).await?;
    attach_images(pool, rows).await
}

/// Items not assigned to any drop (candidates for the drop editor)
pub async fn find_unassigned(pool: &SqlitePool) -> RepoResult<Vec<InventoryItem>> {
    let sql = format!("{SELECT_COLUMNS} WHERE drop_id IS NULL ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, ItemRow>(&sql).fetch_all(pool).await?;
    attach_images(pool, rows).await
}

pub async fn find_by_ids(pool: &SqlitePool, ids: &[String]) -> RepoResult<Vec<InventoryItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("{SELECT_COLUMNS} WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, ItemRow>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    let rows = query.fetch_all(pool).await?;
    attach_images(pool, rows).await
}

/// Partial update of item fields; images, when present, replace the whole list
pub async fn update(pool: &SqlitePool, id: &str, data: ItemUpdate) -> RepoResult<InventoryItem> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        "UPDATE inventory_item SET \
         name = COALESCE(?1, name), \
         description = COALESCE(?2, description), \
         price = COALESCE(?3, price), \
         cost = COALESCE(?4, cost), \
         category = COALESCE(?5, category), \
         size = COALESCE(?6, size), \
         condition = COALESCE(?7, condition), \
         available = COALESCE(?8, available) \
         WHERE id = ?9",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.cost)
    .bind(&data.category)
    .bind(&data.size)
    .bind(data.condition.map(|c| c.as_str()))
    .bind(data.available)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {id} not found")));
    }

    if let Some(images) = &data.images {
        sqlx::query("DELETE FROM item_image WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for (position, url) in images.iter().enumerate() {
            sqlx::query("INSERT INTO item_image (item_id, position, url) VALUES (?, ?, ?)")
                .bind(id)
                .bind(position as i64)
                .bind(url)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Item {id} not found")))
}

/// Toggle availability (mark sold / mark available)
pub async fn set_available(pool: &SqlitePool, id: &str, available: bool) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE inventory_item SET available = ? WHERE id = ?")
        .bind(available)
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {id} not found")));
    }
    Ok(())
}

/// Hard delete; cascades remove its images and any drop membership rows.
pub async fn delete(pool: &SqlitePool, id: &str) -> RepoResult<()> {
    let rows = sqlx::query("DELETE FROM inventory_item WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Item {id} not found")));
    }
    Ok(())
}
