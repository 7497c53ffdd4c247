//! Order Repository

use std::collections::HashMap;

use shared::models::{Order, OrderLineItem, OrderStatus, ShippingAddress, ShippingLabel};
use sqlx::{FromRow, SqlitePool};

use super::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    customer_name: String,
    customer_email: String,
    ship_street: String,
    ship_apt: String,
    ship_city: String,
    ship_state: String,
    ship_zip: String,
    total: f64,
    status: String,
    payment_reference: Option<String>,
    tracking_number: Option<String>,
    tracking_url: Option<String>,
    carrier: Option<String>,
    service: Option<String>,
    label_cost: Option<f64>,
    label_url: Option<String>,
    label_transaction: Option<String>,
    label_created_at: Option<i64>,
    created_at: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderLineItem>) -> Order {
        let shipping = self.tracking_number.map(|tracking_number| ShippingLabel {
            tracking_number,
            tracking_url: self.tracking_url.unwrap_or_default(),
            carrier: self.carrier.unwrap_or_default(),
            service: self.service.unwrap_or_default(),
            cost: self.label_cost.unwrap_or(0.0),
            label_url: self.label_url.unwrap_or_default(),
            transaction_id: self.label_transaction.unwrap_or_default(),
            created_at: self.label_created_at.unwrap_or(0),
        });
        Order {
            id: self.id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            shipping_address: ShippingAddress {
                street: self.ship_street,
                apt: self.ship_apt,
                city: self.ship_city,
                state: self.ship_state,
                zip: self.ship_zip,
            },
            items,
            total: self.total,
            status: OrderStatus::parse(&self.status).unwrap_or(OrderStatus::Pending),
            payment_reference: self.payment_reference,
            shipping,
            created_at: self.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, customer_name, customer_email, ship_street, ship_apt, \
     ship_city, ship_state, ship_zip, total, status, payment_reference, tracking_number, \
     tracking_url, carrier, service, label_cost, label_url, label_transaction, label_created_at, \
     created_at FROM shop_order";

async fn load_lines(
    pool: &SqlitePool,
    order_ids: &[String],
) -> RepoResult<HashMap<String, Vec<OrderLineItem>>> {
    let mut map: HashMap<String, Vec<OrderLineItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(map);
    }
    let placeholders = vec!["?"; order_ids.len()].join(", ");
    let sql = format!(
        "SELECT order_id, item_id, name, price FROM order_line \
         WHERE order_id IN ({placeholders}) ORDER BY order_id, position"
    );
    let mut query = sqlx::query_as::<_, (String, String, String, f64)>(&sql);
    for id in order_ids {
        query = query.bind(id);
    }
    for (order_id, item_id, name, price) in query.fetch_all(pool).await? {
        map.entry(order_id).or_default().push(OrderLineItem {
            item_id,
            name,
            price,
        });
    }
    Ok(map)
}

/// Persist a fully-built order and mark every purchased item sold, all in
/// one transaction. An item that was snapped up in the meantime aborts the
/// whole order with a conflict.
pub async fn create_with_sold_items(pool: &SqlitePool, order: &Order) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO shop_order \
         (id, customer_name, customer_email, ship_street, ship_apt, ship_city, ship_state, \
          ship_zip, total, status, payment_reference, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.shipping_address.street)
    .bind(&order.shipping_address.apt)
    .bind(&order.shipping_address.city)
    .bind(&order.shipping_address.state)
    .bind(&order.shipping_address.zip)
    .bind(order.total)
    .bind(order.status.as_str())
    .bind(&order.payment_reference)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    for (position, line) in order.items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO order_line (order_id, position, item_id, name, price) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&order.id)
        .bind(position as i64)
        .bind(&line.item_id)
        .bind(&line.name)
        .bind(line.price)
        .execute(&mut *tx)
        .await?;

        let rows = sqlx::query("UPDATE inventory_item SET available = 0 WHERE id = ? AND available = 1")
            .bind(&line.item_id)
            .execute(&mut *tx)
            .await?;
        if rows.rows_affected() == 0 {
            return Err(RepoError::Conflict(format!(
                "Item {} is no longer available",
                line.item_id
            )));
        }
    }

    tx.commit().await?;
    Ok(())
}

/// Attach a shipping label produced after the order was saved.
pub async fn set_shipping_label(
    pool: &SqlitePool,
    order_id: &str,
    label: &ShippingLabel,
) -> RepoResult<()> {
    let rows = sqlx::query(
        "UPDATE shop_order SET tracking_number = ?, tracking_url = ?, carrier = ?, service = ?, \
         label_cost = ?, label_url = ?, label_transaction = ?, label_created_at = ? WHERE id = ?",
    )
    .bind(&label.tracking_number)
    .bind(&label.tracking_url)
    .bind(&label.carrier)
    .bind(&label.service)
    .bind(label.cost)
    .bind(&label.label_url)
    .bind(&label.transaction_id)
    .bind(label.created_at)
    .bind(order_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {order_id} not found")));
    }
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Order>> {
    let sql = format!("{SELECT_COLUMNS} WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let mut lines = load_lines(pool, std::slice::from_ref(&row.id)).await?;
            let items = lines.remove(&row.id).unwrap_or_default();
            Ok(Some(row.into_order(items)))
        }
        None => Ok(None),
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{SELECT_COLUMNS} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(pool).await?;
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut lines = load_lines(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let items = lines.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect())
}
