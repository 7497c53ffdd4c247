//! Checkout
//!
//! One-of-a-kind inventory: every checkout races every other shopper for
//! the same physical items. The charge happens first, then the order and
//! the sold flags land in one transaction. The shipping label is best
//! effort; a label failure never loses a paid order.

use std::sync::Arc;

use shared::models::{Order, OrderCreate, OrderLineItem, OrderStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repository::{item as item_repo, order as order_repo};
use crate::providers::{PaymentProvider, ShippingProvider};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    payment: Arc<dyn PaymentProvider>,
    shipping: Arc<dyn ShippingProvider>,
}

impl CheckoutService {
    pub fn new(
        pool: SqlitePool,
        payment: Arc<dyn PaymentProvider>,
        shipping: Arc<dyn ShippingProvider>,
    ) -> Self {
        Self {
            pool,
            payment,
            shipping,
        }
    }

    pub async fn place_order(&self, data: OrderCreate) -> AppResult<Order> {
        if data.item_ids.is_empty() {
            return Err(AppError::Validation("Cart is empty".into()));
        }
        if data.customer_name.trim().is_empty() || data.customer_email.trim().is_empty() {
            return Err(AppError::Validation(
                "Customer name and email are required".into(),
            ));
        }

        // Snapshot names and prices before charging
        let items = item_repo::find_by_ids(&self.pool, &data.item_ids).await?;
        let mut lines = Vec::with_capacity(data.item_ids.len());
        for wanted in &data.item_ids {
            let item = items
                .iter()
                .find(|i| &i.id == wanted)
                .ok_or_else(|| AppError::NotFound(format!("Item {wanted} not found")))?;
            if !item.available {
                return Err(AppError::Conflict(format!(
                    "{} is no longer available",
                    item.name
                )));
            }
            lines.push(OrderLineItem {
                item_id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
            });
        }
        let total: f64 = lines.iter().map(|l| l.price).sum();

        let order_id = Uuid::new_v4().to_string();
        let charge = self
            .payment
            .charge(
                total,
                &data.payment_method_id,
                &format!("Hokies Thrift order {order_id}"),
            )
            .await?;

        let mut order = Order {
            id: order_id,
            customer_name: data.customer_name,
            customer_email: data.customer_email,
            shipping_address: data.shipping_address,
            items: lines,
            total,
            status: OrderStatus::Paid,
            payment_reference: Some(charge.reference),
            shipping: None,
            created_at: now_millis(),
        };
        order_repo::create_with_sold_items(&self.pool, &order).await?;
        info!(order_id = %order.id, total, "Order placed");

        // Label purchase is best effort; the paid order stands either way
        match self
            .shipping
            .create_label(&order.customer_name, &order.shipping_address, &order.id)
            .await
        {
            Ok(label) => {
                order_repo::set_shipping_label(&self.pool, &order.id, &label).await?;
                order.shipping = Some(label);
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Shipping label failed, order kept");
            }
        }

        Ok(order)
    }

    pub async fn get(&self, id: &str) -> AppResult<Order> {
        order_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {id} not found")))
    }

    pub async fn list(&self) -> AppResult<Vec<Order>> {
        Ok(order_repo::find_all(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::providers::PaymentCharge;
    use async_trait::async_trait;
    use shared::models::{ItemCondition, ItemCreate, ShippingAddress, ShippingLabel};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakePayment {
        fail: bool,
        charges: AtomicUsize,
    }

    #[async_trait]
    impl PaymentProvider for FakePayment {
        async fn charge(
            &self,
            _amount: f64,
            _payment_method_id: &str,
            _description: &str,
        ) -> AppResult<PaymentCharge> {
            if self.fail {
                return Err(AppError::Provider("card declined".into()));
            }
            self.charges.fetch_add(1, Ordering::SeqCst);
            Ok(PaymentCharge {
                reference: "pi_test_123".to_string(),
            })
        }
    }

    struct FakeShipping {
        fail: bool,
    }

    #[async_trait]
    impl ShippingProvider for FakeShipping {
        async fn create_label(
            &self,
            _recipient_name: &str,
            _address: &ShippingAddress,
            order_id: &str,
        ) -> AppResult<ShippingLabel> {
            if self.fail {
                return Err(AppError::Provider("no rates".into()));
            }
            Ok(ShippingLabel {
                tracking_number: "9400TEST".to_string(),
                tracking_url: "https://track.test/9400TEST".to_string(),
                carrier: "usps".to_string(),
                service: "usps_priority".to_string(),
                cost: 8.50,
                label_url: format!("https://labels.test/{order_id}.pdf"),
                transaction_id: "txn_test".to_string(),
                created_at: 1_000,
            })
        }
    }

    async fn setup(payment_fails: bool, shipping_fails: bool) -> CheckoutService {
        let db = DbService::in_memory().await.unwrap();
        CheckoutService::new(
            db.pool,
            Arc::new(FakePayment {
                fail: payment_fails,
                charges: AtomicUsize::new(0),
            }),
            Arc::new(FakeShipping {
                fail: shipping_fails,
            }),
        )
    }

    async fn seed_item(service: &CheckoutService, name: &str, price: f64) -> String {
        let item = item_repo::create(
            &service.pool,
            ItemCreate {
                name: name.to_string(),
                description: String::new(),
                price,
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

    fn order_for(item_ids: Vec<String>) -> OrderCreate {
        OrderCreate {
            customer_name: "Pat Customer".to_string(),
            customer_email: "pat@example.com".to_string(),
            shipping_address: ShippingAddress {
                street: "100 Main St".to_string(),
                apt: String::new(),
                city: "Blacksburg".to_string(),
                state: "VA".to_string(),
                zip: "24060".to_string(),
            },
            item_ids,
            payment_method_id: "pm_test".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_checkout_snapshots_prices_and_sells_items() {
        let service = setup(false, false).await;
        let a = seed_item(&service, "Hoodie", 35.0).await;
        let b = seed_item(&service, "Hat", 12.0).await;

        let order = service.place_order(order_for(vec![a.clone(), b.clone()])).await.unwrap();
        assert_eq!(order.total, 47.0);
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_reference.as_deref(), Some("pi_test_123"));
        assert_eq!(order.items.len(), 2);
        assert!(order.shipping.is_some());

        for id in [&a, &b] {
            let item = item_repo::find_by_id(&service.pool, id).await.unwrap().unwrap();
            assert!(!item.available);
        }

        // Price snapshot survives later repricing
        let stored = service.get(&order.id).await.unwrap();
        assert_eq!(stored.items[0].price, 35.0);
    }

    #[tokio::test]
    async fn sold_items_cannot_be_bought_again() {
        let service = setup(false, false).await;
        let item = seed_item(&service, "One of one", 50.0).await;

        service.place_order(order_for(vec![item.clone()])).await.unwrap();
        let err = service.place_order(order_for(vec![item])).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn declined_payment_leaves_items_available() {
        let service = setup(true, false).await;
        let item = seed_item(&service, "Jacket", 60.0).await;

        let err = service.place_order(order_for(vec![item.clone()])).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));

        let stored = item_repo::find_by_id(&service.pool, &item).await.unwrap().unwrap();
        assert!(stored.available);
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn label_failure_keeps_the_paid_order() {
        let service = setup(false, true).await;
        let item = seed_item(&service, "Jersey", 45.0).await;

        let order = service.place_order(order_for(vec![item.clone()])).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.shipping.is_none());

        let stored = service.get(&order.id).await.unwrap();
        assert!(stored.shipping.is_none());
        let sold = item_repo::find_by_id(&service.pool, &item).await.unwrap().unwrap();
        assert!(!sold.available);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_charging() {
        let service = setup(false, false).await;
        let err = service.place_order(order_for(vec![])).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
