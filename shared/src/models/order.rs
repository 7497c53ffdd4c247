//! Order Model

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            _ => None,
        }
    }
}

/// Structured shipping address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub street: String,
    #[serde(default)]
    pub apt: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl ShippingAddress {
    /// Single-line rendering used on labels and in the admin panel.
    pub fn full(&self) -> String {
        if self.apt.is_empty() {
            format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
        } else {
            format!(
                "{}, {}, {}, {} {}",
                self.street, self.apt, self.city, self.state, self.zip
            )
        }
    }
}

/// Order line with price snapshot taken at checkout time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub item_id: String,
    pub name: String,
    pub price: f64,
}

/// Shipping label metadata returned by the label provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingLabel {
    pub tracking_number: String,
    pub tracking_url: String,
    pub carrier: String,
    pub service: String,
    /// Label cost in currency unit
    pub cost: f64,
    pub label_url: String,
    pub transaction_id: String,
    /// Unix millis
    pub created_at: i64,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderLineItem>,
    pub total: f64,
    pub status: OrderStatus,
    /// Payment provider reference (e.g. Stripe payment intent id)
    pub payment_reference: Option<String>,
    /// None when label creation failed; the order is kept either way
    pub shipping: Option<ShippingLabel>,
    pub created_at: i64,
}

/// Checkout payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: ShippingAddress,
    /// Item ids in the cart; prices are snapshotted server-side
    pub item_ids: Vec<String>,
    /// Opaque payment method token from the storefront
    pub payment_method_id: String,
}
