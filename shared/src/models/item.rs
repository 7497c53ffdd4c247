//! Inventory Item Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Physical condition of a second-hand item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCondition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ItemCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCondition::Excellent => "excellent",
            ItemCondition::Good => "good",
            ItemCondition::Fair => "fair",
            ItemCondition::Poor => "poor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "excellent" => Some(ItemCondition::Excellent),
            "good" => Some(ItemCondition::Good),
            "fair" => Some(ItemCondition::Fair),
            "poor" => Some(ItemCondition::Poor),
            _ => None,
        }
    }
}

/// Inventory item entity
///
/// `drop_id` is the item's side of the assignment relation; it is only ever
/// written by the assignment engine, together with the drop's member set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Retail price in currency unit
    pub price: f64,
    /// What the shop paid for the item (consignment payout)
    pub cost: f64,
    pub category: String,
    pub size: String,
    pub condition: ItemCondition,
    /// Ordered image references; the first one is the main photo
    pub images: Vec<String>,
    pub available: bool,
    /// Owning drop, if any (None = unassigned)
    pub drop_id: Option<String>,
    /// Back-reference to the seller submission that spawned this item
    pub submission_id: Option<String>,
    /// Unix millis
    pub created_at: i64,
}

/// Create item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemCreate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, message = "price must not be negative"))]
    pub price: f64,
    /// Defaults to 0 when omitted
    #[serde(default)]
    #[validate(range(min = 0.0, message = "cost must not be negative"))]
    pub cost: f64,
    pub category: String,
    pub size: String,
    pub condition: ItemCondition,
    #[validate(length(min = 1, message = "at least one image is required"))]
    pub images: Vec<String>,
}

/// Update item payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub condition: Option<ItemCondition>,
    pub images: Option<Vec<String>>,
    pub available: Option<bool>,
}
