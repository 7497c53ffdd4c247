//! Seller Submission Model
//!
//! Consignment workflow: a seller offers an item, the admin prices it, the
//! seller accepts the offer. `approved` and `rejected` are terminal.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Submission workflow status
///
/// pending_admin -> pending_seller -> approved
/// pending_admin | pending_seller -> rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingAdmin,
    PendingSeller,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::PendingAdmin => "pending_admin",
            SubmissionStatus::PendingSeller => "pending_seller",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_admin" => Some(SubmissionStatus::PendingAdmin),
            "pending_seller" => Some(SubmissionStatus::PendingSeller),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

/// Seller submission entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub item_type: String,
    pub description: String,
    pub condition: String,
    pub era: String,
    /// Display-only payout range, e.g. "$25 - $45"
    pub estimate: String,
    /// 1-5 photo references
    pub photos: Vec<String>,
    pub status: SubmissionStatus,
    /// Offer made by the admin (what the shop pays the seller)
    pub admin_price: Option<f64>,
    pub admin_notes: Option<String>,
    /// Unix millis; set when the admin reviewed (offer or rejection)
    pub reviewed_at: Option<i64>,
    /// Unix millis; set when the seller accepted the offer
    pub seller_approved_at: Option<i64>,
    pub created_at: i64,
}

/// Public submission form payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmissionCreate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[validate(length(min = 1, message = "item type is required"))]
    pub item_type: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub condition: String,
    #[serde(default)]
    pub era: String,
    #[validate(length(min = 1, max = 5, message = "upload between 1 and 5 photos"))]
    pub photos: Vec<String>,
}

/// Admin review payload (price the item, optionally leave notes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReview {
    pub price: f64,
    #[serde(default)]
    pub notes: Option<String>,
}
