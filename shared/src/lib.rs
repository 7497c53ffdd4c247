//! Hokies Thrift - shared domain types
//!
//! Entities, create/update payloads and status enums used by both the
//! storefront server and any future admin tooling. These are plain serde
//! types; persistence concerns stay in `thrift-server`.

pub mod models;
pub mod util;

// Re-export the entities most callers need
pub use models::{
    Drop, DropSave, DropStatus, InventoryItem, ItemCondition, ItemCreate, ItemUpdate, Order,
    OrderCreate, OrderStatus, ScheduleType, SellerSubmission, SubmissionCreate, SubmissionStatus,
};
