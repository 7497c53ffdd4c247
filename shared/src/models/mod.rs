//! Domain models
//!
//! Entity + Create/Update payload per resource, with closed status enums.
//! Transition validity for the two state machines lives on the enums
//! themselves so call sites never re-derive it.

mod drop;
mod item;
mod order;
mod submission;

pub use drop::{Drop, DropSave, DropStatus, ScheduleType};
pub use item::{InventoryItem, ItemCondition, ItemCreate, ItemUpdate};
pub use order::{
    Order, OrderCreate, OrderLineItem, OrderStatus, ShippingAddress, ShippingLabel,
};
pub use submission::{
    SellerSubmission, SubmissionCreate, SubmissionReview, SubmissionStatus,
};
