//! Drop Model
//!
//! A drop is a time-boxed release of 1-10 inventory items. Status moves
//! through a fixed order (draft, scheduled, live, completed, with
//! scheduled drops cancellable back to draft); each transition is enforced
//! by a single guarded update in the assignment engine's repository.

use serde::{Deserialize, Serialize};

/// Drop lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropStatus {
    Draft,
    Scheduled,
    Live,
    Completed,
}

impl DropStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropStatus::Draft => "draft",
            DropStatus::Scheduled => "scheduled",
            DropStatus::Live => "live",
            DropStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(DropStatus::Draft),
            "scheduled" => Some(DropStatus::Scheduled),
            "live" => Some(DropStatus::Live),
            "completed" => Some(DropStatus::Completed),
            _ => None,
        }
    }

    /// Live drops must be completed before they can be removed.
    pub fn deletable(&self) -> bool {
        !matches!(self, DropStatus::Live)
    }
}

/// Drop entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drop {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: DropStatus,
    /// Member item ids (1-10 while draft/scheduled/live)
    pub item_ids: Vec<String>,
    /// Unix millis; set only while scheduled
    pub scheduled_at: Option<i64>,
    /// Unix millis; set when the drop went live
    pub activated_at: Option<i64>,
    /// Unix millis; set when the drop completed
    pub completed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// How a drop should be released when saved from the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleType {
    /// Keep as draft
    Draft,
    /// Schedule for a future date
    Schedule,
    /// Go live immediately
    Now,
}

/// Save payload for the drop editor (used for both create and edit)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropSave {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub item_ids: Vec<String>,
    pub schedule_type: ScheduleType,
    /// Required (and must be in the future) when `schedule_type` is `schedule`
    #[serde(default)]
    pub scheduled_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_live_is_protected_from_delete() {
        assert!(DropStatus::Draft.deletable());
        assert!(DropStatus::Scheduled.deletable());
        assert!(!DropStatus::Live.deletable());
        assert!(DropStatus::Completed.deletable());
    }
}
