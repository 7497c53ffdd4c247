//! Drop API Handlers
//!
//! Release times cross the wire as RFC 3339 strings and are converted to
//! millisecond timestamps at this boundary.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use shared::models::{Drop, DropSave, ScheduleType};
use shared::util::{now_millis, rfc3339_to_millis};

use crate::core::ServerState;
use crate::drops::scheduler::CountdownView;
use crate::drops::DropBoard;
use crate::utils::{ok, ok_with_message, ApiResponse, AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct DropSaveRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub item_ids: Vec<String>,
    pub schedule_type: ScheduleType,
    /// RFC 3339, required when schedule_type is "schedule"
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    /// RFC 3339
    pub scheduled_at: String,
}

#[derive(Debug, serde::Serialize)]
pub struct DropCountdown {
    pub drop_id: String,
    #[serde(flatten)]
    pub remaining: CountdownView,
}

fn parse_release_time(value: Option<&str>) -> AppResult<Option<i64>> {
    match value {
        None => Ok(None),
        Some(s) => rfc3339_to_millis(s)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid release time: {s}"))),
    }
}

impl DropSaveRequest {
    fn into_save(self) -> AppResult<DropSave> {
        let scheduled_at = parse_release_time(self.scheduled_at.as_deref())?;
        Ok(DropSave {
            name: self.name,
            description: self.description,
            item_ids: self.item_ids,
            schedule_type: self.schedule_type,
            scheduled_at,
        })
    }
}

/// GET /api/drops - grouped by lifecycle stage
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<DropBoard>>> {
    Ok(ok(state.drops.list_grouped().await?))
}

/// GET /api/drops/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    Ok(ok(state.drops.get(&id).await?))
}

/// POST /api/drops
pub async fn create(
    State(state): State<ServerState>,
    Json(request): Json<DropSaveRequest>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let drop = state
        .drops
        .save(None, request.into_save()?, now_millis())
        .await?;
    Ok(ok_with_message(drop, "Drop saved"))
}

/// PUT /api/drops/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<DropSaveRequest>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let drop = state
        .drops
        .save(Some(id), request.into_save()?, now_millis())
        .await?;
    Ok(ok_with_message(drop, "Drop saved"))
}

/// POST /api/drops/{id}/activate
pub async fn activate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let drop = state.drops.activate(&id, now_millis()).await?;
    Ok(ok_with_message(drop, "Drop is live"))
}

/// POST /api/drops/{id}/complete
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let drop = state.drops.complete(&id, now_millis()).await?;
    Ok(ok_with_message(drop, "Drop completed"))
}

/// POST /api/drops/{id}/cancel-schedule
pub async fn cancel_schedule(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let drop = state.drops.cancel_schedule(&id, now_millis()).await?;
    Ok(ok_with_message(drop, "Schedule cancelled"))
}

/// POST /api/drops/{id}/schedule - draft onto the calendar
pub async fn schedule(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let at = parse_release_time(Some(&request.scheduled_at))?
        .ok_or_else(|| AppError::Validation("A release time is required".into()))?;
    let drop = state.drops.schedule(&id, at, now_millis()).await?;
    Ok(ok_with_message(drop, "Drop scheduled"))
}

/// PUT /api/drops/{id}/schedule - move an existing release time
pub async fn reschedule(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<ScheduleRequest>,
) -> AppResult<Json<ApiResponse<Drop>>> {
    let at = parse_release_time(Some(&request.scheduled_at))?
        .ok_or_else(|| AppError::Validation("A release time is required".into()))?;
    let drop = state.drops.reschedule(&id, at, now_millis()).await?;
    Ok(ok_with_message(drop, "Drop rescheduled"))
}

/// GET /api/drops/countdowns - every tracked countdown
pub async fn countdowns(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<DropCountdown>>>> {
    let views = state
        .countdowns
        .all()
        .into_iter()
        .map(|(drop_id, remaining)| DropCountdown { drop_id, remaining })
        .collect();
    Ok(ok(views))
}

/// GET /api/drops/{id}/countdown
pub async fn countdown(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CountdownView>>> {
    let view = state
        .countdowns
        .snapshot(&id)
        .ok_or_else(|| AppError::NotFound(format!("No countdown for drop {id}")))?;
    Ok(ok(view))
}

/// DELETE /api/drops/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.drops.delete(&id).await?;
    Ok(ok_with_message((), "Drop deleted"))
}
