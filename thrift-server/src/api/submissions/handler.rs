//! Submission API Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::models::{InventoryItem, SellerSubmission, SubmissionCreate, SubmissionReview};
use shared::util::now_millis;

use crate::core::ServerState;
use crate::utils::{ok, ok_with_message, ApiResponse, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub submission: SellerSubmission,
    /// Inventory item spawned from the consignment
    pub item: InventoryItem,
}

/// POST /api/submissions - public seller form
pub async fn create(
    State(state): State<ServerState>,
    Json(data): Json<SubmissionCreate>,
) -> AppResult<Json<ApiResponse<SellerSubmission>>> {
    let submission = state.submissions.submit(data).await?;
    Ok(ok_with_message(submission, "Submission received"))
}

/// GET /api/submissions
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<SellerSubmission>>>> {
    Ok(ok(state.submissions.list().await?))
}

/// GET /api/submissions/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<SellerSubmission>>> {
    Ok(ok(state.submissions.get(&id).await?))
}

/// POST /api/submissions/{id}/review - admin prices the item
pub async fn review(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(review): Json<SubmissionReview>,
) -> AppResult<Json<ApiResponse<SellerSubmission>>> {
    let submission = state
        .submissions
        .admin_review(&id, review, now_millis())
        .await?;
    Ok(ok_with_message(submission, "Offer sent to seller"))
}

/// POST /api/submissions/{id}/approve - seller accepts the offer
pub async fn approve(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ApprovalResponse>>> {
    let (submission, item) = state.submissions.seller_approve(&id, now_millis()).await?;
    Ok(ok_with_message(
        ApprovalResponse { submission, item },
        "Submission approved",
    ))
}

/// POST /api/submissions/{id}/reject
pub async fn reject(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<ApiResponse<SellerSubmission>>> {
    let submission = state
        .submissions
        .reject(&id, request.reason, now_millis())
        .await?;
    Ok(ok_with_message(submission, "Submission rejected"))
}
