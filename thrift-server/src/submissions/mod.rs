//! Seller Submissions
//!
//! Consignment workflow: a seller offers an item through the public form,
//! the admin prices it, the seller accepts or the admin/seller rejects.
//! Accepting spawns an inventory item in the same transaction that closes
//! the submission.

pub mod estimate;

use shared::models::{
    InventoryItem, ItemCondition, SellerSubmission, SubmissionCreate, SubmissionReview,
    SubmissionStatus,
};
use shared::util::entity_id;
use sqlx::SqlitePool;
use tracing::info;
use validator::Validate;

use crate::db::repository::submission as submission_repo;
use crate::utils::{AppError, AppResult};

const DEFAULT_REJECT_REASON: &str = "No reason provided";

#[derive(Clone)]
pub struct SubmissionService {
    pool: SqlitePool,
}

impl SubmissionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Accept a submission from the public form and attach the payout
    /// estimate shown to the seller.
    pub async fn submit(&self, data: SubmissionCreate) -> AppResult<SellerSubmission> {
        data.validate()?;
        let estimate = estimate::payout_display(&data.item_type, &data.condition, &data.era);
        let submission = submission_repo::create(&self.pool, data, estimate).await?;
        info!(submission_id = %submission.id, "Seller submission received");
        Ok(submission)
    }

    pub async fn get(&self, id: &str) -> AppResult<SellerSubmission> {
        self.require(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<SellerSubmission>> {
        Ok(submission_repo::find_all(&self.pool).await?)
    }

    /// Admin prices the item, moving it to the seller's court.
    pub async fn admin_review(
        &self,
        id: &str,
        review: SubmissionReview,
        now_ms: i64,
    ) -> AppResult<SellerSubmission> {
        if review.price <= 0.0 {
            return Err(AppError::Validation("Offer price must be positive".into()));
        }
        let reviewed =
            submission_repo::admin_review(&self.pool, id, review.price, review.notes.as_deref(), now_ms)
                .await?;
        if !reviewed {
            let submission = self.require(id).await?;
            return Err(AppError::Conflict(format!(
                "Submission is {}, not awaiting review",
                submission.status.as_str()
            )));
        }
        info!(submission_id = %id, price = review.price, "Submission priced");
        self.require(id).await
    }

    /// Seller accepts the offer. Spawns the consigned inventory item; the
    /// sale price stays 0 until the admin finishes the listing.
    pub async fn seller_approve(
        &self,
        id: &str,
        now_ms: i64,
    ) -> AppResult<(SellerSubmission, InventoryItem)> {
        let submission = self.require(id).await?;
        if submission.status != SubmissionStatus::PendingSeller {
            return Err(AppError::Conflict(format!(
                "Submission is {}, no longer pending",
                submission.status.as_str()
            )));
        }
        let cost = submission.admin_price.ok_or_else(|| {
            AppError::Internal(format!("Submission {id} has no offer price"))
        })?;

        let era = if submission.era.is_empty() {
            "Vintage".to_string()
        } else {
            submission.era.clone()
        };
        let spawned = InventoryItem {
            id: entity_id("item"),
            name: format!("{} - {} VT", submission.item_type, era),
            description: submission.description.clone(),
            price: 0.0,
            cost,
            category: submission.item_type.clone(),
            size: "TBD".to_string(),
            condition: ItemCondition::parse(&submission.condition).unwrap_or(ItemCondition::Good),
            images: submission.photos.clone(),
            available: true,
            drop_id: None,
            submission_id: Some(submission.id.clone()),
            created_at: now_ms,
        };

        if !submission_repo::approve_with_item(&self.pool, id, &spawned, now_ms).await? {
            let submission = self.require(id).await?;
            return Err(AppError::Conflict(format!(
                "Submission is {}, no longer pending",
                submission.status.as_str()
            )));
        }
        info!(submission_id = %id, item_id = %spawned.id, "Submission approved, item created");
        let submission = self.require(id).await?;
        Ok((submission, spawned))
    }

    /// Reject from either pending state.
    pub async fn reject(
        &self,
        id: &str,
        reason: Option<String>,
        now_ms: i64,
    ) -> AppResult<SellerSubmission> {
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REJECT_REASON.to_string());
        if !submission_repo::reject(&self.pool, id, &reason, now_ms).await? {
            let submission = self.require(id).await?;
            return Err(AppError::Conflict(format!(
                "Submission is already {}",
                submission.status.as_str()
            )));
        }
        info!(submission_id = %id, "Submission rejected");
        self.require(id).await
    }

    async fn require(&self, id: &str) -> AppResult<SellerSubmission> {
        submission_repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::item as item_repo;
    use crate::db::DbService;

    async fn setup() -> SubmissionService {
        let db = DbService::in_memory().await.unwrap();
        SubmissionService::new(db.pool)
    }

    fn form() -> SubmissionCreate {
        SubmissionCreate {
            name: "Alex Seller".to_string(),
            email: "alex@example.com".to_string(),
            phone: String::new(),
            item_type: "hoodie".to_string(),
            description: "Maroon VT hoodie, light wear".to_string(),
            condition: "good".to_string(),
            era: "1990s".to_string(),
            photos: vec!["https://img.test/p1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn submit_attaches_estimate_and_starts_pending_admin() {
        let service = setup().await;
        let submission = service.submit(form()).await.unwrap();
        assert_eq!(submission.status, SubmissionStatus::PendingAdmin);
        assert_eq!(submission.estimate, estimate::payout_display("hoodie", "good", "1990s"));
        assert_eq!(submission.admin_price, None);
    }

    #[tokio::test]
    async fn submit_rejects_bad_email_and_photo_counts() {
        let service = setup().await;

        let mut bad_email = form();
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            service.submit(bad_email).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut no_photos = form();
        no_photos.photos.clear();
        assert!(matches!(
            service.submit(no_photos).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut too_many = form();
        too_many.photos = (0..6).map(|i| format!("https://img.test/{i}.jpg")).collect();
        assert!(matches!(
            service.submit(too_many).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn full_consignment_flow_spawns_item() {
        let service = setup().await;
        let submission = service.submit(form()).await.unwrap();

        let reviewed = service
            .admin_review(
                &submission.id,
                SubmissionReview {
                    price: 20.0,
                    notes: Some("Nice piece".to_string()),
                },
                1_000,
            )
            .await
            .unwrap();
        assert_eq!(reviewed.status, SubmissionStatus::PendingSeller);
        assert_eq!(reviewed.admin_price, Some(20.0));
        assert_eq!(reviewed.reviewed_at, Some(1_000));

        let (approved, item) = service.seller_approve(&submission.id, 2_000).await.unwrap();
        assert_eq!(approved.status, SubmissionStatus::Approved);
        assert_eq!(approved.seller_approved_at, Some(2_000));

        assert_eq!(item.name, "hoodie - 1990s VT");
        assert_eq!(item.price, 0.0);
        assert_eq!(item.cost, 20.0);
        assert_eq!(item.size, "TBD");
        assert!(item.available);
        assert_eq!(item.drop_id, None);
        assert_eq!(item.submission_id, Some(submission.id.clone()));

        let stored = item_repo::find_by_id(&service.pool, &item.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, item.name);
    }

    #[tokio::test]
    async fn offer_price_must_be_positive() {
        let service = setup().await;
        let submission = service.submit(form()).await.unwrap();
        let err = service
            .admin_review(&submission.id, SubmissionReview { price: 0.0, notes: None }, 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn approve_requires_pending_seller_and_happens_once() {
        let service = setup().await;
        let submission = service.submit(form()).await.unwrap();

        // Straight from pending_admin is a conflict
        let err = service.seller_approve(&submission.id, 1_000).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        service
            .admin_review(&submission.id, SubmissionReview { price: 15.0, notes: None }, 1_000)
            .await
            .unwrap();
        service.seller_approve(&submission.id, 2_000).await.unwrap();

        // Approving twice must not spawn a second item
        let err = service.seller_approve(&submission.id, 3_000).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let items = item_repo::find_all(&service.pool).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn reject_works_from_both_pending_states() {
        let service = setup().await;

        let first = service.submit(form()).await.unwrap();
        let rejected = service.reject(&first.id, None, 1_000).await.unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);
        assert_eq!(rejected.admin_notes.as_deref(), Some("No reason provided"));
        assert_eq!(rejected.admin_price, None);

        let second = service.submit(form()).await.unwrap();
        service
            .admin_review(&second.id, SubmissionReview { price: 12.0, notes: None }, 1_000)
            .await
            .unwrap();
        let rejected = service
            .reject(&second.id, Some("Too worn".to_string()), 2_000)
            .await
            .unwrap();
        assert_eq!(rejected.status, SubmissionStatus::Rejected);
        assert_eq!(rejected.admin_notes.as_deref(), Some("Too worn"));
        // The offer price stays, which tells the two rejection paths apart
        assert_eq!(rejected.admin_price, Some(12.0));

        // Terminal states cannot be rejected again
        let err = service.reject(&second.id, None, 3_000).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
