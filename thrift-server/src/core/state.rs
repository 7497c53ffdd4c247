//! Server State
//!
//! Wires the database, domain services and provider clients together.
//! Cloned into every handler by the router.

use std::sync::Arc;

use crate::checkout::CheckoutService;
use crate::db::DbService;
use crate::drops::scheduler::CountdownTracker;
use crate::drops::DropService;
use crate::providers::{
    DisabledPayment, DisabledShipping, EbayFeed, EmptyListingFeed, ListingFeed, PaymentProvider,
    ShippingProvider, ShippoClient, StripeGateway,
};
use crate::submissions::SubmissionService;
use crate::utils::AppResult;

use shared::models::ShippingAddress;

use super::config::Config;

#[derive(Clone)]
pub struct ServerState {
    pub db: DbService,
    pub drops: DropService,
    pub submissions: SubmissionService,
    pub checkout: CheckoutService,
    pub listings: Arc<dyn ListingFeed>,
    pub countdowns: CountdownTracker,
}

impl ServerState {
    /// Open the database and construct every service. Providers without
    /// credentials get inert stand-ins, so a dev instance runs with no
    /// external accounts at all.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;

        let payment: Arc<dyn PaymentProvider> = match &config.stripe_secret_key {
            Some(key) => Arc::new(StripeGateway::new(key.clone())),
            None => {
                tracing::warn!("STRIPE_SECRET_KEY not set; checkout will refuse payments");
                Arc::new(DisabledPayment)
            }
        };

        let shipping: Arc<dyn ShippingProvider> = match (
            &config.shippo_api_token,
            &config.shippo_carrier_account,
        ) {
            (Some(token), Some(account)) => Arc::new(ShippoClient::new(
                token.clone(),
                account.clone(),
                ShippingAddress {
                    street: config.ship_from_street.clone(),
                    apt: String::new(),
                    city: config.ship_from_city.clone(),
                    state: config.ship_from_state.clone(),
                    zip: config.ship_from_zip.clone(),
                },
            )),
            _ => {
                tracing::warn!("Shippo not configured; orders will ship without labels");
                Arc::new(DisabledShipping)
            }
        };

        let listings: Arc<dyn ListingFeed> = match &config.ebay_oauth_token {
            Some(token) => Arc::new(EbayFeed::new(
                token.clone(),
                config.ebay_seller_name.clone(),
            )),
            None => Arc::new(EmptyListingFeed),
        };

        let countdowns = CountdownTracker::default();
        let drops = DropService::new(db.pool.clone(), countdowns.clone());
        let submissions = SubmissionService::new(db.pool.clone());
        let checkout = CheckoutService::new(db.pool.clone(), payment, shipping);

        Ok(Self {
            db,
            drops,
            submissions,
            checkout,
            listings,
            countdowns,
        })
    }

    /// In-memory state with inert providers, for API tests.
    #[cfg(test)]
    pub async fn for_tests() -> Self {
        let db = DbService::in_memory().await.unwrap();
        let countdowns = CountdownTracker::default();
        Self {
            drops: DropService::new(db.pool.clone(), countdowns.clone()),
            submissions: SubmissionService::new(db.pool.clone()),
            checkout: CheckoutService::new(
                db.pool.clone(),
                Arc::new(DisabledPayment),
                Arc::new(DisabledShipping),
            ),
            listings: Arc::new(EmptyListingFeed),
            countdowns,
            db,
        }
    }
}
