//! External Providers
//!
//! Thin clients for payment, shipping labels and the marketplace listing
//! feed, behind traits so checkout and the API can be tested without the
//! network.

pub mod ebay;
pub mod shippo;
pub mod stripe;

use async_trait::async_trait;
use serde::Serialize;
use shared::models::{ShippingAddress, ShippingLabel};

use crate::utils::{AppError, AppResult};

pub use ebay::EbayFeed;
pub use shippo::ShippoClient;
pub use stripe::StripeGateway;

/// Outcome of a successful charge.
#[derive(Debug, Clone)]
pub struct PaymentCharge {
    /// Provider-side reference (e.g. payment intent id)
    pub reference: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge `amount` (currency units) against an opaque payment method
    /// token from the storefront.
    async fn charge(
        &self,
        amount: f64,
        payment_method_id: &str,
        description: &str,
    ) -> AppResult<PaymentCharge>;
}

#[async_trait]
pub trait ShippingProvider: Send + Sync {
    /// Buy a shipping label for an order.
    async fn create_label(
        &self,
        recipient_name: &str,
        address: &ShippingAddress,
        order_id: &str,
    ) -> AppResult<ShippingLabel>;
}

/// One marketplace listing shown alongside the in-house inventory.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub url: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait ListingFeed: Send + Sync {
    /// Current active listings from the external marketplace.
    async fn fetch_listings(&self) -> AppResult<Vec<Listing>>;
}

/// Stand-in when no payment key is configured. Every charge fails, so no
/// order can slip through unpaid.
pub struct DisabledPayment;

#[async_trait]
impl PaymentProvider for DisabledPayment {
    async fn charge(
        &self,
        _amount: f64,
        _payment_method_id: &str,
        _description: &str,
    ) -> AppResult<PaymentCharge> {
        Err(AppError::Provider("Payment provider not configured".into()))
    }
}

/// Stand-in when no shipping token is configured. Checkout treats the
/// failure as a skipped label.
pub struct DisabledShipping;

#[async_trait]
impl ShippingProvider for DisabledShipping {
    async fn create_label(
        &self,
        _recipient_name: &str,
        _address: &ShippingAddress,
        _order_id: &str,
    ) -> AppResult<ShippingLabel> {
        Err(AppError::Provider("Shipping provider not configured".into()))
    }
}

/// Stand-in when no marketplace token is configured.
pub struct EmptyListingFeed;

#[async_trait]
impl ListingFeed for EmptyListingFeed {
    async fn fetch_listings(&self) -> AppResult<Vec<Listing>> {
        Ok(Vec::new())
    }
}
