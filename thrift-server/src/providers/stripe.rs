//! Stripe Payment Gateway
//!
//! Creates and confirms a payment intent per checkout. Amounts go over the
//! wire in cents.

use async_trait::async_trait;
use serde::Deserialize;

use crate::utils::{AppError, AppResult};

use super::{PaymentCharge, PaymentProvider};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";
const CURRENCY: &str = "usd";

pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentIntent {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: String,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(secret_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            base_url,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeGateway {
    async fn charge(
        &self,
        amount: f64,
        payment_method_id: &str,
        description: &str,
    ) -> AppResult<PaymentCharge> {
        let cents = (amount * 100.0).round() as i64;
        let params = [
            ("amount", cents.to_string()),
            ("currency", CURRENCY.to_string()),
            ("payment_method", payment_method_id.to_string()),
            ("description", description.to_string()),
            ("confirm", "true".to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("automatic_payment_methods[allow_redirects]", "never".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Payment request failed: {e}")))?;

        if !response.status().is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "Payment declined".to_string());
            return Err(AppError::Provider(format!("Payment failed: {message}")));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed payment response: {e}")))?;
        if intent.status != "succeeded" {
            return Err(AppError::Provider(format!(
                "Payment not completed (status: {})",
                intent.status
            )));
        }

        Ok(PaymentCharge {
            reference: intent.id,
        })
    }
}
