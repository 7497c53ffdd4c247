//! Shippo Shipping Labels
//!
//! Buys a USPS label for an order in one instant-transaction call. The
//! ship-from address is the shop's, configured once at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{ShippingAddress, ShippingLabel};
use shared::util::now_millis;

use crate::utils::{AppError, AppResult};

use super::ShippingProvider;

const DEFAULT_BASE_URL: &str = "https://api.goshippo.com";
const CARRIER: &str = "usps";
const SERVICE_LEVEL: &str = "usps_priority";

/// Default parcel for a folded garment.
const PARCEL: ParcelRequest = ParcelRequest {
    length: "12",
    width: "10",
    height: "4",
    distance_unit: "in",
    weight: "1.5",
    mass_unit: "lb",
};

pub struct ShippoClient {
    client: reqwest::Client,
    api_token: String,
    carrier_account: String,
    base_url: String,
    ship_from: AddressRequest,
}

#[derive(Debug, Clone, Serialize)]
struct AddressRequest {
    name: String,
    street1: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    street2: String,
    city: String,
    state: String,
    zip: String,
    country: String,
}

#[derive(Debug, Serialize)]
struct ParcelRequest {
    length: &'static str,
    width: &'static str,
    height: &'static str,
    distance_unit: &'static str,
    weight: &'static str,
    mass_unit: &'static str,
}

#[derive(Debug, Serialize)]
struct TransactionRequest {
    shipment: ShipmentRequest,
    carrier_account: String,
    servicelevel_token: &'static str,
    label_file_type: &'static str,
    metadata: String,
}

#[derive(Debug, Serialize)]
struct ShipmentRequest {
    address_from: AddressRequest,
    address_to: AddressRequest,
    parcels: Vec<ParcelRequest>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    object_id: String,
    status: String,
    #[serde(default)]
    tracking_number: Option<String>,
    #[serde(default)]
    tracking_url_provider: Option<String>,
    #[serde(default)]
    label_url: Option<String>,
    #[serde(default)]
    rate: Option<RateResponse>,
    #[serde(default)]
    messages: Vec<TransactionMessage>,
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    #[serde(default)]
    amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransactionMessage {
    #[serde(default)]
    text: String,
}

impl ShippoClient {
    pub fn new(api_token: String, carrier_account: String, ship_from: ShippingAddress) -> Self {
        Self::with_base_url(api_token, carrier_account, ship_from, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        api_token: String,
        carrier_account: String,
        ship_from: ShippingAddress,
        base_url: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token,
            carrier_account,
            base_url,
            ship_from: AddressRequest {
                name: "Hokies Thrift".to_string(),
                street1: ship_from.street,
                street2: ship_from.apt,
                city: ship_from.city,
                state: ship_from.state,
                zip: ship_from.zip,
                country: "US".to_string(),
            },
        }
    }
}

#[async_trait]
impl ShippingProvider for ShippoClient {
    async fn create_label(
        &self,
        recipient_name: &str,
        address: &ShippingAddress,
        order_id: &str,
    ) -> AppResult<ShippingLabel> {
        let request = TransactionRequest {
            shipment: ShipmentRequest {
                address_from: self.ship_from.clone(),
                address_to: AddressRequest {
                    name: recipient_name.to_string(),
                    street1: address.street.clone(),
                    street2: address.apt.clone(),
                    city: address.city.clone(),
                    state: address.state.clone(),
                    zip: address.zip.clone(),
                    country: "US".to_string(),
                },
                parcels: vec![PARCEL],
            },
            carrier_account: self.carrier_account.clone(),
            servicelevel_token: SERVICE_LEVEL,
            label_file_type: "PDF",
            metadata: format!("order {order_id}"),
        };

        let response = self
            .client
            .post(format!("{}/transactions", self.base_url))
            .header("Authorization", format!("ShippoToken {}", self.api_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Label request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Label request rejected (HTTP {})",
                response.status()
            )));
        }

        let transaction: TransactionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed label response: {e}")))?;

        if transaction.status != "SUCCESS" {
            let detail = transaction
                .messages
                .first()
                .map(|m| m.text.clone())
                .unwrap_or_else(|| transaction.status.clone());
            return Err(AppError::Provider(format!("Label purchase failed: {detail}")));
        }

        let cost = transaction
            .rate
            .and_then(|r| r.amount)
            .and_then(|a| a.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(ShippingLabel {
            tracking_number: transaction.tracking_number.unwrap_or_default(),
            tracking_url: transaction.tracking_url_provider.unwrap_or_default(),
            carrier: CARRIER.to_string(),
            service: SERVICE_LEVEL.to_string(),
            cost,
            label_url: transaction.label_url.unwrap_or_default(),
            transaction_id: transaction.object_id,
            created_at: now_millis(),
        })
    }
}
