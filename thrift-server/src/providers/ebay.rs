//! eBay Listing Feed
//!
//! Pulls the shop's active marketplace listings from the Browse API so the
//! storefront can show them next to in-house inventory. Read-only.

use async_trait::async_trait;
use serde::Deserialize;

use crate::utils::{AppError, AppResult};

use super::{Listing, ListingFeed};

const DEFAULT_BASE_URL: &str = "https://api.ebay.com";
const PAGE_LIMIT: u32 = 50;

pub struct EbayFeed {
    client: reqwest::Client,
    oauth_token: String,
    seller_name: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "itemSummaries", default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
struct ItemSummary {
    #[serde(rename = "itemId")]
    item_id: String,
    title: String,
    #[serde(default)]
    price: Option<PriceValue>,
    #[serde(rename = "itemWebUrl", default)]
    item_web_url: Option<String>,
    #[serde(default)]
    image: Option<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct PriceValue {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

impl EbayFeed {
    pub fn new(oauth_token: String, seller_name: String) -> Self {
        Self::with_base_url(oauth_token, seller_name, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(oauth_token: String, seller_name: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            oauth_token,
            seller_name,
            base_url,
        }
    }
}

#[async_trait]
impl ListingFeed for EbayFeed {
    async fn fetch_listings(&self) -> AppResult<Vec<Listing>> {
        let response = self
            .client
            .get(format!(
                "{}/buy/browse/v1/item_summary/search",
                self.base_url
            ))
            .query(&[
                ("q", "vintage".to_string()),
                ("filter", format!("sellers:{{{}}}", self.seller_name)),
                ("limit", PAGE_LIMIT.to_string()),
            ])
            .bearer_auth(&self.oauth_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Listing fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Provider(format!(
                "Listing fetch rejected (HTTP {})",
                response.status()
            )));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed listing response: {e}")))?;

        Ok(search
            .item_summaries
            .into_iter()
            .map(|summary| Listing {
                id: summary.item_id,
                title: summary.title,
                price: summary
                    .price
                    .and_then(|p| p.value)
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(0.0),
                url: summary.item_web_url.unwrap_or_default(),
                image_url: summary.image.and_then(|i| i.image_url),
            })
            .collect())
    }
}
