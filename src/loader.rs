use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::model::{MarketSnapshot, Product, QuickStatus};

/// Anything that can produce a full market snapshot. All-or-nothing: an
/// error means no snapshot at all for this call.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> Result<MarketSnapshot, FetchError>;
}

pub struct SnapshotFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl SnapshotFetcher {
    pub fn new(url: &str) -> Self {
        SnapshotFetcher {
            url: url.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl SnapshotSource for SnapshotFetcher {
    fn fetch(&self) -> Result<MarketSnapshot, FetchError> {
        let response = self.client.get(&self.url).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text()?;
        parse_snapshot(&body)
    }
}

#[derive(Deserialize)]
struct BazaarResponse {
    #[serde(default = "default_success")]
    success: bool,
    cause: Option<String>,
    #[serde(rename = "lastUpdated")]
    last_updated: Option<i64>,
    #[serde(default)]
    products: Map<String, Value>,
}

fn default_success() -> bool {
    true
}

#[derive(Deserialize)]
struct RawProduct {
    quick_status: Option<RawQuickStatus>,
}

// Every field may be missing or null; those read as zero.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawQuickStatus {
    sell_price: Option<f64>,
    buy_price: Option<f64>,
    buy_volume: Option<f64>,
    sell_volume: Option<f64>,
}

impl From<RawQuickStatus> for QuickStatus {
    fn from(raw: RawQuickStatus) -> Self {
        QuickStatus {
            buy_price: raw.buy_price.unwrap_or(0.0),
            sell_price: raw.sell_price.unwrap_or(0.0),
            buy_volume: raw.buy_volume.unwrap_or(0.0) as i64,
            sell_volume: raw.sell_volume.unwrap_or(0.0) as i64,
        }
    }
}

/// Decode a bazaar API body. Products keep their listing order; products
/// without a `quick_status` are left out.
pub fn parse_snapshot(body: &str) -> Result<MarketSnapshot, FetchError> {
    let response: BazaarResponse = serde_json::from_str(body)?;

    if !response.success {
        return Err(FetchError::Api(
            response.cause.unwrap_or_else(|| "request unsuccessful".to_string()),
        ));
    }

    let mut products = Vec::with_capacity(response.products.len());
    for (product_id, value) in response.products {
        let raw: RawProduct = serde_json::from_value(value)?;
        if let Some(quick) = raw.quick_status {
            products.push(Product {
                product_id,
                quick: quick.into(),
            });
        }
    }

    Ok(MarketSnapshot {
        products,
        last_updated: response.last_updated,
        fetched_at: Utc::now(),
    })
}
