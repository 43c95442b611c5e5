use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instantaneous order book summary for one bazaar product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuickStatus {
    pub buy_price: f64,
    pub sell_price: f64,
    pub buy_volume: i64,
    pub sell_volume: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub quick: QuickStatus,
}

/// Full market state captured by one fetch. Products keep the order the API
/// listed them in, which is the tie-break order for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub products: Vec<Product>,
    pub last_updated: Option<i64>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(products: Vec<Product>) -> Self {
        MarketSnapshot {
            products,
            last_updated: None,
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, product_id: &str) -> Option<&QuickStatus> {
        self.products
            .iter()
            .find(|p| p.product_id == product_id)
            .map(|p| &p.quick)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipOpportunity {
    pub item_id: String,

    pub buy_price: f64,
    pub sell_price: f64,
    pub spread: f64,
    pub margin_pct: f64,

    pub buy_volume: i64,
    pub sell_volume: i64,
    pub total_volume: i64,

    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: NaiveDateTime,
    pub price: f64,
}

/// Scraped price history for one item, oldest point first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySeries {
    pub item_id: String,
    pub points: Vec<HistoryPoint>,
    pub scraped_at: Option<DateTime<Utc>>,
}

impl HistorySeries {
    pub fn empty(item_id: &str) -> Self {
        HistorySeries {
            item_id: item_id.to_string(),
            points: Vec::new(),
            scraped_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }
}
