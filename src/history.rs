use std::sync::LazyLock;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{FetchError, RowError};
use crate::model::{HistoryPoint, HistorySeries};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());

/// Per-item price history provider. Never fails: an empty series is the
/// only failure signal.
pub trait HistorySource: Send + Sync {
    fn scrape(&self, item_id: &str) -> HistorySeries;
}

pub struct HistoryScraper {
    url_template: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HistoryScraper {
    pub fn new(config: &EngineConfig) -> Self {
        HistoryScraper {
            url_template: config.history_url_template.clone(),
            timeout: config.history_timeout,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn fetch_page(&self, item_id: &str) -> Result<String, FetchError> {
        let url = self.url_template.replace("{item_id}", item_id);
        let response = self.client.get(&url).timeout(self.timeout).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

impl HistorySource for HistoryScraper {
    fn scrape(&self, item_id: &str) -> HistorySeries {
        let body = match self.fetch_page(item_id) {
            Ok(body) => body,
            Err(e) => {
                warn!(item_id = %item_id, error = %e, "history scrape failed");
                return HistorySeries::empty(item_id);
            }
        };

        let table = parse_history_page(&body);
        if !table.skipped.is_empty() {
            debug!(
                item_id = %item_id,
                skipped = table.skipped.len(),
                first = %table.skipped[0],
                "skipped history rows"
            );
        }

        HistorySeries {
            item_id: item_id.to_string(),
            points: table.points,
            scraped_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Default)]
pub struct DecodedTable {
    pub points: Vec<HistoryPoint>,
    pub skipped: Vec<RowError>,
}

/// Decode the first table of a history page. Bad rows are collected in
/// `skipped`; a page without a table decodes to nothing.
pub fn parse_history_page(body: &str) -> DecodedTable {
    let document = Html::parse_document(body);
    let mut decoded = DecodedTable::default();

    let Some(table) = document.select(&TABLE).next() else {
        return decoded;
    };

    for row in decode_rows(table) {
        match row {
            Ok(point) => decoded.points.push(point),
            Err(e) => decoded.skipped.push(e),
        }
    }

    decoded.points.sort_by_key(|p| p.timestamp);
    decoded
}

/// Lazily decode the body rows of one table.
pub fn decode_rows<'a>(
    table: ElementRef<'a>,
) -> impl Iterator<Item = Result<HistoryPoint, RowError>> + 'a {
    table
        .select(&TBODY)
        .take(1)
        .flat_map(|body| child_elements(body, "tr"))
        .map(decode_row)
}

fn child_elements<'a>(parent: ElementRef<'a>, tag: &'static str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == tag)
}

fn decode_row(row: ElementRef<'_>) -> Result<HistoryPoint, RowError> {
    let cells: Vec<String> = child_elements(row, "td")
        .map(|td| td.text().collect::<String>().trim().to_string())
        .collect();

    if cells.len() < 2 {
        return Err(RowError::MissingCells(cells.len()));
    }

    Ok(HistoryPoint {
        timestamp: parse_timestamp(&cells[0])?,
        price: parse_price(&cells[1])?,
    })
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, RowError> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| RowError::Timestamp(text.to_string()))
}

/// Prices may carry thousands separators ("1,234.5").
pub fn parse_price(text: &str) -> Result<f64, RowError> {
    text.trim()
        .replace(',', "")
        .parse::<f64>()
        .map_err(|_| RowError::Price(text.to_string()))
}
