use std::time::Duration;

pub const BAZAAR_URL: &str = "https://api.hypixel.net/skyblock/bazaar";
pub const HISTORY_URL_TEMPLATE: &str = "https://bazaartracker.com/product/{item_id}";

/// Fixed engine constants. Fields are public so embedders and tests can
/// shorten the intervals.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub bazaar_url: String,
    pub history_url_template: String,

    pub market_interval: Duration,
    pub history_item_delay: Duration,
    pub history_sweep_interval: Duration,
    pub history_timeout: Duration,

    pub table_rows: usize,
    pub chart_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            bazaar_url: BAZAAR_URL.to_string(),
            history_url_template: HISTORY_URL_TEMPLATE.to_string(),

            market_interval: Duration::from_secs(10),
            history_item_delay: Duration::from_secs(1),
            history_sweep_interval: Duration::from_secs(300),
            history_timeout: Duration::from_secs(10),

            table_rows: 20,
            chart_rows: 10,
        }
    }
}

impl EngineConfig {
    pub fn history_url(&self, item_id: &str) -> String {
        self.history_url_template.replace("{item_id}", item_id)
    }
}
