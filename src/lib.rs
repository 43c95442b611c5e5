pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod flips;
pub mod history;
pub mod loader;
pub mod model;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use engine::BazaarEngine;
pub use config::EngineConfig;
pub use error::FetchError;
pub use filter::{Category, FilterCriteria};
pub use model::{FlipOpportunity, HistoryPoint, HistorySeries, MarketSnapshot};
