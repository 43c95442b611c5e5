use std::io;
use std::sync::Arc;

use tracing::info;

use crate::cache::HistoryCache;
use crate::config::EngineConfig;
use crate::filter::{self, FilterCriteria};
use crate::history::{HistoryScraper, HistorySource};
use crate::loader::{SnapshotFetcher, SnapshotSource};
use crate::model::{FlipOpportunity, HistorySeries};
use crate::scheduler::{RefreshScheduler, StopSignal};
use crate::stats::HistoryTrend;
use crate::store::{MarketStore, MarketView};

/// Everything a presentation layer talks to: market state, filtered
/// rankings, per-item history and the stop switch.
pub struct BazaarEngine {
    config: EngineConfig,
    snapshots: Arc<dyn SnapshotSource>,
    histories: Arc<dyn HistorySource>,

    store: Arc<MarketStore>,
    cache: Arc<HistoryCache>,
    stop: Arc<StopSignal>,

    scheduler: Option<RefreshScheduler>,
}

impl BazaarEngine {
    /// Engine wired to the live market API and history site.
    pub fn new(config: EngineConfig) -> Self {
        let snapshots = Arc::new(SnapshotFetcher::new(&config.bazaar_url));
        let histories = Arc::new(HistoryScraper::new(&config));
        Self::with_sources(config, snapshots, histories)
    }

    pub fn with_sources(
        config: EngineConfig,
        snapshots: Arc<dyn SnapshotSource>,
        histories: Arc<dyn HistorySource>,
    ) -> Self {
        BazaarEngine {
            config,
            snapshots,
            histories,
            store: Arc::new(MarketStore::new()),
            cache: Arc::new(HistoryCache::new()),
            stop: Arc::new(StopSignal::new()),
            scheduler: None,
        }
    }

    /// Start both refresh loops. Calling it again while running is a no-op.
    pub fn start(&mut self) -> io::Result<()> {
        if self.scheduler.is_some() || self.stop.is_stopped() {
            return Ok(());
        }

        self.scheduler = Some(RefreshScheduler::spawn(
            &self.config,
            self.snapshots.clone(),
            self.histories.clone(),
            self.store.clone(),
            self.cache.clone(),
            self.stop.clone(),
        )?);
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `None` until the first snapshot has been published.
    pub fn current(&self) -> Option<Arc<MarketView>> {
        self.store.current()
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    /// Full filtered ranking over the latest opportunities.
    pub fn apply(&self, criteria: &FilterCriteria) -> Vec<FlipOpportunity> {
        match self.store.current() {
            Some(view) => filter::apply(&view.opportunities, criteria),
            None => Vec::new(),
        }
    }

    pub fn table(&self, criteria: &FilterCriteria) -> Vec<FlipOpportunity> {
        self.top(criteria, self.config.table_rows)
    }

    pub fn chart(&self, criteria: &FilterCriteria) -> Vec<FlipOpportunity> {
        self.top(criteria, self.config.chart_rows)
    }

    fn top(&self, criteria: &FilterCriteria, limit: usize) -> Vec<FlipOpportunity> {
        match self.store.current() {
            Some(view) => filter::top(&view.opportunities, criteria, limit),
            None => Vec::new(),
        }
    }

    /// Latest scraped history; empty if none has been scraped yet.
    pub fn history(&self, item_id: &str) -> Arc<HistorySeries> {
        self.cache
            .get(item_id)
            .unwrap_or_else(|| Arc::new(HistorySeries::empty(item_id)))
    }

    pub fn trend(&self, item_id: &str) -> Option<HistoryTrend> {
        HistoryTrend::from_series(&self.history(item_id))
    }

    pub fn stop_signal(&self) -> Arc<StopSignal> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Route Ctrl-C to `stop`. Only one handler may be set per process.
    pub fn stop_on_ctrl_c(&self) -> Result<(), ctrlc::Error> {
        let stop = self.stop.clone();
        ctrlc::set_handler(move || {
            info!("interrupt received, stopping");
            stop.stop();
        })
    }

    /// Stop and wait for both loops to exit. An in-flight fetch is allowed
    /// to finish first.
    pub fn shutdown(&mut self) {
        self.stop.stop();
        if let Some(scheduler) = self.scheduler.take() {
            scheduler.join();
        }
    }
}

impl Drop for BazaarEngine {
    fn drop(&mut self) {
        self.stop.stop();
    }
}
