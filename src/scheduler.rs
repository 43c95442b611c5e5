use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::cache::HistoryCache;
use crate::config::EngineConfig;
use crate::flips;
use crate::history::HistorySource;
use crate::loader::SnapshotSource;
use crate::store::MarketStore;

/// Process-wide stop flag. Set once; sleeping loops wake immediately.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `timeout` or until stopped. Returns true if stopped.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.cond.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }
}

/// One market cycle: fetch, score, publish. A failed fetch leaves the
/// store untouched. Returns the published generation, if any.
pub fn market_cycle(source: &dyn SnapshotSource, store: &MarketStore) -> Option<u64> {
    let snapshot = match source.fetch() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "snapshot fetch failed, keeping previous data");
            return None;
        }
    };

    let opportunities = flips::score(&snapshot);
    let products = snapshot.len();
    let found = opportunities.len();
    let generation = store.publish(snapshot, opportunities);

    info!(generation, products, opportunities = found, "published market snapshot");
    Some(generation)
}

pub fn run_market_loop(
    source: Arc<dyn SnapshotSource>,
    store: Arc<MarketStore>,
    stop: Arc<StopSignal>,
    interval: Duration,
) {
    info!("market loop started");
    while !stop.is_stopped() {
        market_cycle(source.as_ref(), &store);
        if stop.wait(interval) {
            break;
        }
    }
    info!("market loop stopped");
}

/// One sweep over the items currently known to the store. Returns the
/// number of items scraped; stops early if the stop signal is set.
pub fn history_sweep(
    source: &dyn HistorySource,
    store: &MarketStore,
    cache: &HistoryCache,
    stop: &StopSignal,
    item_delay: Duration,
) -> usize {
    let items = store.current().map(|view| view.item_ids()).unwrap_or_default();
    debug!(items = items.len(), "history sweep started");

    let mut scraped = 0;
    for item_id in items {
        if stop.is_stopped() {
            break;
        }

        let series = source.scrape(&item_id);
        debug!(item_id = %item_id, points = series.points.len(), "history refreshed");
        cache.insert(series);
        scraped += 1;

        if stop.wait(item_delay) {
            break;
        }
    }

    info!(scraped, "history sweep finished");
    scraped
}

pub fn run_history_loop(
    source: Arc<dyn HistorySource>,
    store: Arc<MarketStore>,
    cache: Arc<HistoryCache>,
    stop: Arc<StopSignal>,
    item_delay: Duration,
    sweep_interval: Duration,
) {
    info!("history loop started");
    while !stop.is_stopped() {
        history_sweep(source.as_ref(), &store, &cache, &stop, item_delay);
        if stop.wait(sweep_interval) {
            break;
        }
    }
    info!("history loop stopped");
}

/// The two background loops. Dropping the handle does not stop them; call
/// `StopSignal::stop` and then `join`.
pub struct RefreshScheduler {
    market: JoinHandle<()>,
    history: JoinHandle<()>,
}

impl RefreshScheduler {
    pub fn spawn(
        config: &EngineConfig,
        snapshots: Arc<dyn SnapshotSource>,
        histories: Arc<dyn HistorySource>,
        store: Arc<MarketStore>,
        cache: Arc<HistoryCache>,
        stop: Arc<StopSignal>,
    ) -> io::Result<Self> {
        let market = {
            let store = store.clone();
            let stop = stop.clone();
            let interval = config.market_interval;
            thread::Builder::new()
                .name("market-refresh".into())
                .spawn(move || run_market_loop(snapshots, store, stop, interval))?
        };

        let history = {
            let item_delay = config.history_item_delay;
            let sweep_interval = config.history_sweep_interval;
            thread::Builder::new()
                .name("history-refresh".into())
                .spawn(move || {
                    run_history_loop(histories, store, cache, stop, item_delay, sweep_interval)
                })?
        };

        Ok(RefreshScheduler { market, history })
    }

    pub fn is_finished(&self) -> bool {
        self.market.is_finished() && self.history.is_finished()
    }

    pub fn join(self) {
        if self.market.join().is_err() {
            warn!("market loop panicked");
        }
        if self.history.join().is_err() {
            warn!("history loop panicked");
        }
    }
}
