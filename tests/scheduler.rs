use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use bazaar_flipper::cache::HistoryCache;
use bazaar_flipper::history::HistorySource;
use bazaar_flipper::loader::SnapshotSource;
use bazaar_flipper::model::{HistoryPoint, Product, QuickStatus};
use bazaar_flipper::scheduler::{history_sweep, market_cycle, StopSignal};
use bazaar_flipper::store::MarketStore;
use bazaar_flipper::{BazaarEngine, EngineConfig, FetchError, HistorySeries, MarketSnapshot};

fn product(id: &str) -> Product {
    Product {
        product_id: id.to_string(),
        quick: QuickStatus {
            buy_price: 10.0,
            sell_price: 8.0,
            buy_volume: 1000,
            sell_volume: 800,
        },
    }
}

/// Serves the scripted snapshots in turn, then keeps failing.
struct ScriptedMarket {
    script: Mutex<Vec<Result<Vec<&'static str>, u16>>>,
    calls: AtomicUsize,
}

impl ScriptedMarket {
    fn new(mut script: Vec<Result<Vec<&'static str>, u16>>) -> Self {
        script.reverse();
        ScriptedMarket {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }
}

impl SnapshotSource for ScriptedMarket {
    fn fetch(&self) -> Result<MarketSnapshot, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop() {
            Some(Ok(ids)) => Ok(MarketSnapshot::new(ids.into_iter().map(product).collect())),
            Some(Err(code)) => Err(FetchError::Status(code)),
            None => Err(FetchError::Status(503)),
        }
    }
}

#[derive(Default)]
struct RecordingHistory {
    scraped: Mutex<Vec<String>>,
}

impl HistorySource for RecordingHistory {
    fn scrape(&self, item_id: &str) -> HistorySeries {
        self.scraped.lock().push(item_id.to_string());
        if item_id.starts_with("BROKEN") {
            return HistorySeries::empty(item_id);
        }
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        HistorySeries {
            item_id: item_id.to_string(),
            points: vec![HistoryPoint { timestamp: ts, price: 8.0 }],
            scraped_at: Some(chrono::Utc::now()),
        }
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        market_interval: Duration::from_millis(5),
        history_item_delay: Duration::from_millis(1),
        history_sweep_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn failed_fetch_keeps_last_good_data() {
    let market = ScriptedMarket::new(vec![Ok(vec!["ENCHANTED_COAL"]), Err(500)]);
    let store = MarketStore::new();

    assert_eq!(market_cycle(&market, &store), Some(1));
    assert_eq!(market_cycle(&market, &store), None);

    let view = store.current().unwrap();
    assert_eq!(view.generation, 1);
    assert_eq!(view.opportunities[0].item_id, "ENCHANTED_COAL");
}

#[test]
fn failing_source_never_publishes() {
    let market = ScriptedMarket::new(vec![Err(502), Err(502)]);
    let store = MarketStore::new();
    assert_eq!(market_cycle(&market, &store), None);
    assert_eq!(market_cycle(&market, &store), None);
    assert!(store.current().is_none());
}

#[test]
fn sweep_reads_current_items() {
    let market = ScriptedMarket::new(vec![Ok(vec!["COAL", "BROKEN_BOOK"]), Ok(vec!["IRON"])]);
    let history = RecordingHistory::default();
    let store = MarketStore::new();
    let cache = HistoryCache::new();
    let stop = StopSignal::new();

    // nothing known yet: no-op
    assert_eq!(history_sweep(&history, &store, &cache, &stop, Duration::ZERO), 0);

    market_cycle(&market, &store);
    assert_eq!(history_sweep(&history, &store, &cache, &stop, Duration::ZERO), 2);
    assert_eq!(cache.get("COAL").unwrap().points.len(), 1);
    assert!(cache.get("BROKEN_BOOK").unwrap().is_empty());

    market_cycle(&market, &store);
    assert_eq!(history_sweep(&history, &store, &cache, &stop, Duration::ZERO), 1);
    assert_eq!(*history.scraped.lock(), vec!["COAL", "BROKEN_BOOK", "IRON"]);
    // older entries stay until replaced
    assert!(cache.get("COAL").is_some());
}

#[test]
fn sweep_stops_between_items() {
    let market = ScriptedMarket::new(vec![Ok(vec!["A_1", "A_2", "A_3"])]);
    let history = RecordingHistory::default();
    let store = MarketStore::new();
    let cache = HistoryCache::new();
    let stop = StopSignal::new();

    market_cycle(&market, &store);
    stop.stop();
    assert_eq!(history_sweep(&history, &store, &cache, &stop, Duration::ZERO), 0);
    assert!(cache.is_empty());
}

#[test]
fn engine_loops_publish_and_scrape() {
    let market = Arc::new(ScriptedMarket::new(vec![
        Ok(vec!["ENCHANTED_COAL", "BLAZE_ROD"]),
        Err(500),
        Ok(vec!["ENCHANTED_COAL", "BLAZE_ROD"]),
    ]));
    let history = Arc::new(RecordingHistory::default());

    let mut engine = BazaarEngine::with_sources(fast_config(), market.clone(), history.clone());
    engine.start().unwrap();

    assert!(wait_for(|| engine.generation() >= 2));
    assert!(wait_for(|| !engine.history("BLAZE_ROD").is_empty()));
    assert!(wait_for(|| engine.trend("ENCHANTED_COAL").is_some()));

    engine.shutdown();
    let calls = market.calls.load(Ordering::SeqCst);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(market.calls.load(Ordering::SeqCst), calls);

    // failures after the script ran out never cleared the published data
    assert_eq!(engine.current().unwrap().opportunities.len(), 2);
}

#[test]
fn stop_ends_long_sleeps_promptly() {
    let config = EngineConfig {
        market_interval: Duration::from_secs(60),
        history_item_delay: Duration::from_secs(60),
        history_sweep_interval: Duration::from_secs(300),
        ..Default::default()
    };
    let market = Arc::new(ScriptedMarket::new(vec![Ok(vec!["ENCHANTED_GOLD"])]));
    let history = Arc::new(RecordingHistory::default());

    let mut engine = BazaarEngine::with_sources(config, market, history);
    engine.start().unwrap();
    assert!(wait_for(|| engine.generation() == 1));

    let started = Instant::now();
    engine.shutdown();
    assert!(started.elapsed() < Duration::from_secs(5));
}
