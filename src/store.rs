use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::model::{FlipOpportunity, MarketSnapshot};

/// One published market cycle: a snapshot and the opportunities scored
/// from it, always seen together.
#[derive(Debug)]
pub struct MarketView {
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub snapshot: MarketSnapshot,
    pub opportunities: Vec<FlipOpportunity>,
}

impl MarketView {
    /// Distinct opportunity item ids, in snapshot order.
    pub fn item_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.opportunities
            .iter()
            .filter(|o| seen.insert(o.item_id.as_str()))
            .map(|o| o.item_id.clone())
            .collect()
    }
}

/// Latest published market view. Written by the market loop only.
#[derive(Debug, Default)]
pub struct MarketStore {
    current: RwLock<Option<Arc<MarketView>>>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace snapshot and opportunities as one visible update. Returns the
    /// new generation number.
    pub fn publish(&self, snapshot: MarketSnapshot, opportunities: Vec<FlipOpportunity>) -> u64 {
        let mut slot = self.current.write();
        let generation = slot.as_ref().map_or(1, |v| v.generation + 1);

        *slot = Some(Arc::new(MarketView {
            generation,
            published_at: Utc::now(),
            snapshot,
            opportunities,
        }));
        generation
    }

    /// `None` until the first successful publish.
    pub fn current(&self) -> Option<Arc<MarketView>> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().as_ref().map_or(0, |v| v.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Product, QuickStatus};
    use std::thread;

    fn snap(tag: i64) -> MarketSnapshot {
        MarketSnapshot::new(vec![Product {
            product_id: format!("ITEM_{}", tag),
            quick: QuickStatus {
                buy_price: 2.0,
                sell_price: 1.0,
                buy_volume: tag,
                sell_volume: tag,
            },
        }])
    }

    fn opps(tag: i64) -> Vec<FlipOpportunity> {
        vec![FlipOpportunity {
            item_id: format!("ITEM_{}", tag),
            buy_price: 2.0,
            sell_price: 1.0,
            spread: 1.0,
            margin_pct: 100.0,
            buy_volume: tag,
            sell_volume: tag,
            total_volume: tag * 2,
            score: tag as f64,
        }]
    }

    #[test]
    fn empty_store_is_not_available() {
        let store = MarketStore::new();
        assert!(store.current().is_none());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn publish_with_no_opportunities_is_still_available() {
        let store = MarketStore::new();
        store.publish(snap(1), Vec::new());
        let view = store.current().unwrap();
        assert!(view.opportunities.is_empty());
        assert_eq!(view.generation, 1);
    }

    #[test]
    fn generations_increase() {
        let store = MarketStore::new();
        assert_eq!(store.publish(snap(1), opps(1)), 1);
        assert_eq!(store.publish(snap(2), opps(2)), 2);
        assert_eq!(store.current().unwrap().snapshot.products[0].product_id, "ITEM_2");
    }

    #[test]
    fn item_ids_are_distinct() {
        let store = MarketStore::new();
        let mut list = opps(1);
        list.extend(opps(1));
        list.extend(opps(2));
        store.publish(snap(1), list);
        assert_eq!(store.current().unwrap().item_ids(), vec!["ITEM_1", "ITEM_2"]);
    }

    #[test]
    fn readers_never_see_torn_pairs() {
        let store = Arc::new(MarketStore::new());

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for tag in 1..=2000 {
                    store.publish(snap(tag), opps(tag));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..5000 {
                        if let Some(view) = store.current() {
                            assert_eq!(
                                view.snapshot.products[0].product_id,
                                view.opportunities[0].item_id
                            );
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.generation(), 2000);
    }
}
