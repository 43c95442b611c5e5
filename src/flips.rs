use rayon::prelude::*;

use crate::model::{FlipOpportunity, MarketSnapshot, QuickStatus};

pub const MIN_TOTAL_VOLUME: i64 = 100;
pub const DAMPING_VOLUME: i64 = 500;

const MARGIN_EXP: f64 = 0.5;
const BUY_VOLUME_EXP: f64 = 1.2;
const SELL_VOLUME_EXP: f64 = 0.8;

/// Score every product in the snapshot. Output keeps snapshot order and is
/// not ranked; ranking happens in the filter layer.
pub fn score(snapshot: &MarketSnapshot) -> Vec<FlipOpportunity> {
    snapshot
        .products
        .par_iter()
        .filter_map(|p| score_item(&p.product_id, &p.quick))
        .collect()
}

pub fn score_item(item_id: &str, quick: &QuickStatus) -> Option<FlipOpportunity> {
    // Feed contract says volumes are never negative; clamp if it lies.
    let buy_vol = quick.buy_volume.max(0);
    let sell_vol = quick.sell_volume.max(0);

    let spread = quick.buy_price - quick.sell_price;
    // Saturate: the loader casts huge float volumes to i64::MAX.
    let total_volume = buy_vol.saturating_add(sell_vol);

    if !(spread > 0.0 && total_volume > MIN_TOTAL_VOLUME) {
        return None;
    }

    let max_vol = buy_vol.max(sell_vol);
    let volume_ratio = if max_vol > 0 {
        buy_vol.min(sell_vol) as f64 / max_vol as f64
    } else {
        0.0
    };

    let rel_spread = if quick.sell_price != 0.0 {
        spread / quick.sell_price
    } else {
        0.0
    };

    // A negative sell price would make rel_spread negative and powf NaN.
    let mut score = rel_spread.max(0.0).powf(MARGIN_EXP)
        * (buy_vol as f64).powf(BUY_VOLUME_EXP)
        * (sell_vol as f64).powf(SELL_VOLUME_EXP)
        * volume_ratio;

    // Liquidity damping for thin markets
    if total_volume < DAMPING_VOLUME {
        score *= total_volume as f64 / DAMPING_VOLUME as f64;
    }

    Some(FlipOpportunity {
        item_id: item_id.to_string(),
        buy_price: round2(quick.buy_price),
        sell_price: round2(quick.sell_price),
        spread: round2(spread),
        margin_pct: round2(rel_spread * 100.0),
        buy_volume: buy_vol,
        sell_volume: sell_vol,
        total_volume,
        score: round2(score),
    })
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
