use statrs::statistics::Statistics;

use crate::model::HistorySeries;

/// Relative slope (per sample, as a fraction of the mean) under which a
/// series counts as flat.
const FLAT_SLOPE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Rising,
    Falling,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTrend {
    pub data_points: usize,

    pub first_price: f64,
    pub last_price: f64,
    pub change_pct: f64,

    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,

    pub q10: f64,
    pub q50: f64,
    pub q90: f64,

    pub slope: f64, // price change per sample, least squares
    pub direction: TrendDirection,
}

impl HistoryTrend {
    pub fn from_series(series: &HistorySeries) -> Option<HistoryTrend> {
        let prices = series.prices();
        let first_price = *prices.first()?;
        let last_price = *prices.last()?;

        let mut sorted = prices.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = prices.clone().mean();
        let std_dev = if prices.len() > 1 {
            prices.clone().std_dev()
        } else {
            0.0
        };

        let change_pct = if first_price != 0.0 {
            (last_price - first_price) / first_price * 100.0
        } else {
            0.0
        };

        let slope = least_squares_slope(&prices);
        let direction = if mean == 0.0 || (slope / mean).abs() < FLAT_SLOPE {
            TrendDirection::Flat
        } else if slope > 0.0 {
            TrendDirection::Rising
        } else {
            TrendDirection::Falling
        };

        Some(HistoryTrend {
            data_points: prices.len(),
            first_price,
            last_price,
            change_pct,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            std_dev,
            q10: quantile(&sorted, 0.10),
            q50: quantile(&sorted, 0.50),
            q90: quantile(&sorted, 0.90),
            slope,
            direction,
        })
    }
}

/// Nearest-rank quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        len => sorted[((len - 1) as f64 * q).round() as usize],
    }
}

/// Least-squares slope of price against sample index.
fn least_squares_slope(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let n = prices.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = prices.iter().sum::<f64>() / n;

    let (covariance, variance) = prices
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(cov, var), (i, &price)| {
            let dx = i as f64 - x_mean;
            (cov + dx * (price - y_mean), var + dx * dx)
        });

    if variance > 0.0 {
        covariance / variance
    } else {
        0.0
    }
}
