use bazaar_flipper::{BazaarEngine, EngineConfig, FilterCriteria, FlipOpportunity};
use tracing::{error, info, warn};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default();
    let poll = config.market_interval;
    let mut engine = BazaarEngine::new(config);

    if let Err(e) = engine.stop_on_ctrl_c() {
        warn!(error = %e, "could not install Ctrl-C handler");
    }

    if let Err(e) = engine.start() {
        error!(error = %e, "failed to start refresh loops");
        std::process::exit(1);
    }
    info!("bazaar flipper running");

    let criteria = FilterCriteria::default();
    let stop = engine.stop_signal();
    let mut shown = 0;

    while !stop.wait(poll) {
        let generation = engine.generation();
        if generation == shown {
            continue;
        }
        shown = generation;
        print_table(&engine.table(&criteria));

        if let Some(best) = engine.chart(&criteria).first() {
            if let Some(trend) = engine.trend(&best.item_id) {
                println!(
                    "{}: {} points, {:+.2}% ({:?})",
                    best.item_id, trend.data_points, trend.change_pct, trend.direction
                );
            }
        }
    }

    engine.shutdown();
    info!("bazaar flipper stopped");
}

fn print_table(rows: &[FlipOpportunity]) {
    println!(
        "{:<32} {:>12} {:>12} {:>10} {:>8} {:>10} {:>14}",
        "Product ID", "Buy Price", "Sell Price", "Spread", "Margin", "Volume", "Score"
    );
    for r in rows {
        println!(
            "{:<32} {:>12.2} {:>12.2} {:>10.2} {:>7.2}% {:>10} {:>14.2}",
            r.item_id, r.buy_price, r.sell_price, r.spread, r.margin_pct, r.total_volume, r.score
        );
    }
    println!();
}
