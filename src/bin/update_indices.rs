// src/bin/update_indices.rs
// Run with: cargo run --bin update_indices -- [output_csv]

use annual_yield::models::FLOOR_YEAR;
use annual_yield::services::indices::write_index_definitions;
use annual_yield::services::market_history::{YahooHistory, TRACKED_INDICES};
use anyhow::Context;
use chrono::NaiveDate;
use dotenv::dotenv;
use log::{error, info};
use std::fs::File;

const DEFAULT_OUTPUT: &str = "data/indices.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let output = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    let from = NaiveDate::from_ymd_opt(FLOOR_YEAR, 1, 1).context("invalid floor date")?;
    let history = YahooHistory::new()?;

    info!("Fetching index history from {} for {} indices", from, TRACKED_INDICES.len());
    let mut indices = Vec::new();
    for index in &TRACKED_INDICES {
        match history.index_definition(index, from).await {
            Ok(definition) => {
                info!("{} ({}): {} years", index.name, index.symbol, definition.returns.len());
                indices.push(definition);
            }
            // one failing ticker should not block the rest
            Err(e) => error!("ERROR: Failed to fetch {} ({}): {}", index.name, index.symbol, e),
        }
    }

    if indices.is_empty() {
        anyhow::bail!("no index history could be fetched, leaving {} untouched", output);
    }

    let file = File::create(&output).with_context(|| format!("creating {}", output))?;
    write_index_definitions(file, &indices)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("writing {}", output))?;
    println!("Successfully updated {} ({} indices)", output, indices.len());

    Ok(())
}
