// src/bin/fetch_profile.rs
// Run with: cargo run --bin fetch_profile -- <username> [start_year]

use annual_yield::config::AppConfig;
use annual_yield::models::FLOOR_YEAR;
use annual_yield::services::normalizer::{annual_yields, group_by_year};
use annual_yield::services::profile::{ProfileFetcher, RelayPageSource};
use annual_yield::services::year_range::resolve_effective_start;
use chrono::{Datelike, Utc};
use dotenv::dotenv;
use log::{error, info};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let username = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: fetch_profile <username> [start_year]"))?;
    let start_year: i32 = match args.next() {
        Some(raw) => raw.parse()?,
        None => FLOOR_YEAR,
    };

    let config = AppConfig::from_env();
    let source = RelayPageSource::new(config.relay_url, config.profile_url)?;
    let fetcher = ProfileFetcher::new(Arc::new(source), config.retry);

    info!("Fetching annual yields for {} from {}", username, start_year);
    let monthly = match fetcher.fetch(&username, |status| println!("{}", status)).await {
        Ok(monthly) => monthly,
        Err(e) => {
            error!("ERROR: Failed to fetch profile {}: {}", username, e);
            return Err(e.into());
        }
    };

    let grouped = group_by_year(&monthly);
    let effective_start = resolve_effective_start(start_year, grouped.earliest_year, FLOOR_YEAR);
    let yields = annual_yields(&grouped, effective_start, Utc::now().year());

    println!("Calculated Annual Returns:");
    println!("{}", "-".repeat(30));
    for (year, value) in &yields {
        let months = grouped.years.get(year).map_or(0, |m| m.len());
        println!("{}: {:.2}% (based on {} months)", year, value, months);
    }
    println!("{}", "-".repeat(30));

    Ok(())
}
