// src/services/market_history.rs
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{info, warn};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::errors::HistoryError;
use crate::models::IndexDefinition;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// A benchmark tracked in the reference data and the ticker it is priced from.
#[derive(Debug, Clone, Copy)]
pub struct TrackedIndex {
    pub name: &'static str,
    pub symbol: &'static str,
    pub color: &'static str,
}

pub const TRACKED_INDICES: [TrackedIndex; 5] = [
    TrackedIndex { name: "SPX500", symbol: "^GSPC", color: "#38bdf8" },
    TrackedIndex { name: "NSDQ100", symbol: "^NDX", color: "#a855f7" },
    TrackedIndex { name: "SWDA_L", symbol: "URTH", color: "#f472b6" },
    TrackedIndex { name: "EUSTX50", symbol: "^STOXX50E", color: "#fbbf24" },
    TrackedIndex { name: "CHINA50", symbol: "FXI", color: "#ef4444" },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: f64,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Daily price history from the Yahoo chart endpoint.
pub struct YahooHistory {
    client: Client,
}

impl YahooHistory {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(YahooHistory { client })
    }

    pub async fn daily_bars(&self, symbol: &str, from: NaiveDate) -> Result<Vec<DailyBar>, HistoryError> {
        let period1 = from
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| HistoryError::Parse(format!("bad start date {}", from)))?
            .and_utc()
            .timestamp();
        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            CHART_URL,
            symbol.replace('^', "%5E"),
            period1,
            Utc::now().timestamp()
        );
        info!("Fetching daily history from URL: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| HistoryError::Network(e.to_string()))?;

        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(HistoryError::RateLimited);
        }

        let body = resp
            .json::<ChartResponse>()
            .await
            .map_err(|e| HistoryError::Parse(e.to_string()))?;

        if let Some(err) = body.chart.error {
            return Err(HistoryError::BadResponse(err.to_string()));
        }
        let result = body
            .chart
            .result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| HistoryError::BadResponse("missing result".into()))?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| HistoryError::BadResponse("missing quote".into()))?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            // holidays and halts come back as null closes
            let Some(close) = quote.close.get(i).copied().flatten() else { continue };
            let date = DateTime::from_timestamp(*ts, 0)
                .ok_or_else(|| HistoryError::Parse(format!("bad timestamp {}", ts)))?
                .date_naive();
            bars.push(DailyBar {
                date,
                open: quote.open.get(i).copied().flatten(),
                close,
            });
        }
        bars.sort_by_key(|b| b.date);

        info!("Fetched {} daily bars for {}", bars.len(), symbol);
        Ok(bars)
    }

    pub async fn index_definition(&self, index: &TrackedIndex, from: NaiveDate) -> Result<IndexDefinition, HistoryError> {
        let bars = self.daily_bars(index.symbol, from).await?;
        Ok(IndexDefinition {
            name: index.name.to_string(),
            color: index.color.to_string(),
            returns: annual_returns(&bars),
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Year -> price return in percent, rounded to 2 decimals.
///
/// Each year compares its last close with the previous year's last close. The
/// first year has no previous close and runs from its first open instead.
/// The running year is included as a year-to-date figure.
pub fn annual_returns(bars: &[DailyBar]) -> BTreeMap<i32, f64> {
    let mut year_end: BTreeMap<i32, f64> = BTreeMap::new();
    for bar in bars {
        year_end.insert(bar.date.year(), bar.close);
    }

    let mut returns = BTreeMap::new();
    let Some(first) = bars.first() else { return returns };

    let mut base = first.open.unwrap_or(first.close);
    for (year, close) in year_end {
        if base > 0.0 {
            returns.insert(year, round2((close / base - 1.0) * 100.0));
        } else {
            warn!("Skipping {}: non-positive base price {}", year, base);
        }
        base = close;
    }
    returns
}
