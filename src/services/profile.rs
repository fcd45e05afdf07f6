//src/services/profile.rs
use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use reqwest::{Client, Url};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::{sleep, timeout};

use crate::config::RetryPolicy;
use crate::errors::ImportError;
use crate::models::MonthlyReturns;
use crate::services::normalizer::parse_monthly_returns;

/// Bodies shorter than this that mention "error" come from the relay, not the profile.
const PROXY_ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// Where profile pages come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, username: &str) -> Result<PageResponse, ImportError>;
}

/// Fetches profile pages through a CORS relay, busting caches with a timestamp.
pub struct RelayPageSource {
    client: Client,
    relay_url: String,
    profile_url: String,
}

impl RelayPageSource {
    pub fn new(relay_url: impl Into<String>, profile_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(RelayPageSource {
            client,
            relay_url: relay_url.into(),
            profile_url: profile_url.into(),
        })
    }

    pub fn request_url(&self, username: &str) -> Result<Url, ImportError> {
        let target = format!("{}/{}", self.profile_url.trim_end_matches('/'), username);
        let timestamp = Utc::now().timestamp_millis().to_string();
        Url::parse_with_params(
            &self.relay_url,
            &[("url", target.as_str()), ("timestamp", timestamp.as_str())],
        )
        .map_err(|e| ImportError::Transport(format!("invalid relay url: {}", e)))
    }
}

fn transport_error(e: reqwest::Error) -> ImportError {
    if e.is_timeout() {
        ImportError::Timeout
    } else {
        ImportError::Transport(e.to_string())
    }
}

#[async_trait]
impl PageSource for RelayPageSource {
    async fn fetch_page(&self, username: &str) -> Result<PageResponse, ImportError> {
        let url = self.request_url(username)?;
        info!("Fetching profile page from URL: {}", url);

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        Ok(PageResponse { status, body })
    }
}

/// Applies the relay's status conventions and returns the page body on success.
pub fn classify_response(username: &str, page: PageResponse) -> Result<String, ImportError> {
    match page.status {
        200..=299 => {}
        408 | 504 => return Err(ImportError::Timeout),
        // the relay answers 500 when the profile itself is missing
        500 => return Err(ImportError::NotFound(username.to_string())),
        other => return Err(ImportError::Network(other)),
    }

    if page.body.len() < PROXY_ERROR_BODY_LIMIT && page.body.to_lowercase().contains("error") {
        return Err(ImportError::Proxy);
    }

    Ok(page.body)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchStatus {
    Fetching,
    Retrying { attempt: u32, max_retries: u32 },
    Loaded,
    Failed { message: String },
}

impl FetchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchStatus::Loaded | FetchStatus::Failed { .. })
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchStatus::Fetching => write!(f, "Fetching data..."),
            FetchStatus::Retrying { attempt, max_retries } => {
                write!(f, "Timeout, retrying... ({}/{})", attempt, max_retries)
            }
            FetchStatus::Loaded => write!(f, "Data loaded successfully!"),
            FetchStatus::Failed { message } => write!(f, "{}", message),
        }
    }
}

/// Runs one fetch sequence: bounded attempts, retries on timeouts only,
/// exactly one terminal status per call.
#[derive(Clone)]
pub struct ProfileFetcher {
    source: Arc<dyn PageSource>,
    policy: RetryPolicy,
}

impl ProfileFetcher {
    pub fn new(source: Arc<dyn PageSource>, policy: RetryPolicy) -> Self {
        ProfileFetcher { source, policy }
    }

    pub async fn fetch<F>(&self, username: &str, mut on_status: F) -> Result<MonthlyReturns, ImportError>
    where
        F: FnMut(&FetchStatus) + Send,
    {
        let username = username.trim();
        if username.is_empty() {
            let err = ImportError::EmptyUsername;
            on_status(&FetchStatus::Failed { message: err.to_string() });
            return Err(err);
        }

        on_status(&FetchStatus::Fetching);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.attempt(username).await {
                Ok(monthly) => {
                    info!("Fetched {} monthly returns for {} (attempt {})", monthly.len(), username, attempt);
                    on_status(&FetchStatus::Loaded);
                    return Ok(monthly);
                }
                Err(e) if e.is_retryable() && attempt <= self.policy.max_retries => {
                    warn!("Attempt {} for {} failed: {}", attempt, username, e);
                    on_status(&FetchStatus::Retrying {
                        attempt,
                        max_retries: self.policy.max_retries,
                    });
                    sleep(self.policy.backoff).await;
                }
                Err(e) => {
                    error!("Fetching {} failed after {} attempt(s): {}", username, attempt, e);
                    on_status(&FetchStatus::Failed { message: e.to_string() });
                    return Err(e);
                }
            }
        }
    }

    async fn attempt(&self, username: &str) -> Result<MonthlyReturns, ImportError> {
        let page = match timeout(self.policy.attempt_timeout, self.source.fetch_page(username)).await {
            Ok(result) => result?,
            Err(_) => return Err(ImportError::Timeout),
        };
        let body = classify_response(username, page)?;
        parse_monthly_returns(&body)
    }
}
