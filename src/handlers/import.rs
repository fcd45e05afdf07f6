// src/handlers/import.rs
use warp::reply::Json;
use warp::Rejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use log::{error, info};

use super::error::ApiError;
use crate::models::{ViewState, FLOOR_YEAR};
use crate::routes::AppState;
use crate::services::profile::FetchStatus;

fn default_start_year() -> i32 {
    2020
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub username: String,
    #[serde(default = "default_start_year")]
    pub start_year: i32,
}

#[derive(Serialize)]
struct ImportResponse {
    statuses: Vec<FetchStatus>,
    view: ViewState,
}

pub async fn post_import(request: ImportRequest, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling import for {} from {}", request.username, request.start_year);

    // the session lock is held for the whole fetch sequence: one import at a time
    let mut session = state.session.lock().await;
    let mut statuses = Vec::new();
    let start_year = request.start_year.max(FLOOR_YEAR);

    let result = session
        .import_profile(&state.fetcher, &request.username, start_year, |s| statuses.push(s.clone()))
        .await;

    match result {
        Ok(view) => Ok(warp::reply::json(&ImportResponse { statuses, view })),
        Err(e) => {
            error!("Import for {} failed: {}", request.username, e);
            Err(warp::reject::custom(ApiError::from(&e)))
        }
    }
}
