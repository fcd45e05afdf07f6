// src/handlers/session.rs
use warp::reply::Json;
use warp::Rejection;
use std::sync::Arc;
use log::{debug, info};

use crate::routes::AppState;
use crate::services::session::Action;

pub async fn get_view(state: Arc<AppState>) -> Result<Json, Rejection> {
    debug!("Handling request for current view");
    let session = state.session.lock().await;
    Ok(warp::reply::json(&session.render()))
}

pub async fn post_action(action: Action, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Dispatching action: {:?}", action);
    let mut session = state.session.lock().await;
    let view = session.dispatch(action);
    Ok(warp::reply::json(&view))
}

pub async fn get_indices(state: Arc<AppState>) -> Result<Json, Rejection> {
    let session = state.session.lock().await;
    Ok(warp::reply::json(&session.indices()))
}
