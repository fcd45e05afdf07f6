// src/routes.rs
use std::sync::Arc;
use tokio::sync::Mutex;
use warp::reject::Rejection;
use crate::handlers::{import::post_import, session::{get_indices, get_view, post_action}};
use crate::services::profile::ProfileFetcher;
use crate::services::session::Session;
use log::info;

use std::convert::Infallible;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

/// Shared by every route. The mutex serializes events against the single session.
pub struct AppState {
    pub session: Mutex<Session>,
    pub fetcher: ProfileFetcher,
}

impl AppState {
    pub fn new(session: Session, fetcher: ProfileFetcher) -> Self {
        AppState {
            session: Mutex::new(session),
            fetcher,
        }
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = body_error.to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let view_route = warp::path!("api" / "v1" / "view")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_view);

    let action_route = warp::path!("api" / "v1" / "actions")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(post_action);

    let import_route = warp::path!("api" / "v1" / "import")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(post_import);

    let indices_route = warp::path!("api" / "v1" / "indices")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_indices);

    info!("All routes configured successfully.");

    view_route
        .or(action_route)
        .or(import_route)
        .or(indices_route)
        .recover(handle_rejection)
}
