//! HTTP surface tests against the warp filter tree, no network involved.
use annual_yield::config::RetryPolicy;
use annual_yield::errors::ImportError;
use annual_yield::models::IndexDefinition;
use annual_yield::routes::{routes, AppState};
use annual_yield::services::profile::{PageResponse, PageSource, ProfileFetcher};
use annual_yield::services::session::Session;
use annual_yield::services::storage::MemoryBlobStore;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct StaticSource(u16, &'static str);

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch_page(&self, _username: &str) -> Result<PageResponse, ImportError> {
        Ok(PageResponse { status: self.0, body: self.1.to_string() })
    }
}

fn state(source: StaticSource) -> Arc<AppState> {
    let index = IndexDefinition {
        name: "SPX500".to_string(),
        color: "#38bdf8".to_string(),
        returns: [(2020, 5.0), (2021, 5.0)].into_iter().collect(),
    };
    let session = Session::with_year(Box::new(MemoryBlobStore::new()), vec![index], 2026);
    let policy = RetryPolicy {
        attempt_timeout: Duration::from_millis(50),
        backoff: Duration::from_millis(1),
        max_retries: 2,
    };
    Arc::new(AppState::new(session, ProfileFetcher::new(Arc::new(source), policy)))
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn initial_view_is_empty() {
    let api = routes(state(StaticSource(200, "")));
    let resp = warp::test::request().method("GET").path("/api/v1/view").reply(&api).await;

    assert_eq!(resp.status(), 200);
    let view = body_json(resp.body());
    assert_eq!(view["comparison"], json!([]));
    assert_eq!(view["user_curve"], Value::Null);
    assert_eq!(view["range"]["end_year"], json!(2026));
}

#[tokio::test]
async fn actions_update_the_view() {
    let api = routes(state(StaticSource(200, "")));

    warp::test::request()
        .method("POST")
        .path("/api/v1/actions")
        .json(&json!({"type": "set_return", "year": 2020, "value": 10.0}))
        .reply(&api)
        .await;
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/actions")
        .json(&json!({"type": "set_return", "year": 2021, "value": -10.0}))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 200);
    let view = body_json(resp.body());
    assert_eq!(view["comparison"][0]["name"], json!("SPX500"));
    assert_eq!(view["comparison"][0]["verdict"], json!("underperformance"));
}

#[tokio::test]
async fn import_returns_statuses_and_view() {
    let page = r#"<html>"monthlyReturns": {"2021-01": 1.5, "2021-02": 2.0}</html>"#;
    let api = routes(state(StaticSource(200, page)));

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/import")
        .json(&json!({"username": "BorisAka", "start_year": 2020}))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 200);
    let body = body_json(resp.body());
    assert_eq!(body["statuses"][0]["state"], json!("fetching"));
    assert_eq!(body["statuses"][1]["state"], json!("loaded"));
    assert_eq!(body["view"]["range"]["start_year"], json!(2021));
    assert_eq!(body["view"]["inputs"]["2021"], json!(3.53));
}

#[tokio::test]
async fn import_failure_maps_to_status_code() {
    let api = routes(state(StaticSource(500, "")));

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/import")
        .json(&json!({"username": "borisaka"}))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 404);
    let body = body_json(resp.body());
    assert!(body["error"].as_str().unwrap().contains("capitalization"));
}

#[tokio::test]
async fn malformed_action_is_bad_request() {
    let api = routes(state(StaticSource(200, "")));
    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/actions")
        .json(&json!({"type": "launch_rockets"}))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn indices_are_listed() {
    let api = routes(state(StaticSource(200, "")));
    let resp = warp::test::request().method("GET").path("/api/v1/indices").reply(&api).await;

    assert_eq!(resp.status(), 200);
    let body = body_json(resp.body());
    assert_eq!(body[0]["name"], json!("SPX500"));
    assert_eq!(body[0]["returns"]["2020"], json!(5.0));
}
