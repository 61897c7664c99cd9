//! Local catalog API used by tests.

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct FixtureState {
  hits: Arc<AtomicUsize>,
  queries: Arc<Mutex<Vec<String>>>,
}

pub struct FixtureServer {
  pub base_url: String,
  state: FixtureState,
}

impl FixtureServer {
  /// Number of requests served so far.
  pub fn hits(&self) -> usize {
    self.state.hits.load(Ordering::SeqCst)
  }

  /// Raw query strings received by `videos/`, in order.
  pub fn queries(&self) -> Vec<String> {
    self.state.queries.lock().unwrap().clone()
  }
}

/// Start a server on an ephemeral port.
///
/// `videos/` and `videos/1/` answer with data, other video ids are 404,
/// `groups/` fails with a 500 and `tags/` returns a non-JSON body.
pub async fn spawn() -> FixtureServer {
  let state = FixtureState::default();
  let app = Router::new()
    .route("/api/videos/", get(list_videos))
    .route("/api/videos/:id/", get(video_detail))
    .route("/api/groups/", get(failing_groups))
    .route("/api/tags/", get(malformed_tags))
    .with_state(state.clone());

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  FixtureServer {
    base_url: format!("http://{}/api", addr),
    state,
  }
}

/// Base URL of a port nothing listens on.
pub async fn closed_base_url() -> String {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);
  format!("http://{}/api", addr)
}

fn video(id: u64, title: &str, view_count: u64) -> Value {
  json!({
    "id": id,
    "bv_number": format!("BV{}", id),
    "title": title,
    "view_count": view_count,
    "created_at": "2024-05-01T10:00:00Z",
  })
}

async fn list_videos(State(state): State<FixtureState>, RawQuery(query): RawQuery) -> Json<Value> {
  state.hits.fetch_add(1, Ordering::SeqCst);
  state.queries.lock().unwrap().push(query.unwrap_or_default());
  Json(json!({
    "count": 2,
    "next": null,
    "previous": null,
    "results": [video(1, "First", 10), video(2, "Second", 5)],
  }))
}

async fn video_detail(
  State(state): State<FixtureState>,
  Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
  state.hits.fetch_add(1, Ordering::SeqCst);
  if id != 1 {
    return Err(StatusCode::NOT_FOUND);
  }
  let mut detail = video(1, "First", 10);
  detail["tags"] = json!([{"id": 3, "name": "stage"}]);
  detail["average_rating"] = json!(4.5);
  Ok(Json(detail))
}

async fn failing_groups(State(state): State<FixtureState>) -> (StatusCode, &'static str) {
  state.hits.fetch_add(1, Ordering::SeqCst);
  (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable")
}

async fn malformed_tags(State(state): State<FixtureState>) -> &'static str {
  state.hits.fetch_add(1, Ordering::SeqCst);
  "<html>not json</html>"
}
