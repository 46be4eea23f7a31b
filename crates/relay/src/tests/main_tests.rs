use super::*;
use axum::{body, body::Body, http::Request, response::IntoResponse};
use crate::config::Settings;
use serde_json::{json, Value};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};
use tower::ServiceExt;

#[derive(Clone)]
struct UpstreamState {
    tx: Arc<Mutex<Option<oneshot::Sender<Value>>>>,
    status: StatusCode,
    body: Value,
}

async fn handle_query(
    State(state): State<UpstreamState>,
    Json(payload): Json<Value>,
) -> axum::response::Response {
    if let Some(tx) = state.tx.lock().await.take() {
        let _ = tx.send(payload);
    }
    (state.status, Json(state.body)).into_response()
}

async fn spawn_upstream(
    status: StatusCode,
    body: Value,
) -> anyhow::Result<(String, oneshot::Receiver<Value>)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, rx) = oneshot::channel();
    let state = UpstreamState {
        tx: Arc::new(Mutex::new(Some(tx))),
        status,
        body,
    };
    let app = Router::new()
        .route("/query-codebase/", post(handle_query))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), rx))
}

fn test_app(upstream_url: String) -> Router {
    let settings = Settings {
        upstream_url,
        ..Settings::default()
    };
    let upstream = Upstream::new(&settings).expect("upstream");
    build_router(Arc::new(AppState { upstream }), settings.max_body_bytes)
}

fn chat_request(body: String) -> Request<Body> {
    Request::post("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app("http://127.0.0.1:9".to_string());
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn forwards_latest_message_and_relays_answer() {
    let (url, payload_rx) = spawn_upstream(
        StatusCode::OK,
        json!({ "status": "success", "response": "It parses args.", "context_files": ["main.py"] }),
    )
    .await
    .expect("spawn upstream");
    let app = test_app(url);

    let messages = json!([
        { "role": "user", "content": "hello" },
        { "role": "assistant", "content": "hi" },
        { "role": "user", "content": "What does main.py do?" }
    ]);
    let response = app
        .oneshot(chat_request(json!({ "messages": messages }).to_string()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "response": "It parses args." })
    );

    let forwarded = payload_rx.await.expect("forwarded");
    assert_eq!(forwarded["query"], "What does main.py do?");
    assert_eq!(forwarded["namespace"], "default-namespace");
    assert_eq!(forwarded["messages"], messages);
}

#[tokio::test]
async fn upstream_server_error_becomes_relay_failure() {
    let (url, _payload_rx) = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "boom" }),
    )
    .await
    .expect("spawn upstream");
    let app = test_app(url);

    let response = app
        .oneshot(chat_request(
            json!({ "messages": [{ "role": "user", "content": "hi" }] }).to_string(),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: RelayError = serde_json::from_value(json_body(response).await).expect("error body");
    assert_eq!(body.error, "Failed to process message");
    assert_eq!(body.details, "Backend API request failed: 500");
}

#[tokio::test]
async fn upstream_error_status_in_body_becomes_relay_failure() {
    let (url, _payload_rx) = spawn_upstream(
        StatusCode::OK,
        json!({ "status": "error", "message": "index not found" }),
    )
    .await
    .expect("spawn upstream");
    let app = test_app(url);

    let response = app
        .oneshot(chat_request(
            json!({ "messages": [{ "role": "user", "content": "hi" }] }).to_string(),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert!(body["details"]
        .as_str()
        .expect("details")
        .contains("index not found"));
}

#[tokio::test]
async fn empty_message_list_is_rejected_without_forwarding() {
    let (url, mut payload_rx) = spawn_upstream(StatusCode::OK, json!({}))
        .await
        .expect("spawn upstream");
    let app = test_app(url);

    let response = app
        .oneshot(chat_request(json!({ "messages": [] }).to_string()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to process message");
    assert!(payload_rx.try_recv().is_err());
}

#[tokio::test]
async fn unreadable_body_uses_relay_error_shape() {
    let app = test_app("http://127.0.0.1:9".to_string());

    let response = app
        .oneshot(chat_request("{not json".to_string()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Failed to process message");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn messages_are_forwarded_exactly_as_received() {
    let (url, payload_rx) = spawn_upstream(
        StatusCode::OK,
        json!({ "status": "success", "response": "It defines helpers." }),
    )
    .await
    .expect("spawn upstream");
    let app = test_app(url);

    let messages = json!([
        { "role": "assistant", "content": "hi", "context_files": ["a.py"] },
        { "content": "What is in a.py?", "id": 7 }
    ]);
    let response = app
        .oneshot(chat_request(json!({ "messages": messages }).to_string()))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let forwarded = payload_rx.await.expect("forwarded");
    assert_eq!(forwarded["messages"], messages);
    assert_eq!(forwarded["query"], "What is in a.py?");
}

#[tokio::test]
async fn latest_message_without_text_is_rejected_without_forwarding() {
    let (url, mut payload_rx) = spawn_upstream(StatusCode::OK, json!({}))
        .await
        .expect("spawn upstream");
    let app = test_app(url);

    let response = app
        .oneshot(chat_request(
            json!({ "messages": [{ "role": "user" }] }).to_string(),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["details"], "latest message has no text content");
    assert!(payload_rx.try_recv().is_err());
}
