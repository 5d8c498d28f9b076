//! Query clients against a local HTTP server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use loadclient_query::{
    ElasticsearchQueryConfig, LokiQueryConfig, QueryError, QueryTarget,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Seen {
    params: Arc<Mutex<Vec<HashMap<String, String>>>>,
    tenants: Arc<Mutex<Vec<Option<String>>>>,
    bodies: Arc<Mutex<Vec<String>>>,
}

async fn query_range(
    State(seen): State<Seen>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    seen.tenants.lock().unwrap().push(
        headers
            .get("x-scope-orgid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    seen.params.lock().unwrap().push(params);
    Json(json!({
        "status": "success",
        "data": {
            "resultType": "streams",
            "result": [
                {"stream": {"client": "promtail"}, "values": [["1", "a"], ["2", "b"], ["3", "c"]]},
                {"stream": {"client": "other"}, "values": [["4", "d"], ["5", "e"]]}
            ],
            "stats": {"summary": {"execTime": 0.25}}
        }
    }))
}

async fn search(State(seen): State<Seen>, body: String) -> Json<Value> {
    seen.bodies.lock().unwrap().push(body);
    Json(json!({"took": 7, "hits": {"total": {"value": 42, "relation": "eq"}, "hits": []}}))
}

async fn failing() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "parse error at line 1")
}

async fn start(seen: Seen) -> SocketAddr {
    let app = Router::new()
        .route("/loki/api/v1/query_range", get(query_range))
        .route("/logger/_search", post(search))
        .route("/broken/_search", post(failing))
        .with_state(seen);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_loki_query_range() {
    let seen = Seen::default();
    let addr = start(seen.clone()).await;

    let mut config = LokiQueryConfig::new(format!("http://{addr}"));
    config.tenant_id = Some("team-b".into());
    config.range = Duration::from_secs(60);
    let client = QueryTarget::Loki(config).connect().unwrap();

    let outcome = client.execute("{client=\"promtail\"}").await.unwrap();
    assert_eq!(outcome.result_count, 5);
    assert_eq!(outcome.backend_time, Some(Duration::from_millis(250)));

    let params = seen.params.lock().unwrap()[0].clone();
    assert_eq!(params["query"], "{client=\"promtail\"}");
    assert_eq!(params["limit"], "4000");
    assert_eq!(params["direction"], "forward");
    let start: i64 = params["start"].parse().unwrap();
    let end: i64 = params["end"].parse().unwrap();
    assert_eq!(end - start, 60_000_000_000);
    assert_eq!(seen.tenants.lock().unwrap()[0].as_deref(), Some("team-b"));
}

#[tokio::test]
async fn test_elasticsearch_search() {
    let seen = Seen::default();
    let addr = start(seen.clone()).await;

    let client = QueryTarget::Elasticsearch(ElasticsearchQueryConfig::new(format!("http://{addr}")))
        .connect()
        .unwrap();
    let body = r#"{"query":{"match":{"level":"error"}}}"#;
    let outcome = client.execute(body).await.unwrap();

    assert_eq!(outcome.result_count, 42);
    assert_eq!(outcome.backend_time, Some(Duration::from_millis(7)));
    assert_eq!(seen.bodies.lock().unwrap()[0], body);
}

#[tokio::test]
async fn test_backend_error_is_reported() {
    let addr = start(Seen::default()).await;

    let mut config = ElasticsearchQueryConfig::new(format!("http://{addr}"));
    config.index = "broken".into();
    let client = QueryTarget::Elasticsearch(config).connect().unwrap();

    let err = client.execute("{}").await.unwrap_err();
    match err {
        QueryError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("parse error"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
