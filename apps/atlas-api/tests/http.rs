use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode},
};
use serde_json::{Map, Value};
use time::{Duration, macros::datetime};
use tower::util::ServiceExt;

use atlas_api::{routes, state::AppState};
use atlas_config::{
	Config, EmbeddingProviderConfig, Postgres, Providers, Ranking, Search, Service, Storage,
};
use atlas_service::{AtlasService, BoxFuture, DocumentStore, Error, MemoryStore, Result};
use atlas_storage::{db::Db, models::Document, queries};
use atlas_testkit::TestDatabase;

struct UnreachableStore;
impl DocumentStore for UnreachableStore {
	fn find_by_pattern<'a>(
		&'a self,
		_pattern: &'a str,
		_source: Option<&'a str>,
		_limit: u32,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move { Err(Error::Storage { message: "connection refused".to_string() }) })
	}

	fn count<'a>(&'a self, _source: Option<&'a str>) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { Ok(1_000) })
	}
}

fn test_config(dsn: String) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage { postgres: Postgres { dsn, pool_max_conns: 1 } },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: 2,
				timeout_ms: 1_000,
				batch_size: 64,
				default_headers: Map::new(),
			},
			structurer: None,
		},
		search: Search::default(),
		ranking: Ranking::default(),
	}
}

fn document(idx: i64, title: &str) -> Document {
	Document {
		id: format!("doc-{idx:03}"),
		source: "drive".to_string(),
		title: title.to_string(),
		snippet: String::new(),
		content: None,
		path: format!("/drive/doc-{idx:03}"),
		kind: "text/plain".to_string(),
		updated_at: datetime!(2024-01-01 00:00 UTC) + Duration::minutes(idx),
	}
}

fn corpus() -> Vec<Document> {
	(0..60)
		.map(|idx| match idx % 3 {
			0 => document(idx, &format!("Roadmap {idx}")),
			_ => document(idx, &format!("Weekly sync {idx}")),
		})
		.collect()
}

fn memory_app(documents: Vec<Document>) -> Router {
	let cfg = test_config("postgres://unused@localhost/atlas".to_string());
	let service = AtlasService::new(cfg, Arc::new(MemoryStore::new(documents)));

	routes::router(AppState::from_service(service))
}

fn search_request(payload: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/v1/search")
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let response = memory_app(Vec::new())
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn title_search_returns_ranked_items() {
	let response = memory_app(corpus())
		.oneshot(search_request(serde_json::json!({
			"title_query": "roadmap",
			"page_size": 5,
			"explain": true,
		})))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "ok");
	assert_eq!(json["total"], 20);
	assert_eq!(json["page_size"], 5);
	assert_eq!(json["items"].as_array().map(Vec::len), Some(5));
	assert_eq!(json["items"][0]["id"], "doc-057");
	assert_eq!(json["items"][0]["updated_at"], "2024-01-01T00:57:00Z");
	assert_eq!(json["items"][0]["explain"]["lexical"], 5_000.0);
	assert_eq!(json["diagnostics"]["mode"], "title");
	assert_eq!(json["diagnostics"]["semantic"]["status"], "not_requested");
}

#[tokio::test]
async fn empty_query_is_a_status_not_an_error() {
	let response = memory_app(corpus())
		.oneshot(search_request(serde_json::json!({ "title_query": " " })))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "empty_query");
	assert_eq!(json["items"], serde_json::json!([]));
}

#[tokio::test]
async fn small_index_is_reported_as_not_ready() {
	let documents = corpus().into_iter().take(30).collect();
	let response = memory_app(documents)
		.oneshot(search_request(serde_json::json!({ "title_query": "roadmap" })))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["status"], "index_not_ready");
	assert_eq!(json["diagnostics"]["index_count"], 30);
}

#[tokio::test]
async fn invalid_paging_maps_to_bad_request() {
	let response = memory_app(corpus())
		.oneshot(search_request(serde_json::json!({ "title_query": "roadmap", "page": 0 })))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_request");
	assert!(json.get("diagnostics").is_none());
}

#[tokio::test]
async fn store_failure_maps_to_service_unavailable_with_diagnostics() {
	let cfg = test_config("postgres://unused@localhost/atlas".to_string());
	let service = AtlasService::new(cfg, Arc::new(UnreachableStore));
	let response = routes::router(AppState::from_service(service))
		.oneshot(search_request(serde_json::json!({ "title_query": "roadmap" })))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "retrieval_unavailable");
	assert_eq!(json["diagnostics"]["stage"], "retrieving");
	assert_eq!(json["diagnostics"]["index_count"], 1_000);
}

#[tokio::test]
async fn index_status_reports_readiness_per_source() {
	let app = memory_app(corpus());
	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/v1/index/status")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call index status.");
	let json = json_body(response).await;

	assert_eq!(json["document_count"], 60);
	assert_eq!(json["ready"], true);

	let response = app
		.oneshot(
			Request::builder()
				.uri("/v1/index/status?source=tracker")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call index status.");
	let json = json_body(response).await;

	assert_eq!(json["source"], "tracker");
	assert_eq!(json["document_count"], 0);
	assert_eq!(json["ready"], false);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set ATLAS_PG_DSN to run."]
async fn postgres_backed_title_search() {
	let Some(base_dsn) = atlas_testkit::env_dsn() else {
		eprintln!("Skipping postgres_backed_title_search; set ATLAS_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let config = test_config(test_db.dsn().to_string());
	let db = Db::connect(&config.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	for doc in corpus() {
		queries::upsert_document(&db.pool, &doc).await.expect("Failed to insert document.");
	}

	let state = AppState::new(config).await.expect("Failed to initialize app state.");
	let response = routes::router(state)
		.oneshot(search_request(serde_json::json!({ "title_query": "ROADMAP", "page_size": 3 })))
		.await
		.expect("Failed to call search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["total"], 20);
	assert_eq!(json["items"][0]["id"], "doc-057");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
