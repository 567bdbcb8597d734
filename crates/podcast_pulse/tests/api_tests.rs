mod mocks;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use mocks::{datastore::MockDataStore, page_fetcher::MockPageFetcher, summarizer::MockSummarizer};
use podcast_pulse::{
    api::{self, AppState, INGEST_ROUTE, PROCESS_ROUTE},
    ingest::PodcastIngestHandler,
    EpisodeProcessorBuilder, SkipTranscriber,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn site() -> MockPageFetcher {
    MockPageFetcher::default()
        .with_podcast("pod1", MockPageFetcher::fixture_podcast())
        .with_episode("ep4", MockPageFetcher::fixture_episode())
}

fn app(store: MockDataStore, summarizer: MockSummarizer) -> Router {
    let fetcher = site();
    let processor = Arc::new(
        EpisodeProcessorBuilder::new()
            .store(store.clone())
            .page_fetcher(fetcher.clone())
            .summarizer(summarizer)
            .transcriber(SkipTranscriber)
            .build(),
    );
    let ingest = PodcastIngestHandler::new(store, fetcher, Arc::clone(&processor));

    api::router(AppState {
        ingest: Arc::new(ingest),
        dispatcher: processor,
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_preflight_is_permissive() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(PROCESS_ROUTE)
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app(MockDataStore::default(), MockSummarizer::structured())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_ingest_endpoint_reports_counts() {
    let (store, creator_id) = MockDataStore::with_creator("pod1");

    let (status, body) = send(
        app(store.clone(), MockSummarizer::structured()),
        post_json(
            INGEST_ROUTE,
            json!({ "podcastId": "pod1", "creatorId": creator_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["episodesCount"], 3);
    assert_eq!(body["processedCount"], 3);
    assert_eq!(body["podcast"]["name"], "声东击西");
    assert_eq!(body["podcast"]["id"], "pod1");
    assert_eq!(store.episodes().len(), 3);
}

#[tokio::test]
async fn test_ingest_endpoint_rejects_missing_fields() {
    let (status, body) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        post_json(INGEST_ROUTE, json!({ "podcastId": "pod1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Missing podcastId or creatorId"));
}

#[tokio::test]
async fn test_ingest_endpoint_upstream_failure_is_bad_gateway() {
    let (store, creator_id) = MockDataStore::with_creator("unknown-pod");

    let (status, body) = send(
        app(store, MockSummarizer::structured()),
        post_json(
            INGEST_ROUTE,
            json!({ "podcastId": "unknown-pod", "creatorId": creator_id }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].is_string());
    assert!(body.get("debug").is_none());
}

#[tokio::test]
async fn test_process_endpoint_success() {
    let (store, creator_id) = MockDataStore::with_creator("pod1");
    let episode_id = store.seed_episode(creator_id, "ep4", "第204期");

    let (status, body) = send(
        app(store, MockSummarizer::structured()),
        post_json(PROCESS_ROUTE, json!({ "episodeId": episode_id })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "success": true, "episodeId": episode_id }));
}

#[tokio::test]
async fn test_process_endpoint_failure_carries_debug_info() {
    let (store, creator_id) = MockDataStore::with_creator("pod1");
    let episode_id = store.seed_episode(creator_id, "ep4", "第204期");

    let (status, body) = send(
        app(store, MockSummarizer::failing(401, "invalid api key")),
        post_json(PROCESS_ROUTE, json!({ "episodeId": episode_id })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "AI API error: 401 - invalid api key");
    assert_eq!(
        body["debug"],
        json!({ "baseUrl": "https://mock.ai/v1", "model": "mock-gpt", "keyConfigured": true })
    );
}

#[tokio::test]
async fn test_process_endpoint_unknown_episode() {
    let (status, body) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        post_json(PROCESS_ROUTE, json!({ "episodeId": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("episode not found"));
}

#[tokio::test]
async fn test_process_endpoint_rejects_bad_input() {
    let debug = json!({
        "baseUrl": "https://mock.ai/v1",
        "model": "mock-gpt",
        "keyConfigured": true
    });

    for body in [json!({}), json!({ "episodeId": "" }), json!({ "episodeId": "abc" })] {
        let (status, response) = send(
            app(MockDataStore::default(), MockSummarizer::structured()),
            post_json(PROCESS_ROUTE, body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body} -> {response}");
        assert!(response["error"].is_string());
        assert_eq!(response["debug"], debug, "{body} -> {response}");
    }

    let (_, missing) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        post_json(PROCESS_ROUTE, json!({})),
    )
    .await;
    assert_eq!(missing["error"], "Invalid request: Missing episodeId");

    let not_json = Request::builder()
        .method(Method::POST)
        .uri(PROCESS_ROUTE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, response) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        not_json,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
    assert_eq!(response["debug"], debug);
}

#[tokio::test]
async fn test_process_endpoint_unknown_episode_carries_debug_info() {
    let (status, body) = send(
        app(MockDataStore::default(), MockSummarizer::structured()),
        post_json(PROCESS_ROUTE, json!({ "episodeId": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["debug"]["model"], "mock-gpt");
}
