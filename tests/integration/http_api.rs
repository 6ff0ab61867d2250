//! Integration test: the HTTP API over a simulated cluster.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use reef_integration_tests::{IntegrationCluster, test_data};
use reef_types::ShardManifest;
use tower::ServiceExt;

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

fn put_request(key: &str, bearer: &str, data: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(format!("/objects/{key}"))
        .header("authorization", format!("Bearer {bearer}"))
        .body(Body::from(data))
        .unwrap()
}

fn decode_request(bearer: &str, manifest: &ShardManifest) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/objects/decode")
        .header("authorization", format!("Bearer {bearer}"))
        .header("content-type", "application/json")
        .body(Body::from(manifest.to_json().unwrap()))
        .unwrap()
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_put_lose_decode_over_http() {
    let c = IntegrationCluster::new(6, 4, 2);
    let (app, bearer) = c.api();
    let data = test_data(20_000);

    let (status, body) = send(&app, put_request("video/clip.mp4", &bearer, data.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let manifest = ShardManifest::from_slice(&body).unwrap();
    assert_eq!(manifest.len(), 6);

    c.kill_node(2);
    c.lose_shard(&manifest, 5).await;

    let (status, body) = send(&app, decode_request(&bearer, &manifest)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, data);

    c.kill_node(0);
    let (status, _) = send(&app, decode_request(&bearer, &manifest)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_token_signed_with_wrong_secret_rejected() {
    let c = IntegrationCluster::new(6, 4, 2);
    let (app, _) = c.api();

    let policy = reef_auth::Policy::new(u64::MAX);
    let forged =
        reef_auth::sign(reef_integration_tests::TEST_ACCESS_KEY, "wrong", &policy).unwrap();

    let (status, body) = send(&app, put_request("obj", &forged, b"x".to_vec())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "access denied");
    assert_eq!(c.shard_count(0).await, 0);
}

#[tokio::test]
#[ntest::timeout(10000)]
async fn test_health_is_open() {
    let c = IntegrationCluster::new(3, 2, 1);
    let (app, _) = c.api();
    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
