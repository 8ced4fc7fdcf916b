//! `HttpRenderClient` against a local axum fixture of the render service API.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

use cloudburst_core::config::ServiceConfig;
use cloudburst_core::error::RenderError;
use cloudburst_core::models::Scenario;
use cloudburst_core::render::{HttpRenderClient, RenderRequest, RenderService, ServiceEndpoint};

#[derive(Debug, Default)]
struct Fixture {
    health_status: String,
    auth_headers: Vec<Option<String>>,
    bodies: Vec<Value>,
}

type Shared = Arc<Mutex<Fixture>>;

async fn health(State(fixture): State<Shared>) -> Json<Value> {
    let status = fixture.lock().unwrap().health_status.clone();
    Json(json!({ "status": status }))
}

async fn render(State(fixture): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let auth = headers
        .get("X-Authentication-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let filename = body["output_filename"].as_str().unwrap_or_default().to_string();
    {
        let mut fixture = fixture.lock().unwrap();
        fixture.auth_headers.push(auth);
        fixture.bodies.push(body);
    }
    if filename.starts_with("broken") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "render pipeline crashed").into_response();
    }
    Json(json!({
        "file_id": "abc123",
        "size": 14,
        "scenario": "full_featured"
    }))
    .into_response()
}

async fn download(Path(id): Path<String>) -> Response {
    if id == "abc123" {
        (StatusCode::OK, b"fake-mp4-bytes".to_vec()).into_response()
    } else {
        (StatusCode::NOT_FOUND, "no such file").into_response()
    }
}

async fn serve(health_status: &str) -> (ServiceEndpoint, Shared) {
    let fixture = Arc::new(Mutex::new(Fixture {
        health_status: health_status.to_string(),
        ..Default::default()
    }));
    let app = Router::new()
        .route("/health", get(health))
        .route("/create_video_onestep", post(render))
        .route("/download/:id", get(download))
        .with_state(Arc::clone(&fixture));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (
        ServiceEndpoint::from_base_url(format!("http://{address}/")),
        fixture,
    )
}

fn request(output_filename: &str) -> RenderRequest {
    RenderRequest {
        input_image: "aW1hZ2U=".to_string(),
        input_audio: "YXVkaW8=".to_string(),
        language: "english".to_string(),
        background_box: true,
        background_opacity: 0.2,
        output_filename: output_filename.to_string(),
        is_portrait: false,
        effects: Some(vec!["zoom_in".to_string(), "zoom_out".to_string()]),
        subtitle: Some("c3J0".to_string()),
        watermark: None,
    }
}

fn client(auth_key: Option<&str>) -> HttpRenderClient {
    let config = ServiceConfig {
        auth_key: auth_key.map(str::to_string),
        ..ServiceConfig::default()
    };
    HttpRenderClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let (endpoint, _) = serve("healthy").await;
    let healthy = assert_ok!(client(None).health(&endpoint).await);
    assert!(healthy);
}

#[tokio::test]
async fn test_health_other_status_is_not_ready() {
    let (endpoint, _) = serve("starting").await;
    assert!(!client(None).health(&endpoint).await.unwrap());
}

#[tokio::test]
async fn test_health_unreachable_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = ServiceEndpoint::from_base_url(format!("http://{address}"));
    let err = client(None).health(&endpoint).await.unwrap_err();
    assert!(matches!(err, RenderError::Transport(_)));
}

#[tokio::test]
async fn test_render_sends_body_and_auth_header() {
    let (endpoint, fixture) = serve("healthy").await;

    let response = client(Some("s3cret"))
        .render(&endpoint, &request("scene_001_120000.mp4"))
        .await
        .unwrap();

    assert_eq!(response.file_id, "abc123");
    assert_eq!(response.size, 14);
    assert_eq!(response.scenario, Scenario::FullFeatured);

    let fixture = fixture.lock().unwrap();
    assert_eq!(fixture.auth_headers, vec![Some("s3cret".to_string())]);
    let body = &fixture.bodies[0];
    assert_eq!(body["language"], "english");
    assert_eq!(body["effects"], json!(["zoom_in", "zoom_out"]));
    assert_eq!(body["subtitle"], "c3J0");
    assert!(body.get("watermark").is_none());
}

#[tokio::test]
async fn test_render_without_auth_key_omits_header() {
    let (endpoint, fixture) = serve("healthy").await;

    client(None)
        .render(&endpoint, &request("scene_002_120000.mp4"))
        .await
        .unwrap();

    assert_eq!(fixture.lock().unwrap().auth_headers, vec![None]);
}

#[tokio::test]
async fn test_render_server_error_carries_status_and_body() {
    let (endpoint, _) = serve("healthy").await;

    let err = client(None)
        .render(&endpoint, &request("broken_120000.mp4"))
        .await
        .unwrap_err();

    match err {
        RenderError::Http { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "render pipeline crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_download_fetches_artifact_bytes() {
    let (endpoint, _) = serve("healthy").await;
    let http = client(Some("s3cret"));

    let bytes = http
        .download(&endpoint.download_locator("abc123"))
        .await
        .unwrap();
    assert_eq!(bytes, b"fake-mp4-bytes");

    let err = assert_err!(http.download(&endpoint.download_locator("missing")).await);
    assert!(matches!(err, RenderError::Http { status: 404, .. }));
}
