use axum::extract::Multipart;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use seasonfit::client::{ClientError, RelayClient};
use seasonfit::config::RelayConfig;
use seasonfit::palette;
use seasonfit::relay::{self, RelayState, REMOVAL_FAILED};
use seasonfit::removal::{BackgroundRemover, RemovalError, RemoveBgClient, Upload};
use seasonfit::session::{Outcome, Phase, Session};

const API_KEY: &str = "test-key";

/// Stand-in for remove.bg: checks the key and echoes the image back behind a marker.
async fn fake_removebg(headers: HeaderMap, mut multipart: Multipart) -> Response {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some(API_KEY) {
        let body = serde_json::json!({ "errors": [{ "title": "Forbidden" }] });
        return (StatusCode::FORBIDDEN, Json(body)).into_response();
    }

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image_file") {
            let data = field.bytes().await.unwrap_or_default();
            let mut out = b"PNG:".to_vec();
            out.extend_from_slice(&data);
            return out.into_response();
        }
    }

    let body = serde_json::json!({ "message": "No image given" });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_upstream() -> String {
    let base = spawn(Router::new().route("/v1.0/removebg", post(fake_removebg))).await;
    format!("{base}/v1.0/removebg")
}

async fn spawn_relay(api_key: Option<&str>, upstream: &str) -> String {
    let config = RelayConfig {
        upstream_url: upstream.to_string(),
        ..RelayConfig::default()
    }
    .with_api_key(api_key.map(str::to_string));
    let app = relay::router(RelayState::from_config(&config), config.body_limit);
    spawn(app).await
}

fn photo() -> Upload {
    Upload::new(Bytes::from_static(b"raw photo"))
        .with_file_name("me.jpg")
        .with_content_type("image/jpeg")
}

#[tokio::test]
async fn removebg_client_forwards_image_and_key() {
    let upstream = spawn_upstream().await;
    let client = RemoveBgClient::with_endpoint(API_KEY, upstream);

    let image = client.remove(photo()).await.unwrap();
    assert_eq!(&image[..], b"PNG:raw photo");
}

#[tokio::test]
async fn removebg_client_reports_upstream_error() {
    let upstream = spawn_upstream().await;
    let client = RemoveBgClient::with_endpoint("wrong-key", upstream);

    match client.remove(photo()).await {
        Err(RemovalError::Upstream { status, message }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Forbidden");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn removebg_client_reports_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RemoveBgClient::with_endpoint(API_KEY, format!("http://{addr}/v1.0/removebg"));
    assert!(matches!(
        client.remove(photo()).await,
        Err(RemovalError::Transport(_))
    ));
}

#[tokio::test]
async fn session_round_trip_through_relay() {
    let upstream = spawn_upstream().await;
    let relay_url = spawn_relay(Some(API_KEY), &upstream).await;
    let client = RelayClient::new(relay_url);

    let mut session = Session::new();
    session.select_image(photo());
    let (ticket, upload) = session.begin_removal().unwrap();
    let result = client
        .remove_background(&upload)
        .await
        .map_err(|e| e.user_message());
    assert_eq!(session.complete_removal(ticket, result), Outcome::Applied);

    assert!(matches!(session.phase(), Phase::Ready { .. }));
    assert_eq!(session.processed().map(|b| &b[..]), Some(&b"PNG:raw photo"[..]));

    session
        .confirm_swatch(&palette::find("Lavender").unwrap())
        .unwrap();
    session
        .confirm_swatch(&palette::find("Dusty Blue").unwrap())
        .unwrap();
    session
        .confirm_swatch(&palette::find("Coral").unwrap())
        .unwrap();
    assert_eq!(
        session.analysis().as_deref(),
        Some("당신의 퍼스널 컬러는 여름 쿨톤입니다.")
    );
}

#[tokio::test]
async fn relay_hides_upstream_rejection() {
    let upstream = spawn_upstream().await;
    let relay_url = spawn_relay(Some("wrong-key"), &upstream).await;
    let client = RelayClient::new(relay_url);

    let err = client.remove_background(&photo()).await.unwrap_err();
    assert!(matches!(err, ClientError::Failed));
    assert_eq!(err.user_message(), REMOVAL_FAILED);
}

#[tokio::test]
async fn failed_removal_surfaces_error_in_session() {
    let upstream = spawn_upstream().await;
    let relay_url = spawn_relay(None, &upstream).await;
    let client = RelayClient::new(relay_url);

    let mut session = Session::new();
    session.select_image(photo());
    let (ticket, upload) = session.begin_removal().unwrap();
    let result = client
        .remove_background(&upload)
        .await
        .map_err(|e| e.user_message());
    session.complete_removal(ticket, result);

    assert!(matches!(session.phase(), Phase::ImageSelected { .. }));
    assert_eq!(session.error(), Some(REMOVAL_FAILED));
}
