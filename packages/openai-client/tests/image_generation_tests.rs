//! Image generation against a local listener serving canned responses.

use axum::{http::StatusCode, routing::post, Json, Router};
use openai_client::{ImageRequest, OpenAIClient, OpenAIError, DALL_E_3};
use serde_json::{json, Value};

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: String) -> OpenAIClient {
    OpenAIClient::new("sk-test").with_base_url(base_url)
}

#[tokio::test]
async fn returns_first_image_payload() {
    let router = Router::new().route(
        "/images/generations",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "dall-e-3");
            assert_eq!(body["prompt"], "A red balloon");
            assert_eq!(body["n"], 1);
            assert_eq!(body["response_format"], "b64_json");
            assert_eq!(body["size"], "1024x1024");
            Json(json!({
                "created": 1,
                "data": [{"b64_json": "iVBORw0KGgo=", "revised_prompt": "A bright red balloon"}]
            }))
        }),
    );
    let base = serve(router).await;

    let image = client(base)
        .generate_image(ImageRequest::new(DALL_E_3, "A red balloon"))
        .await
        .unwrap();

    assert_eq!(image.b64_json, "iVBORw0KGgo=");
    assert_eq!(image.revised_prompt.as_deref(), Some("A bright red balloon"));
}

#[tokio::test]
async fn rate_limit_surfaces_upstream_message() {
    let router = Router::new().route(
        "/images/generations",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({"error": {"message": "Rate limit exceeded", "type": "requests"}})),
            )
        }),
    );
    let base = serve(router).await;

    let err = client(base)
        .generate_image(ImageRequest::new(DALL_E_3, "A red balloon"))
        .await
        .unwrap_err();

    match err {
        OpenAIError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_payload_is_a_parse_error() {
    let router = Router::new().route(
        "/images/generations",
        post(|| async { Json(json!({"created": 1, "data": [{"url": "https://x"}]})) }),
    );
    let base = serve(router).await;

    let err = client(base)
        .generate_image(ImageRequest::new(DALL_E_3, "A red balloon"))
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::Parse(_)));
    assert_eq!(err.reason(), "Invalid response format from image generation API");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let err = client("http://127.0.0.1:1".to_string())
        .generate_image(ImageRequest::new(DALL_E_3, "A red balloon"))
        .await
        .unwrap_err();

    assert!(matches!(err, OpenAIError::Network(_)));
}
