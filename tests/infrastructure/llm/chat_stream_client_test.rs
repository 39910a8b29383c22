use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::response::IntoResponse;
use axum::routing::post;
use futures::StreamExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use susurro::application::ports::{EnhanceError, EnhancementRequest, TextEnhancer};
use susurro::infrastructure::llm::{AuthStyle, ChatStreamClient};

async fn start_mock_chat_server(
    response_status: u16,
    response_body: &'static str,
) -> (String, oneshot::Sender<()>) {
    let app = Router::new().route(
        "/chat/completions",
        post(move || async move {
            let status = axum::http::StatusCode::from_u16(response_status).unwrap();
            (status, response_body).into_response()
        }),
    );
    start_server(app).await
}

async fn start_server(app: Router) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}

fn client(base_url: &str, auth: AuthStyle, api_key: Option<&str>) -> ChatStreamClient {
    ChatStreamClient::new(
        reqwest::Client::new(),
        base_url.to_string(),
        api_key.map(|k| k.to_string()),
        Some("test-model".to_string()),
        auth,
        Duration::from_secs(5),
    )
}

fn request() -> EnhancementRequest {
    EnhancementRequest {
        text: "raw transcript".to_string(),
        instruction: "clean this up".to_string(),
    }
}

async fn collect_deltas(client: ChatStreamClient) -> Vec<Result<String, EnhanceError>> {
    let stream = client.enhance(&request()).await.unwrap();
    stream.collect().await
}

#[tokio::test]
async fn given_full_stream_when_enhancing_then_deltas_arrive_in_order() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let (base_url, shutdown_tx) = start_mock_chat_server(200, body).await;

    let deltas = collect_deltas(client(&base_url, AuthStyle::Bearer, Some("test-key"))).await;

    let texts: Vec<&str> = deltas.iter().map(|d| d.as_deref().unwrap()).collect();
    assert_eq!(texts, vec!["Hello", " world"]);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_frame_split_across_chunks_when_enhancing_then_reassembled() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            let frames: Vec<Result<&'static str, std::io::Error>> = vec![
                Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Hel"),
                Ok("lo\"}}]}\n\ndata: [DONE]\n\n"),
            ];
            Body::from_stream(futures::stream::iter(frames))
        }),
    );
    let (base_url, shutdown_tx) = start_server(app).await;

    let deltas = collect_deltas(client(&base_url, AuthStyle::Bearer, Some("test-key"))).await;

    let texts: Vec<&str> = deltas.iter().map(|d| d.as_deref().unwrap()).collect();
    assert_eq!(texts, vec!["Hello"]);
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_transport_failure_mid_stream_when_enhancing_then_interrupted() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async {
            let frames: Vec<Result<&'static str, std::io::Error>> = vec![
                Ok("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n"),
                Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "pipe closed",
                )),
            ];
            // Delay between frames so hyper flushes the first chunk before the
            // stream errors; otherwise both are polled into the write buffer and
            // the connection aborts with nothing sent.
            Body::from_stream(futures::stream::iter(frames).then(|frame| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                frame
            }))
        }),
    );
    let (base_url, shutdown_tx) = start_server(app).await;

    let deltas = collect_deltas(client(&base_url, AuthStyle::Bearer, Some("test-key"))).await;

    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0].as_deref().unwrap(), "Hi");
    assert!(matches!(deltas[1], Err(EnhanceError::Interrupted(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_malformed_frame_when_enhancing_then_stream_yields_malformed() {
    let body = "data: {not json}\n\n";
    let (base_url, shutdown_tx) = start_mock_chat_server(200, body).await;

    let deltas = collect_deltas(client(&base_url, AuthStyle::Bearer, Some("test-key"))).await;

    assert_eq!(deltas.len(), 1);
    assert!(matches!(deltas[0], Err(EnhanceError::Malformed(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_unauthorized_status_when_enhancing_then_auth_rejected() {
    let (base_url, shutdown_tx) = start_mock_chat_server(401, "bad key").await;

    let result = client(&base_url, AuthStyle::Bearer, Some("bad-key"))
        .enhance(&request())
        .await;

    assert!(matches!(result, Err(EnhanceError::AuthRejected(_))));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_rate_limit_when_enhancing_then_transient_unavailable() {
    let (base_url, shutdown_tx) = start_mock_chat_server(429, "slow down").await;

    let result = client(&base_url, AuthStyle::Bearer, Some("test-key"))
        .enhance(&request())
        .await;

    assert!(matches!(
        result,
        Err(EnhanceError::Unavailable { transient: true, .. })
    ));
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_missing_api_key_with_bearer_auth_then_rejected_without_request() {
    let result = client("http://127.0.0.1:9", AuthStyle::Bearer, None)
        .enhance(&request())
        .await;

    assert!(matches!(result, Err(EnhanceError::AuthRejected(_))));
}

#[tokio::test]
async fn given_no_auth_style_when_key_absent_then_stream_still_opens() {
    let (base_url, shutdown_tx) = start_mock_chat_server(200, "data: [DONE]\n\n").await;

    let deltas = collect_deltas(client(&base_url, AuthStyle::None, None)).await;

    assert!(deltas.is_empty());
    shutdown_tx.send(()).ok();
}

#[tokio::test]
async fn given_empty_endpoint_when_enhancing_then_unavailable() {
    let result = client("", AuthStyle::Bearer, Some("test-key"))
        .enhance(&request())
        .await;

    assert!(matches!(result, Err(EnhanceError::Unavailable { .. })));
}
