// ABOUTME: Integration tests for the loopback redirect listener
// ABOUTME: Real TCP round trips against the listener and a full sign-in through it

use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use cadenza_auth::{
    AuthCallback, AuthController, AuthError, AuthResult, AuthState, CallbackSource,
    LoopbackCallbackServer, MemoryStore, OAuthConfig, TokenStore, UrlOpener,
};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[derive(Default)]
struct RecordingOpener {
    urls: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingOpener {
    fn open(&self, url: &str) -> AuthResult<()> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_listener_delivers_code_and_ignores_other_paths() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, mut rx) = mpsc::channel(1);
    let _registration = server.register(tx).await.unwrap();

    let favicon = reqwest::get(format!("http://127.0.0.1:{}/favicon.ico", port))
        .await
        .unwrap();
    assert_eq!(favicon.status().as_u16(), 404);

    let response = reqwest::get(format!("{}?code=abc&state=s1", server.callback_url()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("Signed in"));

    assert_eq!(
        rx.recv().await.unwrap(),
        AuthCallback::Code {
            code: "abc".to_string(),
            state: Some("s1".to_string()),
        }
    );
}

#[tokio::test]
async fn test_idle_connection_does_not_block_redirect() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, mut rx) = mpsc::channel(1);
    let _registration = server.register(tx).await.unwrap();

    // Speculative connection that never sends a request
    let _idle = TcpStream::connect(("127.0.0.1", port)).await.unwrap();

    let response = reqwest::get(format!("{}?code=abc&state=s1", server.callback_url()))
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let callback = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("redirect delivered while another connection is idle")
        .unwrap();
    assert_eq!(
        callback,
        AuthCallback::Code {
            code: "abc".to_string(),
            state: Some("s1".to_string()),
        }
    );
}

#[tokio::test]
async fn test_request_line_split_across_segments() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, mut rx) = mpsc::channel(1);
    let _registration = server.register(tx).await.unwrap();

    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.set_nodelay(true).unwrap();
    stream.write_all(b"GET /callback?code=a").await.unwrap();
    stream.flush().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream
        .write_all(b"bc&state=s1 HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK"));

    assert_eq!(
        rx.recv().await.unwrap(),
        AuthCallback::Code {
            code: "abc".to_string(),
            state: Some("s1".to_string()),
        }
    );
}

#[tokio::test]
async fn test_listener_forwards_provider_error() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, mut rx) = mpsc::channel(1);
    let _registration = server.register(tx).await.unwrap();

    let response = reqwest::get(format!(
        "{}?error=access_denied&state=s1",
        server.callback_url()
    ))
    .await
    .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    assert_eq!(
        rx.recv().await.unwrap(),
        AuthCallback::Error {
            error: "access_denied".to_string(),
            state: Some("s1".to_string()),
        }
    );
}

#[tokio::test]
async fn test_second_listener_on_busy_port_fails() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, _rx) = mpsc::channel(1);
    let _registration = server.register(tx.clone()).await.unwrap();

    match server.register(tx).await {
        Err(AuthError::Callback(message)) => assert!(message.contains("Failed to bind")),
        other => panic!("expected bind failure, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_dropping_registration_releases_port() {
    let port = free_port();
    let server = LoopbackCallbackServer::new("127.0.0.1", port, "/callback");
    let (tx, _rx) = mpsc::channel(1);

    let registration = server.register(tx).await.unwrap();
    drop(registration);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(tokio::net::TcpListener::bind(("127.0.0.1", port)).await.is_ok());
}

#[tokio::test]
async fn test_sign_in_through_loopback_redirect() {
    let accounts = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "loopback-access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "loopback-refresh"
        })))
        .expect(1)
        .mount(&accounts)
        .await;

    let port = free_port();
    let redirect_uri = format!("http://127.0.0.1:{}/callback", port);
    let config = OAuthConfig::spotify("test-client", &redirect_uri, vec!["streaming".to_string()])
        .with_accounts_url(accounts.uri());
    let listener = LoopbackCallbackServer::from_redirect_uri(&redirect_uri).unwrap();
    let opener = Arc::new(RecordingOpener::default());

    let controller = AuthController::builder(
        config,
        TokenStore::new(Arc::new(MemoryStore::new()), "cadenza"),
    )
    .url_opener(opener.clone())
    .callback_source(Arc::new(listener))
    .build()
    .unwrap();

    let attempt = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.authenticate().await })
    };

    for _ in 0..300 {
        if controller.state().await == AuthState::AwaitingCallback {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let authorization_url = opener.urls.lock().unwrap()[0].clone();
    let state = Url::parse(&authorization_url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let response = reqwest::get(format!("{}?code=abc&state={}", redirect_uri, state))
        .await
        .unwrap();
    assert!(response.status().is_success());

    assert_eq!(attempt.await.unwrap(), Ok(()));
    assert_eq!(controller.get_access_token().await.unwrap(), "loopback-access");
}
