// ABOUTME: Producers for the "authorization code received" channel
// ABOUTME: A loopback redirect listener plus parsing for manually pasted codes or redirect URLs

use async_trait::async_trait;
use std::time::Duration;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::mpsc,
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::AuthCallback,
};

pub type CallbackSender = mpsc::Sender<AuthCallback>;

/// Connections that send nothing within this window are dropped
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_REQUEST_LINE: usize = 8192;

/// Something that delivers authorization redirects into a channel
#[async_trait]
pub trait CallbackSource: Send + Sync {
    /// Start delivering into `sender`. Delivery stops when the registration is dropped.
    async fn register(&self, sender: CallbackSender) -> AuthResult<CallbackRegistration>;
}

/// Live callback listener; dropping it disposes the listener
#[derive(Debug, Default)]
pub struct CallbackRegistration {
    task: Option<JoinHandle<()>>,
}

impl CallbackRegistration {
    /// A registration with nothing behind it
    pub fn none() -> Self {
        Self { task: None }
    }

    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self { task: Some(task) }
    }
}

impl Drop for CallbackRegistration {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Disposing callback listener");
            task.abort();
        }
    }
}

/// No listener: codes arrive only through manual submission
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualCallbackSource;

#[async_trait]
impl CallbackSource for ManualCallbackSource {
    async fn register(&self, _sender: CallbackSender) -> AuthResult<CallbackRegistration> {
        debug!("Manual callback mode, no listener registered");
        Ok(CallbackRegistration::none())
    }
}

/// Listens on the redirect URI's loopback address for the provider redirect
#[derive(Debug, Clone)]
pub struct LoopbackCallbackServer {
    host: String,
    port: u16,
    path: String,
}

impl LoopbackCallbackServer {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// Derive host, port and path from a redirect URI such as `http://127.0.0.1:8888/callback`
    pub fn from_redirect_uri(redirect_uri: &str) -> AuthResult<Self> {
        let url = Url::parse(redirect_uri)
            .map_err(|e| AuthError::Configuration(format!("Invalid redirect URI: {}", e)))?;

        if url.scheme() != "http" {
            return Err(AuthError::Configuration(
                "Loopback callbacks need an http:// redirect URI".to_string(),
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| AuthError::Configuration("Redirect URI has no host".to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self::new(host, port, url.path()))
    }

    /// Get the callback URL for this server
    pub fn callback_url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }

    /// Accept connections concurrently until one of them hits the redirect path
    ///
    /// Connection tasks live in a `JoinSet`, so aborting this task drops them too.
    async fn serve(listener: TcpListener, path: String, sender: CallbackSender) {
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        debug!("Received connection from {}", peer_addr);
                        connections.spawn(Self::handle_connection(stream, path.clone()));
                    }
                    Err(e) => error!("Failed to accept callback connection: {}", e),
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    let Ok(Some(callback)) = finished else {
                        continue;
                    };
                    info!("Received authorization callback");
                    if sender.send(callback).await.is_err() {
                        warn!("Authentication attempt ended before the callback arrived");
                    }
                    return;
                }
            }
        }
    }

    /// Read one request; returns the callback when it hit the redirect path
    async fn handle_connection(mut stream: TcpStream, path: String) -> Option<AuthCallback> {
        let request_line =
            match tokio::time::timeout(REQUEST_READ_TIMEOUT, read_request_line(&mut stream)).await
            {
                Ok(Ok(line)) => line,
                Ok(Err(e)) => {
                    warn!("Failed to read callback request: {}", e);
                    return None;
                }
                Err(_) => {
                    debug!("Closing idle callback connection");
                    return None;
                }
            };

        let Some(target) = request_line.as_deref().and_then(request_target) else {
            let _ = stream.write_all(http_response(400, "Bad Request", ERROR_HTML).as_bytes()).await;
            return None;
        };

        let (request_path, query) = target.split_once('?').unwrap_or((target, ""));
        if request_path != path {
            debug!("Ignoring request for {}", request_path);
            let _ = stream.write_all(http_response(404, "Not Found", "").as_bytes()).await;
            return None;
        }

        let callback = parse_callback_query(query);
        let response = match &callback {
            Some(AuthCallback::Code { .. }) => http_response(200, "OK", SUCCESS_HTML),
            _ => http_response(400, "Bad Request", ERROR_HTML),
        };
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            error!("Failed to send callback response: {}", e);
        }

        // A redirect without code or error still ends the attempt
        Some(callback.unwrap_or_else(|| AuthCallback::Error {
            error: "missing_code".to_string(),
            state: None,
        }))
    }
}

/// Read until the end of the request line, across as many segments as it takes.
/// Returns `None` when the peer closes first or the line is oversized.
async fn read_request_line<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buffer.windows(2).position(|window| window == b"\r\n") {
            return Ok(Some(String::from_utf8_lossy(&buffer[..end]).into_owned()));
        }
        if buffer.len() > MAX_REQUEST_LINE {
            return Ok(None);
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

#[async_trait]
impl CallbackSource for LoopbackCallbackServer {
    async fn register(&self, sender: CallbackSender) -> AuthResult<CallbackRegistration> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::Callback(format!("Failed to bind to {}: {}", addr, e)))?;

        info!("Waiting for OAuth callback on {}", self.callback_url());

        let task = tokio::spawn(Self::serve(listener, self.path.clone(), sender));
        Ok(CallbackRegistration::from_task(task))
    }
}

/// Parse `code`, `state` and `error` out of a redirect query string
pub fn parse_callback_query(query: &str) -> Option<AuthCallback> {
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (error, code) {
        (Some(error), _) => Some(AuthCallback::Error { error, state }),
        (None, Some(code)) if !code.is_empty() => Some(AuthCallback::Code { code, state }),
        _ => None,
    }
}

/// Interpret what a user pasted: a full redirect URL, a query string, or a bare code
pub fn parse_manual_input(input: &str) -> AuthResult<AuthCallback> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::Callback("No authorization code provided".to_string()));
    }

    if input.contains("://") {
        let url = Url::parse(input)
            .map_err(|e| AuthError::Callback(format!("Invalid redirect URL: {}", e)))?;
        return url
            .query()
            .and_then(parse_callback_query)
            .ok_or_else(|| {
                AuthError::Callback("No authorization code found in redirect URL".to_string())
            });
    }

    if input.starts_with('?') || input.contains("code=") || input.contains("error=") {
        return parse_callback_query(input).ok_or_else(|| {
            AuthError::Callback("No authorization code found in input".to_string())
        });
    }

    Ok(AuthCallback::Code {
        code: input.to_string(),
        state: None,
    })
}

/// Request target from the request line, e.g. `/callback?code=..`
fn request_target(request: &str) -> Option<&str> {
    let mut parts = request.lines().next()?.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target),
        _ => None,
    }
}

fn http_response(status: u16, reason: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    )
}

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Cadenza - Signed in</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #1db954; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>Signed in to Spotify</h1>
    <p>You can now close this tab and return to your editor.</p>
</body>
</html>"#;

const ERROR_HTML: &str = r#"<html><body><h1>Authentication Failed</h1><p>Spotify did not return an authorization code. You can close this tab and try again.</p></body></html>"#;
