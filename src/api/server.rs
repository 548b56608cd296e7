//! HTTP server for the composedeck API
//!
//! Minimal HTTP/1.1 framing over a TCP listener, one task per
//! connection. Requests are parsed just far enough for the routes:
//! request line, Content-Length, Authorization, then the body.

use super::handler::{ApiHandler, ApiRequest, SharedHandler};
use crate::error::{DeckError, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

/// Request bodies above this size are rejected outright
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// API server
pub struct Server {
    handler: SharedHandler,
    port: u16,
}

impl Server {
    pub fn new(handler: ApiHandler, port: u16) -> Self {
        Self {
            handler: Arc::new(handler),
            port,
        }
    }

    /// Bind and serve until the process is stopped
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.port)).await?;
        info!("composedeck API listening on port {}", self.port);

        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    continue;
                }
            };

            debug!("Connection from {}", peer);
            let handler = self.handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, handler).await {
                    debug!("Connection error: {}", e);
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, handler: SharedHandler) -> Result<()> {
    let request = match read_request(&mut stream).await {
        Ok(request) => request,
        Err(e) => {
            let body = serde_json::json!({ "error": e.to_string() });
            write_response(&mut stream, 400, &body.to_string()).await?;
            return Ok(());
        }
    };

    // Preflight: answer permissively, the single-admin token is the
    // actual access control.
    if request.method == "OPTIONS" {
        write_response(&mut stream, 204, "").await?;
        return Ok(());
    }

    let response = handler.handle(&request).await;
    write_response(&mut stream, response.status, &response.body.to_string()).await
}

/// Parse one HTTP/1.1 request off the stream
async fn read_request(stream: &mut TcpStream) -> Result<ApiRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| DeckError::Api("Bad request line".to_string()))?
        .to_string();
    let target = parts
        .next()
        .ok_or_else(|| DeckError::Api("Bad request line".to_string()))?;

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), query.to_string()),
        None => (target.to_string(), String::new()),
    };

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut header_line = String::new();
        let read = reader.read_line(&mut header_line).await?;
        if read == 0 || header_line.trim().is_empty() {
            break;
        }
        if let Some((name, value)) = header_line.split_once(':') {
            let value = value.trim();
            match name.to_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(DeckError::Api("Request body too large".to_string()));
    }

    let body = if content_length > 0 {
        let mut buf = vec![0u8; content_length];
        reader.read_exact(&mut buf).await?;
        String::from_utf8_lossy(&buf).to_string()
    } else {
        String::new()
    };

    Ok(ApiRequest {
        method,
        path,
        query,
        authorization,
        body,
    })
}

async fn write_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Authorization, Content-Type\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        status,
        status_text(status),
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
