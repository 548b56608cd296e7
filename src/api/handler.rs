//! API request routing
//!
//! Routes parsed HTTP requests to the compose core and renders JSON
//! responses. Callers get either a success payload or a single
//! `{"error": "..."}` body.

use crate::auth::{bearer_token, Authenticator};
use crate::catalog::{Catalog, DEFAULT_TTL};
use crate::compose::{ComposeCommand, Executor, Scanner, StatusCollector};
use crate::config::Config;
use crate::error::DeckError;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A parsed HTTP request, as much of it as the routes need
#[derive(Debug, Default)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// An HTTP response ready for framing
#[derive(Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    command: String,
}

/// API handler wiring the compose core together
pub struct ApiHandler {
    scanner: Scanner,
    catalog: Catalog,
    executor: Executor,
    status: StatusCollector,
    auth: Authenticator,
}

impl ApiHandler {
    pub fn new(config: &Config, auth: Authenticator) -> Self {
        let scanner = Scanner::new(config.scan_directories.clone())
            .with_excludes(config.scan_excludes.clone())
            .with_max_depth(config.scan_max_depth);
        let executor = Executor::new(config.compose_legacy, config.use_sudo);

        Self {
            scanner,
            catalog: Catalog::new(),
            executor: executor.clone(),
            status: StatusCollector::new(executor),
            auth,
        }
    }

    /// Route one request
    pub async fn handle(&self, request: &ApiRequest) -> ApiResponse {
        debug!(
            "API request: {} {} body={}",
            request.method,
            request.path,
            request.body.len()
        );

        let parts: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();

        match (request.method.as_str(), parts.as_slice()) {
            ("GET", ["api", "health"]) => self.health(),
            ("POST", ["api", "auth", "login"]) => self.login(&request.body),
            ("GET", ["api", "auth", "verify"]) => self.verify(request),

            ("GET", ["api", "compose", "files"]) => match self.authorize(request) {
                Ok(()) => self.list_files(&request.query).await,
                Err(response) => response,
            },
            ("GET", ["api", "compose", "files", id, "details"]) => {
                match self.authorize(request) {
                    Ok(()) => self.file_details(id).await,
                    Err(response) => response,
                }
            }
            ("GET", ["api", "compose", "files", id, "status"]) => {
                match self.authorize(request) {
                    Ok(()) => self.file_status(id).await,
                    Err(response) => response,
                }
            }
            ("POST", ["api", "compose", "files", id, "command"]) => {
                match self.authorize(request) {
                    Ok(()) => self.run_command(id, &request.body).await,
                    Err(response) => response,
                }
            }

            _ => ApiResponse::error(
                404,
                format!("Unknown endpoint: {} {}", request.method, request.path),
            ),
        }
    }

    fn authorize(&self, request: &ApiRequest) -> Result<(), ApiResponse> {
        let token = request
            .authorization
            .as_deref()
            .and_then(bearer_token)
            .ok_or_else(|| ApiResponse::error(401, "Missing bearer token"))?;

        self.auth
            .verify(token)
            .map(|_| ())
            .map_err(|e| ApiResponse::error(401, e.to_string()))
    }

    fn health(&self) -> ApiResponse {
        ApiResponse::ok(json!({
            "status": "ok",
            "hostname": gethostname::gethostname().to_string_lossy(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }

    fn login(&self, body: &str) -> ApiResponse {
        let request: LoginRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(_) => return ApiResponse::error(400, "Username and password are required"),
        };

        match self.auth.login(&request.username, &request.password) {
            Ok(token) => ApiResponse::ok(json!({
                "message": "Login successful",
                "token": token,
                "user": { "username": request.username, "role": "admin" },
            })),
            Err(e) => {
                warn!("Login failed for {}: {}", request.username, e);
                ApiResponse::error(401, "Invalid credentials")
            }
        }
    }

    fn verify(&self, request: &ApiRequest) -> ApiResponse {
        let token = request.authorization.as_deref().and_then(bearer_token);
        match token.map(|t| self.auth.verify(t)) {
            Some(Ok(claims)) => ApiResponse::ok(json!({ "valid": true, "user": claims })),
            _ => ApiResponse {
                status: 401,
                body: json!({ "valid": false }),
            },
        }
    }

    async fn list_files(&self, query: &str) -> ApiResponse {
        let force_refresh = query_flag(query, "refresh");

        if !force_refresh {
            if let Some(snapshot) = self.catalog.fresh_within(DEFAULT_TTL) {
                return ApiResponse::ok(json!({
                    "files": &snapshot.files,
                    "cached": true,
                    "lastScan": snapshot.scanned_at,
                }));
            }
        }

        let files = self.scanner.scan();
        let snapshot = self.catalog.replace(files);

        ApiResponse::ok(json!({
            "files": &snapshot.files,
            "cached": false,
            "lastScan": snapshot.scanned_at,
        }))
    }

    async fn file_details(&self, id: &str) -> ApiResponse {
        let file = match self.lookup(id) {
            Ok(file) => file,
            Err(response) => return response,
        };

        let details = match crate::compose::ComposeParser::parse_file(&file.path) {
            Ok(details) => details,
            Err(e) => return ApiResponse::error(500, e.to_string()),
        };
        let status = self.status.collect(&file.path).await;

        ApiResponse::ok(json!({
            "file": file,
            "details": details,
            "status": status,
        }))
    }

    async fn file_status(&self, id: &str) -> ApiResponse {
        let file = match self.lookup(id) {
            Ok(file) => file,
            Err(response) => return response,
        };

        let status = self.status.collect(&file.path).await;
        ApiResponse::ok(json!({ "file": file, "status": status }))
    }

    async fn run_command(&self, id: &str, body: &str) -> ApiResponse {
        let request: CommandRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(_) => return ApiResponse::error(400, "Missing command"),
        };

        // Route-boundary validation; the executor's command enum is the
        // second, defensive layer.
        let command: ComposeCommand = match request.command.parse() {
            Ok(command) => command,
            Err(_) => {
                return ApiResponse::error(
                    400,
                    "Invalid command. Allowed: up, down, build, ps, logs",
                )
            }
        };

        let file = match self.lookup(id) {
            Ok(file) => file,
            Err(response) => return response,
        };

        match self.executor.run(&file.path, command).await {
            Ok(result) => ApiResponse::ok(json!({
                "file": file,
                "command": command,
                "result": result,
            })),
            Err(e @ DeckError::Timeout(_)) => ApiResponse::error(504, e.to_string()),
            Err(e) => ApiResponse::error(500, e.to_string()),
        }
    }

    fn lookup(&self, id: &str) -> Result<crate::compose::ComposeFileRef, ApiResponse> {
        let id: usize = id
            .parse()
            .map_err(|_| ApiResponse::error(400, "Invalid file id"))?;

        self.catalog
            .get(id)
            .ok_or_else(|| ApiResponse::error(404, "File not found"))
    }
}

/// Shared handle used by the server tasks
pub type SharedHandler = Arc<ApiHandler>;

fn query_flag(query: &str, name: &str) -> bool {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(k, v)| k == name && (v == "true" || v == "1"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn handler_with_root(root: &std::path::Path) -> ApiHandler {
        let config = Config {
            scan_directories: vec![root.to_path_buf()],
            admin_password: "admin123".to_string(),
            jwt_secret: "test-secret".to_string(),
            ..Config::default()
        };
        let auth = Authenticator::new("admin", "admin123", "test-secret").unwrap();
        ApiHandler::new(&config, auth)
    }

    fn request(method: &str, path: &str) -> ApiRequest {
        ApiRequest {
            method: method.to_string(),
            path: path.to_string(),
            ..ApiRequest::default()
        }
    }

    async fn login_token(handler: &ApiHandler) -> String {
        let mut req = request("POST", "/api/auth/login");
        req.body = r#"{"username":"admin","password":"admin123"}"#.to_string();
        let response = handler.handle(&req).await;
        assert_eq!(response.status, 200);
        response.body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());

        let response = handler.handle(&request("GET", "/api/health")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["status"], "ok");
    }

    #[tokio::test]
    async fn test_files_require_auth() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());

        let response = handler.handle(&request("GET", "/api/compose/files")).await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_login_and_list_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::write(
            temp.path().join("app/docker-compose.yml"),
            "services:\n  web:\n    image: nginx\n",
        )
        .unwrap();

        let handler = handler_with_root(temp.path());
        let token = login_token(&handler).await;

        let mut req = request("GET", "/api/compose/files");
        req.authorization = Some(format!("Bearer {}", token));
        let response = handler.handle(&req).await;

        assert_eq!(response.status, 200);
        assert_eq!(response.body["cached"], false);
        assert_eq!(response.body["files"].as_array().unwrap().len(), 1);

        // Second read inside the TTL serves the cache
        let response = handler.handle(&req).await;
        assert_eq!(response.body["cached"], true);
    }

    #[tokio::test]
    async fn test_bad_login_is_rejected() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());

        let mut req = request("POST", "/api/auth/login");
        req.body = r#"{"username":"admin","password":"wrong"}"#.to_string();
        let response = handler.handle(&req).await;
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_invalid_command_fails_before_spawning() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());
        let token = login_token(&handler).await;

        let mut req = request("POST", "/api/compose/files/0/command");
        req.authorization = Some(format!("Bearer {}", token));
        req.body = r#"{"command":"restart"}"#.to_string();
        let response = handler.handle(&req).await;

        assert_eq!(response.status, 400);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .contains("Invalid command"));
    }

    #[tokio::test]
    async fn test_unknown_file_id_is_404() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());
        let token = login_token(&handler).await;

        let mut req = request("GET", "/api/compose/files/7/status");
        req.authorization = Some(format!("Bearer {}", token));
        let response = handler.handle(&req).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_unknown_endpoint_is_404() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());

        let response = handler.handle(&request("GET", "/api/nope")).await;
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_verify_reports_token_validity() {
        let temp = TempDir::new().unwrap();
        let handler = handler_with_root(temp.path());
        let token = login_token(&handler).await;

        let mut req = request("GET", "/api/auth/verify");
        req.authorization = Some(format!("Bearer {}", token));
        let response = handler.handle(&req).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["valid"], true);

        let response = handler.handle(&request("GET", "/api/auth/verify")).await;
        assert_eq!(response.status, 401);
        assert_eq!(response.body["valid"], false);
    }
}
