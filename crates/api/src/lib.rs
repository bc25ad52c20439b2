//! Queue API client.
//!
//! This crate provides a small client for the queue service's read-only
//! endpoints. It focuses on:
//!
//! - Constructing an HTTP client with sensible defaults
//! - Discovering credentials from `QUEUEDECK_JWT_TOKEN` or `QUEUEDECK_API_KEY`
//! - Validating the API base URL for safety
//! - Normalizing list responses into [`Page`]s
//!
//! The list view only depends on the [`QueueSource`] trait so it can be driven
//! by an in-memory source in tests.

mod error;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use queuedeck_types::{FilterState, Page, QueueDashboard, QueueJobDetail, QueueJobListResponse};
use reqwest::{Client, RequestBuilder, Response, Url, header};
use serde::de::DeserializeOwned;
use tracing::debug;

pub use error::ApiError;

/// Environment variable holding the API base URL.
pub const API_BASE_ENV: &str = "QUEUEDECK_API_BASE";
/// Bearer token; takes precedence over the API key.
pub const JWT_TOKEN_ENV: &str = "QUEUEDECK_JWT_TOKEN";
/// Value for the `X-API-Key` header.
pub const API_KEY_ENV: &str = "QUEUEDECK_API_KEY";
/// Used when neither configuration nor environment names a base URL.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Hostnames allowed to use plain HTTP.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "::1", "[::1]"];
/// Sample value shipped in env templates; treated as unset.
const API_KEY_PLACEHOLDER: &str = "your-api-key-here";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Read access to the job queue.
///
/// Fetches must be safe to issue repeatedly for the same arguments.
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Fetches one page of jobs matching `filter`, starting at `offset`.
    async fn list_jobs(&self, filter: &FilterState, offset: usize, limit: usize) -> Result<Page, ApiError>;

    /// Fetches aggregate counts for the dashboard header.
    async fn dashboard(&self) -> Result<QueueDashboard, ApiError>;

    /// Fetches the full record for a single job.
    async fn job_detail(&self, id: i64) -> Result<QueueJobDetail, ApiError>;
}

/// How requests authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    ApiKey(String),
    None,
}

impl Credentials {
    /// Reads `QUEUEDECK_JWT_TOKEN`, then `QUEUEDECK_API_KEY`.
    pub fn from_env() -> Self {
        Self::resolve(env::var(JWT_TOKEN_ENV).ok(), env::var(API_KEY_ENV).ok())
    }

    /// A non-blank JWT wins; a blank or placeholder API key is ignored.
    pub fn resolve(jwt: Option<String>, api_key: Option<String>) -> Self {
        if let Some(token) = jwt.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return Self::Bearer(token);
        }
        match api_key.map(|k| k.trim().to_string()) {
            Some(key) if !key.is_empty() && key != API_KEY_PLACEHOLDER => Self::ApiKey(key),
            _ => Self::None,
        }
    }

    fn apply(&self, headers: &mut header::HeaderMap) -> Result<(), ApiError> {
        match self {
            Self::Bearer(token) => {
                let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| ApiError::InvalidCredential(JWT_TOKEN_ENV))?;
                headers.insert(header::AUTHORIZATION, value);
            }
            Self::ApiKey(key) => {
                let value =
                    header::HeaderValue::from_str(key).map_err(|_| ApiError::InvalidCredential(API_KEY_ENV))?;
                headers.insert("x-api-key", value);
            }
            Self::None => {}
        }
        Ok(())
    }
}

/// Thin wrapper around a configured `reqwest::Client` for the queue API.
#[derive(Debug, Clone)]
pub struct QueueClient {
    pub base_url: String,
    pub http: Client,
    pub user_agent: String,
}

impl QueueClient {
    /// Builds a client from the environment.
    ///
    /// `base_override` (from config or the command line) wins over
    /// `QUEUEDECK_API_BASE`, which wins over [`DEFAULT_API_BASE`].
    pub fn new_from_env(base_override: Option<&str>) -> Result<Self, ApiError> {
        let base_url = base_override
            .map(str::to_string)
            .or_else(|| env::var(API_BASE_ENV).ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base_url(&base_url, Credentials::from_env())
    }

    pub fn with_base_url(base_url: &str, credentials: Credentials) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        validate_base_url(&base_url)?;

        let mut default_headers = header::HeaderMap::new();
        credentials.apply(&mut default_headers)?;
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("queuedeck/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    /// Build a GET request for an API-relative path.
    pub fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building request");

        self.http.get(url).header(header::USER_AGENT, &self.user_agent)
    }

    /// Builds the list request; `status` is omitted for "all" and
    /// `requires_manual_review` only sent when narrowing.
    pub fn jobs_request(&self, filter: &FilterState, offset: usize, limit: usize) -> RequestBuilder {
        let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(status) = filter.status.status() {
            query.push(("status", status.as_str().to_string()));
        }
        if filter.requires_manual_review {
            query.push(("requires_manual_review", "true".to_string()));
        }
        self.get("/api/queue/jobs").query(&query)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let body = read_success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl QueueSource for QueueClient {
    async fn list_jobs(&self, filter: &FilterState, offset: usize, limit: usize) -> Result<Page, ApiError> {
        let response: QueueJobListResponse = self.send_json(self.jobs_request(filter, offset, limit)).await?;
        Ok(response.into_page(offset, limit))
    }

    async fn dashboard(&self) -> Result<QueueDashboard, ApiError> {
        self.send_json(self.get("/api/queue/dashboard")).await
    }

    async fn job_detail(&self, id: i64) -> Result<QueueJobDetail, ApiError> {
        self.send_json(self.get(&format!("/api/queue/jobs/{id}"))).await
    }
}

/// Returns the body of a 2xx response or maps the failure to
/// [`ApiError::Status`].
async fn read_success_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.text().await?);
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "request failed");
    Err(ApiError::from_response_body(status.as_u16(), is_json, &body, request_id))
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost`, `127.0.0.1` or `::1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
pub fn validate_base_url(base: &str) -> Result<(), ApiError> {
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: base.to_string(),
        reason,
    };
    let parsed = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    let host_name = parsed.host_str().ok_or_else(|| invalid("missing host".into()))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(());
    }

    if parsed.scheme() != "https" {
        return Err(invalid(format!(
            "must use https for non-localhost hosts; got '{}://'",
            parsed.scheme()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuedeck_types::{JobStatus, StatusFilter};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(base: &str) -> QueueClient {
        QueueClient::with_base_url(base, Credentials::None).expect("client")
    }

    fn query_pairs(request: &reqwest::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Serves exactly one canned HTTP response and returns the raw request.
    async fn serve_once(status_line: &'static str, content_type: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buffer = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let read = socket.read(&mut buffer).await.expect("read");
                request.extend_from_slice(&buffer[..read]);
                if read == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn jwt_takes_precedence_over_api_key() {
        assert_eq!(
            Credentials::resolve(Some("jwt-1".into()), Some("key-1".into())),
            Credentials::Bearer("jwt-1".into())
        );
        assert_eq!(
            Credentials::resolve(Some("  ".into()), Some("key-1".into())),
            Credentials::ApiKey("key-1".into())
        );
        assert_eq!(
            Credentials::resolve(None, Some(API_KEY_PLACEHOLDER.into())),
            Credentials::None
        );
    }

    #[test]
    fn base_url_rules() {
        assert!(validate_base_url("http://localhost:8080").is_ok());
        assert!(validate_base_url("http://127.0.0.1:3000").is_ok());
        assert!(validate_base_url("https://queue.example.com").is_ok());
        assert!(validate_base_url("http://queue.example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn unfiltered_request_sends_only_paging() {
        let request = client("http://localhost:8080/")
            .jobs_request(&FilterState::default(), 0, 50)
            .build()
            .expect("request");
        assert_eq!(request.url().path(), "/api/queue/jobs");
        assert_eq!(
            query_pairs(&request),
            vec![("limit".into(), "50".into()), ("offset".into(), "0".into())]
        );
    }

    #[test]
    fn narrowed_request_sends_status_and_review() {
        let filter = FilterState::new(StatusFilter::Only(JobStatus::Pending), true);
        let request = client("http://localhost:8080")
            .jobs_request(&filter, 100, 50)
            .build()
            .expect("request");
        let pairs = query_pairs(&request);
        assert!(pairs.contains(&("offset".into(), "100".into())));
        assert!(pairs.contains(&("status".into(), "pending".into())));
        assert!(pairs.contains(&("requires_manual_review".into(), "true".into())));
    }

    #[tokio::test]
    async fn list_jobs_normalizes_response() {
        let (base, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"items":[{"id":1,"status":"pending"},{"id":2,"status":"completed"}],"limit":2,"offset":0,"has_more":true}"#,
        )
        .await;
        let page = client(&base)
            .list_jobs(&FilterState::default(), 0, 2)
            .await
            .expect("page");
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.items[1].status, JobStatus::Completed);

        let raw_request = server.await.expect("server");
        assert!(raw_request.starts_with("GET /api/queue/jobs?limit=2&offset=0 "));
    }

    #[tokio::test]
    async fn error_status_maps_to_status_error() {
        let (base, _server) = serve_once(
            "503 Service Unavailable",
            "application/json",
            r#"{"message":"queue unavailable","code":"QUEUE_DOWN"}"#,
        )
        .await;
        let error = client(&base).dashboard().await.expect_err("should fail");
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.to_string(), "API error 503: queue unavailable");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let (base, _server) = serve_once("200 OK", "application/json", r#"{"job": 3}"#).await;
        let error = client(&base).job_detail(3).await.expect_err("should fail");
        assert!(matches!(error, ApiError::Decode(_)));
    }
}
