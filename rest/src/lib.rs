//! Table reads against the hosted database's REST API.
//!
//! Every read resolves the way the executor expects an operation to:
//!
//! - 2xx: `QueryResponse { data: Some(rows), error: None }`
//! - non-2xx: `QueryResponse { data: None, error: Some(QueryError) }`, parsed
//!   from the JSON error body when possible
//! - transport or decode failure: `Err(_)`
//!
//! # Headers
//!
//! - `apikey` and `Authorization: Bearer <key>` on every request
//! - `Prefer: count=exact` when a total count is requested; the total comes
//!   back in `Content-Range`

mod select;

pub use select::{Order, Select, parse_content_range_total};

use std::fmt;
use std::time::Duration;

use anyhow::Context;
use reqwest::{StatusCode, Url, header::CONTENT_RANGE};
use serde_json::Value;

use umroh_query::Operation;
use umroh_types::{QueryError, QueryResponse};

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Rows returned by one read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub rows: Vec<Value>,
    /// Total matching rows, when [`Select::count_exact`] was requested.
    pub total: Option<u64>,
}

impl Rows {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Client for one database project. Cheap to clone.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

// Manual Debug impl to keep the key out of logs.
impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            base_client_builder().build()?,
            base_url,
            anon_key,
        ))
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            anon_key: anon_key.into(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn table_url(&self, query: &Select) -> anyhow::Result<Url> {
        let raw = format!("{}/rest/v1/{}", self.base_url, query.table_name());
        let mut url = Url::parse(&raw).with_context(|| format!("invalid table url {raw}"))?;
        url.query_pairs_mut().extend_pairs(query.query_pairs());
        Ok(url)
    }

    /// Run one read. See the crate docs for how outcomes map.
    pub async fn select(&self, query: &Select) -> anyhow::Result<QueryResponse<Rows>> {
        let url = self.table_url(query)?;
        let mut request = self
            .http
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json");
        if query.wants_count() {
            request = request.header("Prefer", "count=exact");
        }

        tracing::debug!(table = query.table_name(), "Selecting rows");
        let response = request
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("request to {} failed: {e}", query.table_name()))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            let error = parse_error_body(status, &body);
            tracing::debug!(
                table = query.table_name(),
                status = %status,
                error = %error,
                "Select returned an error"
            );
            return Ok(QueryResponse::err(error));
        }

        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        let rows: Vec<Value> = response
            .json()
            .await
            .with_context(|| format!("failed to decode rows from {}", query.table_name()))?;

        Ok(QueryResponse::ok(Rows { rows, total }))
    }

    /// Wrap a read as an executor operation. Each invocation re-sends it.
    #[must_use]
    pub fn operation(&self, query: Select) -> Operation<Rows> {
        let client = self.clone();
        Operation::new(move || {
            let client = client.clone();
            let query = query.clone();
            async move { client.select(&query).await }
        })
    }
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            break;
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Build the failure indicator for a non-2xx response.
fn parse_error_body(status: StatusCode, body: &str) -> QueryError {
    if let Ok(error) = serde_json::from_str::<QueryError>(body)
        && error.message().is_some()
    {
        return error;
    }

    let trimmed = body.trim();
    let message = if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {trimmed}")
    };
    QueryError::new(message).with_code(status.as_u16().to_string())
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn select_returns_rows_and_total() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/bookings"))
            .and(query_param("select", "id,status"))
            .and(query_param("status", "eq.pending"))
            .and(query_param("offset", "10"))
            .and(query_param("limit", "10"))
            .and(header("apikey", "anon-key"))
            .and(header("Authorization", "Bearer anon-key"))
            .and(header("Prefer", "count=exact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Range", "10-11/12")
                    .set_body_json(json!([
                        {"id": 11, "status": "pending"},
                        {"id": 12, "status": "pending"}
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "anon-key").unwrap();
        let query = Select::table("bookings")
            .columns("id,status")
            .eq("status", "pending")
            .page(2, 10)
            .count_exact();

        let rows = client
            .select(&query)
            .await
            .unwrap()
            .into_result()
            .unwrap()
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.total, Some(12));
        assert_eq!(rows.rows[0]["id"], 11);
    }

    #[tokio::test]
    async fn error_status_becomes_failure_indicator() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/payments"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Invalid API key",
                "hint": "Double check your anon key"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "wrong").unwrap();
        let response = client.select(&Select::table("payments")).await.unwrap();

        assert!(response.data.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.message(), Some("Invalid API key"));
        assert_eq!(error.hint.as_deref(), Some("Double check your anon key"));
    }

    #[tokio::test]
    async fn undecodable_body_is_raised() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/packages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "anon").unwrap();
        let err = client.select(&Select::table("packages")).await.unwrap_err();
        assert!(err.to_string().contains("failed to decode rows from packages"));
    }

    #[tokio::test]
    async fn connection_failure_is_raised() {
        // Bind then release a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RestClient::new(format!("http://{addr}"), "anon").unwrap();
        let err = client.select(&Select::table("packages")).await.unwrap_err();
        assert!(err.to_string().starts_with("request to packages failed"));
    }

    #[tokio::test]
    async fn operation_resends_on_every_invocation() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/blog_posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let client = RestClient::new(server.uri(), "anon").unwrap();
        let op = client.operation(Select::table("blog_posts"));
        let first = op.clone();

        for handle in [first, op] {
            let exec = umroh_query::QueryExecutor::new(umroh_query::QueryOptions::default());
            let rows = exec.execute_operation(handle).await.unwrap();
            assert!(rows.is_empty());
            assert_eq!(rows.total, None);
        }
    }
}
