//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Value, json};
use umroh_query::{QueryExecutor, QueryOptions, ToastQueue};
use umroh_rest::{RestClient, Rows};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ANON_KEY: &str = "anon-test-key";

/// Fast retry options for tests (millisecond delays).
pub fn fast_options(max_retries: u32) -> QueryOptions {
    QueryOptions::new()
        .with_max_retries(max_retries)
        .with_retry_delay(Duration::from_millis(1))
}

/// Executor whose toasts are collected in the returned queue.
pub fn executor(options: QueryOptions) -> (QueryExecutor<Rows>, ToastQueue) {
    let toasts = ToastQueue::new();
    (QueryExecutor::with_notifier(options, toasts.clone()), toasts)
}

pub fn client(server: &MockServer) -> RestClient {
    RestClient::new(server.uri(), ANON_KEY).expect("client builds")
}

pub fn table_path(table: &str) -> String {
    format!("/rest/v1/{table}")
}

pub fn bookings() -> Value {
    json!([
        {"id": 7, "status": "confirmed", "pilgrim_count": 2},
        {"id": 8, "status": "pending", "pilgrim_count": 4}
    ])
}

/// Mount a 200 response with `rows` for `table`.
pub async fn mount_rows(server: &MockServer, table: &str, rows: Value) {
    Mock::given(method("GET"))
        .and(path(table_path(table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

/// Mount an error response for `table` that answers at most `times` requests.
pub async fn mount_errors(
    server: &MockServer,
    table: &str,
    status: u16,
    message: &str,
    times: u64,
) {
    Mock::given(method("GET"))
        .and(path(table_path(table)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": message })))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}
