//! Table reads driven through the retrying executor

use crate::common::{
    bookings, client, executor, fast_options, mount_errors, mount_rows, table_path,
};
use umroh_query::{QueryPhase, ToastVariant};
use umroh_rest::Select;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn transient_errors_are_absorbed() {
    let server = wiremock::MockServer::start().await;
    mount_errors(&server, "bookings", 503, "service unavailable", 2).await;
    mount_rows(&server, "bookings", bookings()).await;

    let (exec, toasts) = executor(fast_options(2));
    let op = client(&server).operation(Select::table("bookings").order("created_at", false));

    let rows = exec.execute_operation(op).await.expect("third attempt succeeds");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows.rows[0]["status"], "confirmed");
    assert_eq!(exec.error(), None);
    assert_eq!(exec.phase(), QueryPhase::Succeeded);
    assert!(toasts.is_empty());
}

#[tokio::test]
async fn persistent_errors_surface_once() {
    let server = wiremock::MockServer::start().await;
    mount_errors(&server, "payments", 500, "permission denied for table payments", 3).await;

    let (exec, toasts) = executor(fast_options(2));
    let result = exec
        .execute_operation(client(&server).operation(Select::table("payments")))
        .await;

    assert!(result.is_none());
    assert!(!exec.is_loading());
    assert_eq!(
        exec.error().as_deref(),
        Some("permission denied for table payments")
    );

    let toasts = toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Gagal memuat data");
    assert_eq!(toasts[0].description, "permission denied for table payments");
    assert_eq!(toasts[0].variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn manual_retry_resends_the_same_select() {
    let server = wiremock::MockServer::start().await;
    mount_errors(&server, "pilgrims", 502, "bad gateway", 2).await;
    Mock::given(method("GET"))
        .and(path(table_path("pilgrims")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "0-1/2")
                .set_body_json(serde_json::json!([{"id": 1}, {"id": 2}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (exec, toasts) = executor(fast_options(1));
    let query = Select::table("pilgrims").eq("booking_id", 7).count_exact();

    assert!(exec.execute_operation(client(&server).operation(query)).await.is_none());
    assert_eq!(exec.error().as_deref(), Some("bad gateway"));
    assert_eq!(toasts.take().len(), 1);

    let rows = exec.retry().await.expect("retry succeeds");
    assert_eq!(rows.total, Some(2));
    assert_eq!(exec.error(), None);
    assert_eq!(exec.data().map(|r| r.len()), Some(2));
    assert!(toasts.is_empty());
}

#[tokio::test]
async fn unreachable_database_falls_back_to_raised_message() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = umroh_rest::RestClient::new(format!("http://{addr}"), "anon").unwrap();
    let (exec, toasts) = executor(fast_options(1).with_error_message("Gagal memuat paket"));

    let result = exec
        .execute_operation(client.operation(Select::table("packages")))
        .await;

    assert!(result.is_none());
    let error = exec.error().unwrap();
    assert!(error.starts_with("request to packages failed"), "{error}");
    let toasts = toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Gagal memuat paket");
}

#[tokio::test]
async fn optimistic_update_survives_until_next_load() {
    let server = wiremock::MockServer::start().await;
    mount_rows(&server, "blog_posts", serde_json::json!([{"id": 1, "published": false}])).await;

    let (exec, _toasts) = executor(fast_options(0));
    exec.execute_operation(client(&server).operation(Select::table("blog_posts")))
        .await
        .unwrap();

    exec.update_data(|rows| {
        if let Some(rows) = rows {
            rows.rows[0]["published"] = serde_json::Value::Bool(true);
        }
    });
    assert_eq!(exec.data().unwrap().rows[0]["published"], true);
    assert!(!exec.is_loading());

    exec.retry().await.unwrap();
    assert_eq!(exec.data().unwrap().rows[0]["published"], false);
}
