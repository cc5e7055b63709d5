//! Config-driven executor settings

use std::io::Write;
use std::time::Duration;

use crate::common::{client, executor, mount_errors};
use umroh_config::UmrohConfig;
use umroh_rest::Select;

#[tokio::test]
async fn config_file_bounds_attempts() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[query]\nmax_retries = 1\nretry_delay_ms = 2\nerror_message = \"Gagal memuat jadwal\""
    )
    .unwrap();

    let config = UmrohConfig::load_from(file.path()).unwrap();
    let options = config.query_options();
    assert_eq!(options.retry_delay, Duration::from_millis(2));

    let server = wiremock::MockServer::start().await;
    // `expect(2)` is verified when the server drops.
    mount_errors(&server, "itineraries", 503, "maintenance", 2).await;

    let (exec, toasts) = executor(options);
    exec.execute_operation(client(&server).operation(Select::table("itineraries")))
        .await;

    assert_eq!(exec.error().as_deref(), Some("maintenance"));
    let toasts = toasts.take();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Gagal memuat jadwal");
}

#[test]
fn database_section_resolves_endpoint() {
    let config = UmrohConfig::from_toml_str(
        "[database]\nurl = \"https://umroh.example.co/\"\nanon_key = \"public-anon\"\n",
    )
    .unwrap();

    let db = config.database().unwrap();
    assert_eq!(db.url, "https://umroh.example.co");
    assert_eq!(db.anon_key, "public-anon");
}
