//! umroh CLI - runs back-office table reads through the resilient executor.
//!
//! ```text
//! main() -> init_tracing() -> UmrohConfig::load() -> RestClient
//!                                                      |
//!                                                      v
//!                        QueryExecutor::execute_operation(select) -> rows | toast
//! ```
//!
//! Failure toasts are printed to stderr; rows go to stdout as JSON.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::{io, process::ExitCode, time::Duration};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use umroh_config::UmrohConfig;
use umroh_query::{QueryExecutor, QueryOptions, Toast};
use umroh_rest::{RestClient, Rows, Select};

#[derive(Parser)]
#[command(name = "umroh")]
#[command(about = "Back-office data tools for the umroh travel agency")]
struct Cli {
    /// Override [query].max_retries
    #[arg(long, global = true)]
    max_retries: Option<u32>,
    /// Override [query].retry_delay_ms
    #[arg(long, global = true)]
    retry_delay_ms: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read rows from a table
    Select(SelectArgs),
}

#[derive(Args)]
struct SelectArgs {
    /// Table name, e.g. bookings
    table: String,
    /// Comma-separated column list
    #[arg(long, default_value = "*")]
    columns: String,
    /// Equality filter, repeatable
    #[arg(long = "eq", value_name = "COLUMN=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    /// Sort key as `column` or `column.desc`, repeatable
    #[arg(long, value_parser = parse_order)]
    order: Vec<(String, bool)>,
    /// One-based page number
    #[arg(long)]
    page: Option<u64>,
    #[arg(long, default_value_t = 20)]
    page_size: u64,
    /// Also report the total number of matching rows
    #[arg(long)]
    count: bool,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected COLUMN=VALUE, got `{raw}`")),
    }
}

fn parse_order(raw: &str) -> Result<(String, bool), String> {
    let (column, ascending) = match raw.rsplit_once('.') {
        Some((column, "desc")) => (column, false),
        Some((column, "asc")) => (column, true),
        _ => (raw, true),
    };
    if column.trim().is_empty() {
        return Err(format!("expected COLUMN[.asc|.desc], got `{raw}`"));
    }
    Ok((column.trim().to_string(), ascending))
}

impl SelectArgs {
    fn to_select(&self) -> Select {
        let mut select = Select::table(&self.table).columns(&self.columns);
        for (column, value) in &self.filters {
            select = select.eq(column, value);
        }
        for (column, ascending) in &self.order {
            select = select.order(column, *ascending);
        }
        if let Some(page) = self.page {
            select = select.page(page, self.page_size);
        }
        if self.count {
            select = select.count_exact();
        }
        select
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so stdout stays clean JSON.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn query_options(cli: &Cli, config: Option<&UmrohConfig>) -> QueryOptions {
    let mut options = config.map(UmrohConfig::query_options).unwrap_or_default();
    if let Some(max_retries) = cli.max_retries {
        options = options.with_max_retries(max_retries);
    }
    if let Some(ms) = cli.retry_delay_ms {
        options = options.with_retry_delay(Duration::from_millis(ms));
    }
    options
}

fn print_toast(toast: Toast) {
    eprintln!("{}", toast.format());
}

async fn run_select(
    args: &SelectArgs,
    client: &RestClient,
    options: QueryOptions,
) -> Result<Option<Rows>> {
    let executor = QueryExecutor::with_notifier(options, print_toast);
    let rows = executor
        .execute_operation(client.operation(args.to_select()))
        .await;

    if rows.is_none()
        && let Some(error) = executor.error()
    {
        tracing::debug!(table = %args.table, %error, "Select failed");
        return Ok(None);
    }
    Ok(Some(rows.unwrap_or_default()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = UmrohConfig::load()?;
    let options = query_options(&cli, config.as_ref());
    let database = config
        .as_ref()
        .map_or_else(|| UmrohConfig::default().database(), UmrohConfig::database)
        .context("cannot reach the database without a url and anon key")?;
    let client = RestClient::new(&database.url, &database.anon_key)
        .context("failed to build HTTP client")?;
    tracing::info!(url = %database.url, "Using database");

    match &cli.command {
        Commands::Select(args) => {
            let Some(rows) = run_select(args, &client, options).await? else {
                return Ok(ExitCode::FAILURE);
            };
            let out = serde_json::to_string_pretty(&rows.rows)?;
            println!("{out}");
            if let Some(total) = rows.total {
                eprintln!("{} of {total} rows", rows.len());
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
