mod client;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use knaps_core::{csv_rows, validation};

use crate::client::{ApiClient, BulkFailure, BulkSummary};

#[derive(Debug, Parser)]
#[command(name = "knaps-cli")]
#[command(about = "knaps product and deal management command line interface")]
struct Cli {
    /// Base URL of the knaps server.
    #[arg(
        long,
        global = true,
        env = "KNAPS_SERVER_URL",
        default_value = "http://localhost:3000"
    )]
    server: String,

    /// Bearer token sent with every API request.
    #[arg(long, global = true, env = "KNAPS_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write the header-only product CSV template.
    Template {
        /// Destination file; stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Bulk-import a product CSV through the API.
    Import {
        file: PathBuf,
        /// Validate rows locally without contacting the server.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print sell-in/sell-through analytics.
    Analytics {
        /// Restrict ledger rows to one `YYYY-MM` month.
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        product_id: Option<i64>,
        /// Print the fleet-wide rollup instead of per-product rows.
        #[arg(long, conflicts_with = "product_id")]
        overall: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Template { ref output }) => write_template(output.as_deref())?,
        Some(Commands::Import { ref file, dry_run }) => {
            let csv = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let summary = if dry_run {
                validate_locally(&csv)?
            } else {
                client(&cli)?.upload_products_csv(csv).await?
            };
            print_bulk_summary(&summary, dry_run);
            if summary.errors > 0 {
                anyhow::bail!(
                    "{} of {} rows failed",
                    summary.errors,
                    summary.success + summary.errors
                );
            }
        }
        Some(Commands::Analytics {
            ref month,
            product_id,
            overall,
        }) => {
            if let Some(month) = month {
                anyhow::ensure!(
                    knaps_core::is_valid_month_partition(month),
                    "--month must be formatted YYYY-MM, got '{month}'"
                );
            }
            let api = client(&cli)?;
            if overall {
                let totals = api.overall_analytics(month.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&totals)?);
            } else {
                let rows = api.product_analytics(product_id, month.as_deref()).await?;
                print_product_analytics(&rows);
            }
        }
        None => println!("knaps-cli: run with --help to list commands"),
    }

    Ok(())
}

fn client(cli: &Cli) -> anyhow::Result<ApiClient> {
    Ok(ApiClient::new(&cli.server, cli.token.as_deref(), cli.timeout_secs)?)
}

fn write_template(output: Option<&Path>) -> anyhow::Result<()> {
    let template = csv_rows::template();
    match output {
        Some(path) => {
            std::fs::write(path, template)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote product CSV template");
        }
        None => print!("{template}"),
    }
    Ok(())
}

/// Run every CSV row through product validation without importing it.
///
/// Duplicate codes are only detected within the file; the server may still
/// reject codes it already holds.
fn validate_locally(csv: &str) -> anyhow::Result<BulkSummary> {
    let rows = csv_rows::parse_product_csv(csv)?;
    let mut seen = std::collections::HashSet::new();
    let mut summary = BulkSummary {
        success: 0,
        errors: 0,
        failed: Vec::new(),
    };
    for (index, row) in rows.iter().enumerate() {
        let failure = match validation::validate_new_product(row) {
            Ok(product) if !seen.insert(product.product_code.clone()) => Some(BulkFailure {
                row: index + 1,
                error: "Product code already exists".to_string(),
                details: Vec::new(),
            }),
            Ok(_) => None,
            Err(details) => Some(BulkFailure {
                row: index + 1,
                error: "Validation failed".to_string(),
                details,
            }),
        };
        match failure {
            Some(failure) => {
                summary.errors += 1;
                summary.failed.push(failure);
            }
            None => summary.success += 1,
        }
    }
    Ok(summary)
}

fn print_bulk_summary(summary: &BulkSummary, dry_run: bool) {
    let verb = if dry_run { "valid" } else { "imported" };
    println!("{} {verb}, {} failed", summary.success, summary.errors);
    for failure in &summary.failed {
        if failure.details.is_empty() {
            println!("  row {}: {}", failure.row, failure.error);
        } else {
            println!(
                "  row {}: {} ({})",
                failure.row,
                failure.error,
                validation::describe(&failure.details)
            );
        }
    }
}

fn print_product_analytics(rows: &[knaps_core::ProductAnalytics]) {
    println!(
        "{:<16} {:>8} {:>8} {:>8} {:>9} {:>12}",
        "code", "in", "through", "stock", "turnover", "revenue"
    );
    for row in rows {
        println!(
            "{:<16} {:>8} {:>8} {:>8} {:>8}% {:>12}",
            row.product_code,
            row.sell_in_quantity,
            row.sell_through_quantity,
            row.current_stock,
            row.turnover_rate,
            row.total_revenue
        );
    }
}

#[cfg(test)]
mod tests;
