//! tech-trends-digest binary entrypoint.
//! One invocation = one digest run; schedule it with cron or a systemd timer.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tech_trends_digest::config::DigestConfig;
use tech_trends_digest::ingest::providers::{default_adapters, http_client};
use tech_trends_digest::metrics::Metrics;
use tech_trends_digest::notify::{Digest, EmailNotifier};
use tech_trends_digest::{DigestPipeline, LedgerStore};

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "tech-trends-digest",
    version,
    about = "Collect AI/ML trends, drop already-sent items, email the top N"
)]
struct Cli {
    /// Settings TOML (overrides $DIGEST_CONFIG_PATH and config/digest.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum number of items in the digest
    #[arg(long)]
    limit: Option<usize>,

    /// Print the digest instead of emailing it; the ledger is not updated
    #[arg(long)]
    dry_run: bool,

    /// Emit JSON log lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tech_trends_digest=info,warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn load_config(cli: &Cli) -> Result<DigestConfig> {
    let cfg = DigestConfig::resolve(cli.config.as_deref(), !cli.dry_run)?;
    match cli.limit {
        Some(limit) => cfg.with_limit(limit),
        None => Ok(cfg),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    // Settings and delivery credentials are a hard precondition: check
    // before any fetch.
    let cfg = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let notifier = match cfg.email.as_ref().map(|email| EmailNotifier::new(email, &cfg.settings.smtp)) {
        None => None,
        Some(Ok(n)) => Some(n),
        Some(Err(e)) => {
            eprintln!("configuration error: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    let settings = &cfg.settings;

    let metrics = match settings.metrics_textfile {
        Some(_) => match Metrics::init() {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::warn!(error = ?e, "metrics disabled");
                None
            }
        },
        None => None,
    };

    let ok = match run(&cli, &cfg, notifier).await {
        Ok(ok) => ok,
        Err(e) => {
            eprintln!("run failed: {e:#}");
            false
        }
    };

    if let (Some(m), Some(path)) = (&metrics, &settings.metrics_textfile) {
        if let Err(e) = m.write_textfile(path) {
            tracing::warn!(error = ?e, "writing metrics textfile failed");
        }
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_RUN_FAILED)
    }
}

async fn run(cli: &Cli, cfg: &DigestConfig, notifier: Option<EmailNotifier>) -> Result<bool> {
    let settings = &cfg.settings;
    let client = http_client(Duration::from_secs(settings.http_timeout_secs))?;
    let adapters = default_adapters(&settings.sources, cfg.newsapi_key.as_deref(), &client);
    let ledger = LedgerStore::new(&settings.ledger_path)
        .with_retention_days(settings.ledger_retention_days);

    tracing::info!(
        adapters = adapters.len(),
        limit = settings.limit,
        ledger = %settings.ledger_path.display(),
        dry_run = cli.dry_run,
        "starting digest run"
    );

    match notifier {
        None => {
            let pipeline = DigestPipeline::new(adapters, ledger, Arc::new(NoopNotifier))
                .with_limit(settings.limit)
                .with_adapter_timeout(Duration::from_secs(settings.adapter_timeout_secs));
            let items = pipeline.preview().await;
            let today = chrono::Local::now().date_naive();
            print!("{}", Digest::new(&items, today).to_plain());
            println!("Found {} new trends (dry run, nothing sent)", items.len());
            Ok(true)
        }
        Some(n) => {
            let pipeline = DigestPipeline::new(adapters, ledger, Arc::new(n))
                .with_limit(settings.limit)
                .with_adapter_timeout(Duration::from_secs(settings.adapter_timeout_secs));
            let report = pipeline.run().await;
            println!(
                "Found {} trends, {} new, {} sent ({})",
                report.found,
                report.selected,
                report.sent,
                report.outcome.as_str()
            );
            Ok(report.outcome.is_success())
        }
    }
}

/// Stand-in notifier for `--dry-run`; `preview` never calls it.
struct NoopNotifier;

#[async_trait::async_trait]
impl tech_trends_digest::Notifier for NoopNotifier {
    async fn send(&self, _items: &[tech_trends_digest::TrendItem]) -> bool {
        false
    }
}
