use anyhow::Context;
use clap::Parser;
use fare_watch_core::config::Settings;
use fare_watch_core::fx::frankfurter::FrankfurterRateSource;
use fare_watch_core::ingest::pegasus::PegasusFareSource;
use fare_watch_core::notify::sendgrid::SendGridNotifier;
use fare_watch_core::notify::{LogNotifier, Notifier};
use fare_watch_core::pipeline::{CheckerConfig, FlightChecker, NotificationOutcome, RunOptions};
use fare_watch_core::storage::snapshot::JsonFileSnapshotStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "fare_watch_worker")]
struct Args {
    /// Date the fare calendar is queried from (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    flight_date: Option<String>,

    /// Do everything except sending the notification and saving the snapshot.
    #[arg(long)]
    dry_run: bool,

    /// Write the rendered document to this path.
    #[arg(long)]
    preview_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, &args).await {
        sentry_anyhow::capture_anyhow(&err);
        let detail = format!("{err:#}");
        tracing::error!(error = %detail, "fare check failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    let flight_date = fare_watch_core::time::flight_date::resolve_flight_date(
        args.flight_date.as_deref(),
        chrono::Utc::now(),
    )?;

    let notifier: Arc<dyn Notifier> = if args.dry_run {
        Arc::new(LogNotifier)
    } else {
        settings.require_sender_email()?;
        settings.require_recipients()?;
        Arc::new(SendGridNotifier::from_settings(settings)?)
    };

    let checker = FlightChecker::new(
        CheckerConfig::from_settings(settings),
        Arc::new(PegasusFareSource::from_settings(settings)?),
        Arc::new(FrankfurterRateSource::from_settings(settings)?),
        notifier,
        Arc::new(JsonFileSnapshotStore::new(&settings.snapshot_path)),
    );

    let report = checker
        .run(
            flight_date,
            RunOptions {
                dry_run: args.dry_run,
            },
        )
        .await?;

    if let Some(path) = &args.preview_out {
        std::fs::write(path, &report.document)
            .with_context(|| format!("failed to write preview to {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote rendered preview");
    }

    let outcome = match &report.notification {
        NotificationOutcome::NotNeeded => "unchanged",
        NotificationOutcome::Skipped => "changed (dry run)",
        NotificationOutcome::Sent => "notified",
        NotificationOutcome::Failed(_) => "notification failed",
    };

    tracing::info!(
        run_id = %report.run_id,
        %flight_date,
        offers = report.snapshot.len(),
        fetch_degraded = report.fetch_degraded,
        rate_available = report.rate.is_some(),
        persisted = report.persisted,
        outcome,
        "fare check finished"
    );
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
