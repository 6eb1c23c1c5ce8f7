use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use fare_watch_core::config::Settings;
use fare_watch_core::domain::fare::FareSnapshot;
use fare_watch_core::fx::frankfurter::FrankfurterRateSource;
use fare_watch_core::ingest::pegasus::PegasusFareSource;
use fare_watch_core::notify::sendgrid::SendGridNotifier;
use fare_watch_core::pipeline::{CheckerConfig, FlightChecker, NotificationOutcome, RunOptions};
use fare_watch_core::storage::lock::RunLock;
use fare_watch_core::storage::snapshot::JsonFileSnapshotStore;
use fare_watch_core::storage::SnapshotStore;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

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

    let store = Arc::new(JsonFileSnapshotStore::new(&settings.snapshot_path));
    let checker = match build_checker(&settings, store.clone()) {
        Ok(checker) => Some(Arc::new(checker)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "fare checker not configured; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        checker,
        store,
        lock: RunLock::new(),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/api/flight-checker",
            get(run_flight_checker).post(run_flight_checker),
        )
        .route("/snapshots/latest", get(get_latest_snapshot))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_checker(
    settings: &Settings,
    store: Arc<JsonFileSnapshotStore>,
) -> anyhow::Result<FlightChecker> {
    settings.require_sender_email()?;
    settings.require_recipients()?;

    Ok(FlightChecker::new(
        CheckerConfig::from_settings(settings),
        Arc::new(PegasusFareSource::from_settings(settings)?),
        Arc::new(FrankfurterRateSource::from_settings(settings)?),
        Arc::new(SendGridNotifier::from_settings(settings)?),
        store,
    ))
}

#[derive(Clone)]
struct AppState {
    checker: Option<Arc<FlightChecker>>,
    store: Arc<JsonFileSnapshotStore>,
    lock: RunLock,
}

#[derive(Debug, Deserialize)]
struct RunParams {
    flight_date: Option<String>,
}

async fn healthz() -> &'static str {
    "ok"
}

async fn run_flight_checker(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> (StatusCode, &'static str) {
    let Some(checker) = &state.checker else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Fare checker is not configured");
    };

    let flight_date = match fare_watch_core::time::flight_date::resolve_flight_date(
        params.flight_date.as_deref(),
        chrono::Utc::now(),
    ) {
        Ok(d) => d,
        Err(_) => return (StatusCode::BAD_REQUEST, "Invalid flight_date"),
    };

    let Some(_guard) = state.lock.try_acquire() else {
        tracing::warn!(%flight_date, "fare check already running; rejecting request");
        return (StatusCode::CONFLICT, "Run already in progress");
    };

    match checker.run(flight_date, RunOptions::default()).await {
        Ok(report) => response_for(&report.notification),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            let detail = format!("{e:#}");
            tracing::error!(%flight_date, error = %detail, "fare check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

fn response_for(outcome: &NotificationOutcome) -> (StatusCode, &'static str) {
    match outcome {
        NotificationOutcome::Sent => (StatusCode::OK, "Email sent successfully"),
        NotificationOutcome::NotNeeded | NotificationOutcome::Skipped => {
            (StatusCode::OK, "No changes since last check")
        }
        NotificationOutcome::Failed(_) => {
            (StatusCode::OK, "Notification failed; snapshot updated")
        }
    }
}

async fn get_latest_snapshot(State(state): State<AppState>) -> Json<FareSnapshot> {
    Json(state.store.load())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use fare_watch_core::domain::fare::Route;
    use fare_watch_core::error::CheckerError;
    use fare_watch_core::fx::RateSource;
    use fare_watch_core::ingest::types::FareCalendar;
    use fare_watch_core::ingest::FareSource;
    use fare_watch_core::notify::LogNotifier;
    use rust_decimal::Decimal;

    struct DownFares;

    #[async_trait::async_trait]
    impl FareSource for DownFares {
        fn source_name(&self) -> &'static str {
            "down"
        }

        async fn fetch_calendar(
            &self,
            _route: &Route,
            _flight_date: chrono::NaiveDate,
            _currency: &str,
        ) -> Result<FareCalendar, CheckerError> {
            Err(CheckerError::UpstreamUnavailable("connection refused".to_string()))
        }
    }

    struct DownRates;

    #[async_trait::async_trait]
    impl RateSource for DownRates {
        async fn latest_rate(&self, from: &str, to: &str) -> Result<Decimal, CheckerError> {
            Err(CheckerError::RateUnavailable {
                from: from.to_string(),
                to: to.to_string(),
                detail: "connection refused".to_string(),
            })
        }
    }

    fn state(dir: &tempfile::TempDir, configured: bool) -> AppState {
        let template_path = dir.path().join("template.html");
        std::fs::write(&template_path, "<html>{{FLIGHT_CONTENT}}</html>").unwrap();
        let store = Arc::new(JsonFileSnapshotStore::new(dir.path().join("snapshot.json")));

        let checker = configured.then(|| {
            Arc::new(FlightChecker::new(
                CheckerConfig {
                    route: Route::new("SJJ", "SAW"),
                    source_currency: "EUR".to_string(),
                    target_currency: "TRY".to_string(),
                    price_ceiling: Decimal::from(45),
                    cheap_threshold: Decimal::from(40),
                    sender: "alerts@example.com".to_string(),
                    recipients: vec!["a@example.com".to_string()],
                    subject: "fares".to_string(),
                    template_path,
                },
                Arc::new(DownFares),
                Arc::new(DownRates),
                Arc::new(LogNotifier),
                store.clone(),
            ))
        });

        AppState {
            checker,
            store,
            lock: RunLock::new(),
        }
    }

    fn params(flight_date: Option<&str>) -> Query<RunParams> {
        Query(RunParams {
            flight_date: flight_date.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn unconfigured_checker_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let resp = run_flight_checker(State(state(&dir, false)), params(Some("2024-01-02"))).await;
        assert_eq!(
            resp,
            (StatusCode::SERVICE_UNAVAILABLE, "Fare checker is not configured")
        );
    }

    #[tokio::test]
    async fn malformed_flight_date_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let resp = run_flight_checker(State(state(&dir, true)), params(Some("bad"))).await;
        assert_eq!(resp, (StatusCode::BAD_REQUEST, "Invalid flight_date"));
    }

    #[tokio::test]
    async fn overlapping_run_is_rejected_until_the_first_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, true);

        let held = state.lock.try_acquire().unwrap();
        let resp = run_flight_checker(State(state.clone()), params(Some("2024-01-02"))).await;
        assert_eq!(resp, (StatusCode::CONFLICT, "Run already in progress"));
        assert!(!dir.path().join("snapshot.json").exists());

        drop(held);
        let resp = run_flight_checker(State(state), params(Some("2024-01-02"))).await;
        assert_eq!(resp, (StatusCode::OK, "No changes since last check"));
    }

    #[test]
    fn outcomes_map_to_plain_text_statuses() {
        assert_eq!(
            response_for(&NotificationOutcome::Sent),
            (StatusCode::OK, "Email sent successfully")
        );
        assert_eq!(
            response_for(&NotificationOutcome::NotNeeded),
            (StatusCode::OK, "No changes since last check")
        );
        assert_eq!(
            response_for(&NotificationOutcome::Failed("HTTP 503".to_string())).1,
            "Notification failed; snapshot updated"
        );
    }
}
