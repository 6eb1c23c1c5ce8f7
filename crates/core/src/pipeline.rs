use crate::config::Settings;
use crate::domain::change::detect_change;
use crate::domain::fare::{FareSnapshot, Route};
use crate::fx::{CurrencyConverter, RateSource};
use crate::ingest::filter::FareFilter;
use crate::ingest::types::FareCalendar;
use crate::ingest::FareSource;
use crate::notify::{Notification, Notifier};
use crate::report::group::group_by_month;
use crate::report::render::{render_summary, Renderer};
use crate::storage::SnapshotStore;
use anyhow::Context;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Immutable configuration of a fare check.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub route: Route,
    pub source_currency: String,
    pub target_currency: String,
    pub price_ceiling: Decimal,
    pub cheap_threshold: Decimal,
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub template_path: PathBuf,
}

impl CheckerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let subject = settings.email_subject.clone().unwrap_or_else(|| {
            default_subject(settings.price_ceiling, &settings.source_currency)
        });

        Self {
            route: Route::new(&settings.origin, &settings.destination),
            source_currency: settings.source_currency.clone(),
            target_currency: settings.target_currency.clone(),
            price_ceiling: settings.price_ceiling,
            cheap_threshold: settings.cheap_threshold,
            sender: settings.sender_email.clone().unwrap_or_default(),
            recipients: settings.recipient_emails.clone(),
            subject,
            template_path: settings.template_path.clone(),
        }
    }

    fn fare_filter(&self) -> FareFilter {
        FareFilter {
            ceiling: self.price_ceiling,
            source_currency: self.source_currency.clone(),
            target_currency: self.target_currency.clone(),
        }
    }
}

pub fn default_subject(ceiling: Decimal, currency: &str) -> String {
    format!("🛫 Cheap Pegasus Flights Under {} {currency}", ceiling.normalize())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compare and render, but neither notify nor persist.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Fare set unchanged since the previous run.
    NotNeeded,
    /// Changed, but the run was a dry run.
    Skipped,
    Sent,
    /// The channel rejected the message; the snapshot was still persisted.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub flight_date: NaiveDate,
    pub snapshot: FareSnapshot,
    pub fetch_degraded: bool,
    pub rate: Option<Decimal>,
    pub changed: bool,
    pub notification: NotificationOutcome,
    pub persisted: bool,
    pub document: String,
}

/// The fetch, filter, convert, dedupe and notify pipeline.
pub struct FlightChecker {
    config: CheckerConfig,
    fares: Arc<dyn FareSource>,
    rates: Arc<dyn RateSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn SnapshotStore>,
}

impl FlightChecker {
    pub fn new(
        config: CheckerConfig,
        fares: Arc<dyn FareSource>,
        rates: Arc<dyn RateSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            config,
            fares,
            rates,
            notifier,
            store,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Performs one run.
    ///
    /// Upstream, rate, snapshot-read and notification failures degrade the run; only a missing
    /// template or a failed snapshot write is returned as an error.
    pub async fn run(&self, flight_date: NaiveDate, opts: RunOptions) -> anyhow::Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("fare_check", %run_id, %flight_date, route = %self.config.route);
        self.run_inner(run_id, flight_date, opts)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        flight_date: NaiveDate,
        opts: RunOptions,
    ) -> anyhow::Result<RunReport> {
        let cfg = &self.config;

        let (calendar, rate) = tokio::join!(
            self.fares
                .fetch_calendar(&cfg.route, flight_date, &cfg.source_currency),
            self.rates
                .latest_rate(&cfg.source_currency, &cfg.target_currency),
        );

        let (calendar, fetch_degraded) = match calendar {
            Ok(calendar) => (calendar, false),
            Err(err) => {
                tracing::warn!(
                    source = self.fares.source_name(),
                    error = %err,
                    "fare calendar unavailable; continuing with no qualifying fares"
                );
                (FareCalendar::default(), true)
            }
        };

        let offers = cfg.fare_filter().apply(&calendar, &cfg.route);
        let converter = CurrencyConverter::new(cfg.source_currency.clone(), rate);
        let snapshot = FareSnapshot::new(converter.convert_all(offers));
        let groups = group_by_month(snapshot.offers());

        tracing::info!(
            offers = snapshot.len(),
            rate = ?converter.rate(),
            "fare summary:\n{}",
            render_summary(&groups)
        );

        let previous = {
            let store = Arc::clone(&self.store);
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || span.in_scope(|| store.load()))
                .await
                .context("snapshot load task failed")?
        };
        let changed = detect_change(&snapshot, &previous);

        let renderer = {
            let path = cfg.template_path.clone();
            let threshold = cfg.cheap_threshold;
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || span.in_scope(|| Renderer::load(&path, threshold)))
                .await
                .context("template load task failed")??
        };
        let document = renderer.render_document(&groups);

        let mut report = RunReport {
            run_id,
            flight_date,
            snapshot,
            fetch_degraded,
            rate: converter.rate(),
            changed,
            notification: NotificationOutcome::NotNeeded,
            persisted: false,
            document,
        };

        if !changed {
            tracing::info!(offers = report.snapshot.len(), "fare set unchanged; no notification");
            return Ok(report);
        }

        if opts.dry_run {
            tracing::info!(
                offers = report.snapshot.len(),
                previous_offers = previous.len(),
                "fare set changed (dry run; not notifying or persisting)"
            );
            report.notification = NotificationOutcome::Skipped;
            return Ok(report);
        }

        let notification = Notification {
            sender: cfg.sender.clone(),
            recipients: cfg.recipients.clone(),
            subject: cfg.subject.clone(),
            html_body: report.document.clone(),
        };

        report.notification = match self.notifier.send(&notification).await {
            Ok(()) => {
                tracing::info!(
                    channel = self.notifier.channel_name(),
                    recipients = notification.recipients.len(),
                    offers = report.snapshot.len(),
                    "notification sent"
                );
                NotificationOutcome::Sent
            }
            Err(err) => {
                tracing::error!(
                    channel = self.notifier.channel_name(),
                    error = %err,
                    "notification failed; persisting snapshot anyway"
                );
                NotificationOutcome::Failed(err.to_string())
            }
        };

        // Persist on send attempt so a flaky channel cannot cause repeated notifications.
        {
            let store = Arc::clone(&self.store);
            let snapshot = report.snapshot.clone();
            let span = tracing::Span::current();
            tokio::task::spawn_blocking(move || span.in_scope(|| store.save(&snapshot, run_id)))
                .await
                .context("snapshot save task failed")?
                .context("failed to persist fare snapshot")?;
        }
        report.persisted = true;

        Ok(report)
    }
}
