use crate::config::Settings;
use crate::domain::fare::Route;
use crate::error::CheckerError;
use crate::ingest::types::{
    CalendarDay, CalendarMonth, CalendarRequest, FareCalendar, CALENDAR_FIELD,
};
use crate::ingest::FareSource;
use anyhow::Context;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE, ORIGIN, REFERER, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

const SITE_ORIGIN: &str = "https://www.flypgs.com";
const SITE_REFERER: &str = "https://www.flypgs.com/";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Fare calendar client for the Pegasus cheap-fare endpoint.
#[derive(Debug, Clone)]
pub struct PegasusFareSource {
    http: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl PegasusFareSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build fare source http client")?;

        Ok(Self {
            http,
            url: settings.fare_api_url.clone(),
            cookie: settings.fare_api_cookie.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, CheckerError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        if let Some(cookie) = &self.cookie {
            let value = HeaderValue::from_str(cookie).map_err(|e| {
                CheckerError::UpstreamUnavailable(format!("invalid FARE_API_COOKIE: {e}"))
            })?;
            headers.insert(COOKIE, value);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl FareSource for PegasusFareSource {
    fn source_name(&self) -> &'static str {
        "pegasus"
    }

    async fn fetch_calendar(
        &self,
        route: &Route,
        flight_date: NaiveDate,
        currency: &str,
    ) -> Result<FareCalendar, CheckerError> {
        let body = CalendarRequest {
            dep_port: &route.origin,
            arr_port: &route.destination,
            flight_date: flight_date.format("%Y-%m-%d").to_string(),
            currency,
        };

        let res = self
            .http
            .post(self.url.as_str())
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| CheckerError::UpstreamUnavailable(format!("request failed: {e}")))?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            CheckerError::UpstreamUnavailable(format!("failed to read response body: {e}"))
        })?;
        if !status.is_success() {
            return Err(CheckerError::UpstreamUnavailable(format!(
                "HTTP {status}: {text}"
            )));
        }

        parse_calendar(&text)
    }
}

/// Decodes a fare source response body into a calendar.
pub fn parse_calendar(text: &str) -> Result<FareCalendar, CheckerError> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| CheckerError::MalformedResponse(format!("response is not JSON: {e}")))?;

    let months = match raw.get(CALENDAR_FIELD) {
        Some(Value::Array(months)) => months,
        Some(other) => {
            return Err(CheckerError::MalformedResponse(format!(
                "{CALENDAR_FIELD} is not a sequence: {other}"
            )))
        }
        None => {
            return Err(CheckerError::MalformedResponse(format!(
                "{CALENDAR_FIELD} is missing"
            )))
        }
    };

    let months = months.iter().filter_map(decode_month).collect();

    Ok(FareCalendar { months })
}

/// Decodes one month, dropping days that do not match the expected shape.
///
/// Individual bad entries are logged and skipped so the rest of the calendar survives.
fn decode_month(raw: &Value) -> Option<CalendarMonth> {
    let Some(obj) = raw.as_object() else {
        tracing::warn!(month = %raw, "skipping calendar month that is not an object");
        return None;
    };

    let port = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);
    let days = match obj.get("days") {
        Some(Value::Array(days)) => days
            .iter()
            .filter_map(|day| match serde_json::from_value::<CalendarDay>(day.clone()) {
                Ok(day) => Some(day),
                Err(e) => {
                    tracing::warn!(day = %day, error = %e, "skipping malformed calendar day");
                    None
                }
            })
            .collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            tracing::warn!(days = %other, "calendar month days is not a sequence; skipping month");
            return None;
        }
    };

    Some(CalendarMonth {
        dep_port: port("depPort"),
        arr_port: port("arrPort"),
        days,
    })
}
