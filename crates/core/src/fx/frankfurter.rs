use crate::config::Settings;
use crate::error::CheckerError;
use crate::fx::RateSource;
use anyhow::Context;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Latest-rate client for the Frankfurter (ECB) exchange rate API.
#[derive(Debug, Clone)]
pub struct FrankfurterRateSource {
    http: reqwest::Client,
    url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    rates: BTreeMap<String, f64>,
}

impl FrankfurterRateSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build rate source http client")?;

        Ok(Self {
            http,
            url: settings.rate_api_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl RateSource for FrankfurterRateSource {
    async fn latest_rate(&self, from: &str, to: &str) -> Result<Decimal, CheckerError> {
        let unavailable = |detail: String| CheckerError::RateUnavailable {
            from: from.to_string(),
            to: to.to_string(),
            detail,
        };

        let res = self
            .http
            .get(self.url.as_str())
            .query(&[("from", from), ("to", to)])
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read response body: {e}")))?;
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}: {text}")));
        }

        rate_from_body(&text, to).map_err(unavailable)
    }
}

fn rate_from_body(text: &str, to: &str) -> Result<Decimal, String> {
    let parsed: LatestRatesResponse =
        serde_json::from_str(text).map_err(|e| format!("invalid rate response: {e}"))?;
    let rate = parsed
        .rates
        .get(to)
        .copied()
        .ok_or_else(|| format!("{to} missing from rate response"))?;
    Decimal::from_f64(rate)
        .filter(|r| *r > Decimal::ZERO)
        .ok_or_else(|| format!("rate {rate} is not a positive number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_target_rate() {
        let body = r#"{"amount":1.0,"base":"EUR","date":"2024-03-01","rates":{"TRY":34.75}}"#;
        assert_eq!(rate_from_body(body, "TRY").unwrap(), Decimal::new(3475, 2));
    }

    #[test]
    fn missing_target_is_an_error() {
        let body = r#"{"amount":1.0,"base":"EUR","rates":{"USD":1.08}}"#;
        assert!(rate_from_body(body, "TRY").unwrap_err().contains("TRY"));
    }

    #[test]
    fn rejects_non_positive_rate() {
        let body = r#"{"rates":{"TRY":0}}"#;
        assert!(rate_from_body(body, "TRY").is_err());
    }
}
