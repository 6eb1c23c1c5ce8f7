pub mod domain;
pub mod error;
pub mod fx;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;
    use rust_decimal::Decimal;
    use std::path::PathBuf;
    use std::str::FromStr;

    pub const DEFAULT_FARE_API_URL: &str =
        "https://www.flypgs.com/apint/cheapfare/flight-calender-prices";
    pub const DEFAULT_RATE_API_URL: &str = "https://api.frankfurter.app/latest";
    pub const DEFAULT_SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub fare_api_url: String,
        pub fare_api_cookie: Option<String>,
        pub origin: String,
        pub destination: String,
        pub source_currency: String,
        pub target_currency: String,
        pub price_ceiling: Decimal,
        pub cheap_threshold: Decimal,
        pub rate_api_url: String,
        pub http_timeout_secs: u64,
        pub sendgrid_api_key: Option<String>,
        pub sendgrid_base_url: String,
        pub sender_email: Option<String>,
        pub recipient_emails: Vec<String>,
        pub email_subject: Option<String>,
        pub template_path: PathBuf,
        pub snapshot_path: PathBuf,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                fare_api_url: env_or("FARE_API_URL", DEFAULT_FARE_API_URL),
                fare_api_cookie: env_opt("FARE_API_COOKIE"),
                origin: env_or("FARE_ORIGIN", "SJJ"),
                destination: env_or("FARE_DESTINATION", "SAW"),
                source_currency: env_or("SOURCE_CURRENCY", "EUR"),
                target_currency: env_or("TARGET_CURRENCY", "TRY"),
                price_ceiling: env_parse("PRICE_CEILING", Decimal::from(45))?,
                cheap_threshold: env_parse("CHEAP_THRESHOLD", Decimal::from(40))?,
                rate_api_url: env_or("RATE_API_URL", DEFAULT_RATE_API_URL),
                http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
                sendgrid_api_key: env_opt("SENDGRID_API_KEY"),
                sendgrid_base_url: env_or("SENDGRID_BASE_URL", DEFAULT_SENDGRID_BASE_URL),
                sender_email: env_opt("SENDER_EMAIL"),
                recipient_emails: parse_recipients(
                    std::env::var("RECIPIENT_EMAILS").ok().as_deref(),
                ),
                email_subject: env_opt("EMAIL_SUBJECT"),
                template_path: PathBuf::from(env_or("TEMPLATE_PATH", "./template.html")),
                snapshot_path: PathBuf::from(env_or(
                    "SNAPSHOT_PATH",
                    "./data/fare_snapshot.json",
                )),
                sentry_dsn: env_opt("SENTRY_DSN"),
                port: env_parse("PORT", 3000)?,
            })
        }

        pub fn require_sendgrid_api_key(&self) -> anyhow::Result<&str> {
            self.sendgrid_api_key
                .as_deref()
                .context("SENDGRID_API_KEY is required")
        }

        pub fn require_sender_email(&self) -> anyhow::Result<&str> {
            self.sender_email
                .as_deref()
                .context("SENDER_EMAIL is required")
        }

        pub fn require_recipients(&self) -> anyhow::Result<&[String]> {
            anyhow::ensure!(
                !self.recipient_emails.is_empty(),
                "RECIPIENT_EMAILS is required (comma separated)"
            );
            Ok(&self.recipient_emails)
        }
    }

    pub fn parse_recipients(raw: Option<&str>) -> Vec<String> {
        raw.unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn env_opt(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn env_or(key: &str, default: &str) -> String {
        env_opt(key).unwrap_or_else(|| default.to_string())
    }

    fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env_opt(key) {
            Some(s) => s
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("{key} is not valid ({s:?}): {e}")),
            None => Ok(default),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn recipients_drop_blanks_and_whitespace() {
            let out = parse_recipients(Some(" a@example.com, ,b@example.com ,"));
            assert_eq!(out, vec!["a@example.com", "b@example.com"]);
            assert!(parse_recipients(None).is_empty());
        }

        #[test]
        fn malformed_numbers_are_rejected_not_defaulted() {
            std::env::set_var("FARE_WATCH_TEST_PORT_BAD", "abc");
            let err = env_parse::<u16>("FARE_WATCH_TEST_PORT_BAD", 3000).unwrap_err();
            assert!(err.to_string().starts_with("FARE_WATCH_TEST_PORT_BAD is not valid"));

            std::env::set_var("FARE_WATCH_TEST_PORT_RANGE", "70000");
            assert!(env_parse::<u16>("FARE_WATCH_TEST_PORT_RANGE", 3000).is_err());

            std::env::set_var("FARE_WATCH_TEST_PORT_OK", " 8080 ");
            assert_eq!(env_parse::<u16>("FARE_WATCH_TEST_PORT_OK", 3000).unwrap(), 8080);
            assert_eq!(env_parse::<u16>("FARE_WATCH_TEST_PORT_UNSET", 3000).unwrap(), 3000);
        }
    }
}
