use crate::config::Settings;
use crate::error::CheckerError;
use crate::notify::{Notification, Notifier};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SendGridNotifier {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

impl<'a> MailSendRequest<'a> {
    fn from_notification(n: &'a Notification) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: n
                    .recipients
                    .iter()
                    .map(|email| Address {
                        email: email.as_str(),
                    })
                    .collect(),
            }],
            from: Address {
                email: n.sender.as_str(),
            },
            subject: &n.subject,
            content: vec![Content {
                kind: "text/html",
                value: &n.html_body,
            }],
        }
    }
}

impl SendGridNotifier {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_sendgrid_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .build()
            .context("failed to build SendGrid http client")?;

        Ok(Self {
            http,
            api_key,
            base_url: settings.sendgrid_base_url.clone(),
        })
    }

    fn headers(&self) -> Result<HeaderMap, CheckerError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| CheckerError::NotificationFailed(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl Notifier for SendGridNotifier {
    fn channel_name(&self) -> &'static str {
        "sendgrid"
    }

    async fn send(&self, notification: &Notification) -> Result<(), CheckerError> {
        if notification.recipients.is_empty() {
            return Err(CheckerError::NotificationFailed(
                "no recipients configured".to_string(),
            ));
        }

        let url = format!("{}/v3/mail/send", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&MailSendRequest::from_notification(notification))
            .send()
            .await
            .map_err(|e| CheckerError::NotificationFailed(format!("request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(CheckerError::NotificationFailed(format!(
                "HTTP {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_puts_all_recipients_in_one_message() {
        let n = Notification {
            sender: "alerts@example.com".to_string(),
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
            subject: "Cheap flights".to_string(),
            html_body: "<p>hi</p>".to_string(),
        };
        let v = serde_json::to_value(MailSendRequest::from_notification(&n)).unwrap();
        assert_eq!(
            v,
            json!({
                "personalizations": [{"to": [{"email": "a@example.com"}, {"email": "b@example.com"}]}],
                "from": {"email": "alerts@example.com"},
                "subject": "Cheap flights",
                "content": [{"type": "text/html", "value": "<p>hi</p>"}]
            })
        );
    }
}
