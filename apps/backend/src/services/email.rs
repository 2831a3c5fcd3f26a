//! Outbound transactional email over a provider's HTTP API.
//!
//! Sending is fire-and-forget from the handlers' perspective: they spawn a
//! task and never block a response on delivery. Failures are logged here.

use std::env;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
    sender: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(base_url: String, api_token: String, sender: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url,
            api_token,
            sender,
        }
    }

    /// Build from `MAIL_BASE_URL`, `MAIL_API_TOKEN` and `MAIL_SENDER`.
    /// Returns None when any of them is unset so the server can run
    /// without a mail provider.
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("MAIL_BASE_URL").ok()?;
        let api_token = env::var("MAIL_API_TOKEN").ok()?;
        let sender = env::var("MAIL_SENDER").ok()?;
        Some(Self::new(base_url, api_token, sender))
    }

    pub async fn send_confirmation(&self, to: &str, username: &str, link: &str) {
        let subject = "Confirm your email";
        let text = format!("Hi {username}, confirm your email by opening {link}");
        let html = format!(
            "<p>Hi {username},</p><p><a href=\"{link}\">Confirm your email</a></p>"
        );
        self.send(to, subject, &html, &text).await;
    }

    pub async fn send_password_reset(&self, to: &str, username: &str, link: &str) {
        let subject = "Reset your password";
        let text = format!("Hi {username}, reset your password by opening {link}");
        let html = format!(
            "<p>Hi {username},</p><p><a href=\"{link}\">Reset your password</a></p>"
        );
        self.send(to, subject, &html, &text).await;
    }

    pub async fn send_password_changed(&self, to: &str, username: &str) {
        let subject = "Your password was changed";
        let text = format!(
            "Hi {username}, your password was just changed. If this wasn't you, reset it immediately."
        );
        let html = format!("<p>Hi {username},</p><p>Your password was just changed.</p>");
        self.send(to, subject, &html, &text).await;
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str, text_body: &str) {
        let body = SendEmailRequest {
            from: &self.sender,
            to,
            subject,
            html_body,
            text_body,
        };

        let result = self
            .http
            .post(format!("{}/email", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                info!(to, subject, "email sent");
            }
            Ok(resp) => {
                warn!(to, subject, status = %resp.status(), "mail provider rejected email");
            }
            Err(e) => {
                warn!(to, subject, error = %e, "failed to reach mail provider");
            }
        }
    }
}
