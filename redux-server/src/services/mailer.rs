use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ensure_success, Mailer, ServiceError};
use crate::config::ResendConfig;
use crate::models::contact::ContactSubmission;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send(&self, email: OutgoingEmail) -> Result<String, ServiceError> {
        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        let sent = ensure_success(resp).await?.json::<SendEmailResponse>().await?;
        tracing::info!(id = %sent.id, subject = %email.subject, "email accepted by Resend");
        Ok(sent.id)
    }
}

/// Builds the notification sent to the studio for a contact form submission.
pub fn contact_email(submission: &ContactSubmission, from: &str, to: &str) -> OutgoingEmail {
    let html = format!(
        "<h2>New contact form submission</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Subject:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p>{}</p>",
        escape_html(&submission.name),
        escape_html(&submission.email),
        escape_html(&submission.subject),
        escape_html(&submission.message).replace('\n', "<br>"),
    );
    let text = format!(
        "New contact form submission\n\nName: {}\nEmail: {}\nSubject: {}\n\n{}\n",
        submission.name, submission.email, submission.subject, submission.message
    );

    OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        subject: format!("[Contact] {}", submission.subject.replace(['\r', '\n'], " ")),
        html,
        text,
        reply_to: Some(submission.email.clone()),
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
