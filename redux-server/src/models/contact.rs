use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_SUBJECT_LEN: usize = 200;
pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A validated, trimmed contact form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
    /// Delivery id assigned by the email provider
    pub id: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<ContactSubmission, &'static str> {
        let field = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        let submission = ContactSubmission {
            name: field(&self.name),
            email: field(&self.email),
            subject: field(&self.subject),
            message: field(&self.message),
        };

        if submission.name.is_empty()
            || submission.email.is_empty()
            || submission.subject.is_empty()
            || submission.message.is_empty()
        {
            return Err("All fields are required");
        }
        if !is_valid_email(&submission.email) {
            return Err("Invalid email address");
        }
        if submission.name.chars().count() > MAX_NAME_LEN {
            return Err("Name is too long");
        }
        if submission.email.len() > MAX_EMAIL_LEN {
            return Err("Email is too long");
        }
        if submission.subject.chars().count() > MAX_SUBJECT_LEN {
            return Err("Subject is too long");
        }
        if submission.message.chars().count() > MAX_MESSAGE_LEN {
            return Err("Message is too long");
        }
        Ok(submission)
    }
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.'),
        None => false,
    }
}
