use axum::{extract::State, routing::post, Json, Router};

use crate::error::{ApiError, ErrorBody};
use crate::extract::ApiJson;
use crate::models::contact::{ContactRequest, ContactResponse};
use crate::services::mailer;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/contact", post(submit_contact))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message delivered to the studio inbox", body = ContactResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorBody),
        (status = 502, description = "Email provider rejected the message", body = ErrorBody),
        (status = 503, description = "Email is not configured", body = ErrorBody),
    ),
    tag = "Contact"
)]
pub(crate) async fn submit_contact(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    let submission = req.validate().map_err(ApiError::bad_request)?;

    tracing::info!(
        name = %submission.name,
        email = %submission.email,
        subject = %submission.subject,
        "contact form submission"
    );

    let (Some(client), Some(recipient)) =
        (state.mailer.clone(), state.config.contact_email.as_deref())
    else {
        tracing::warn!("contact submission dropped: email delivery is not configured");
        return Err(ApiError::NotConfigured("Email"));
    };

    let email = mailer::contact_email(&submission, &state.config.contact_from, recipient);
    let id = client.send(email).await?;

    Ok(Json(ContactResponse {
        success: true,
        message: "Thank you for your message. We'll be in touch soon.".to_string(),
        id,
    }))
}
