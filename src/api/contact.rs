//! Public contact submission pipeline.
//!
//! Stateless, synchronous within the request: honeypot screen, then the
//! human-verification challenge, then field validation, then the two email
//! sends. Bots that fill the hidden field get a fake success and never learn
//! they were filtered; real failures after screening surface as 400/500.

use axum::{extract::State, Json};
use serde_json::json;
use std::sync::Arc;

use crate::db::ContactRequest;
use crate::AppState;

use super::error::ApiError;
use super::validation::validate_email;

/// Outcome of the synchronous screening steps, before any remote call.
#[derive(Debug, PartialEq, Eq)]
pub enum Screening {
    /// Honeypot tripped: respond with fake success, send nothing.
    Bot,
    /// Verification is required by configuration and no token came along.
    MissingToken,
    /// Required fields absent, by name.
    MissingFields(Vec<&'static str>),
    /// Clean so far; verification and delivery may proceed.
    Deliver,
}

/// Screen a submission. Order matters: the honeypot wins over everything
/// (bots that fill every field must still see success), then the challenge
/// token, then required fields.
pub fn screen(req: &ContactRequest, verification_required: bool) -> Screening {
    if !req.company.trim().is_empty() {
        return Screening::Bot;
    }

    if verification_required && req.recaptcha_token.trim().is_empty() {
        return Screening::MissingToken;
    }

    let mut missing = Vec::new();
    if req.name.trim().is_empty() {
        missing.push("name");
    }
    if req.email.trim().is_empty() || validate_email(req.email.trim()).is_err() {
        missing.push("email");
    }
    if req.message.trim().is_empty() {
        missing.push("message");
    }
    if !missing.is_empty() {
        return Screening::MissingFields(missing);
    }

    Screening::Deliver
}

/// Server-side verification call. The secret never leaves this function's
/// request body.
async fn verify_recaptcha(
    http: &reqwest::Client,
    verify_url: &str,
    secret: &str,
    token: &str,
) -> bool {
    let response = http
        .post(verify_url)
        .form(&[("secret", secret), ("response", token)])
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "reCAPTCHA verification request failed");
            return false;
        }
    };

    match response.json::<serde_json::Value>().await {
        Ok(body) => body.get("success").and_then(|v| v.as_bool()).unwrap_or(false),
        Err(e) => {
            tracing::error!(error = %e, "reCAPTCHA verification response unreadable");
            false
        }
    }
}

/// POST /api/contact
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let contact = &state.config.contact;

    match screen(&req, contact.recaptcha_secret.is_some()) {
        Screening::Bot => {
            // Fake success: automated senders must not learn they were caught
            tracing::debug!("Honeypot tripped, dropping submission");
            return Ok(Json(json!({ "success": true })));
        }
        Screening::MissingToken => {
            return Err(ApiError::bad_request(
                "Please complete the verification challenge",
            ));
        }
        Screening::MissingFields(fields) => {
            return Err(ApiError::bad_request(format!(
                "Missing required fields: {}",
                fields.join(", ")
            )));
        }
        Screening::Deliver => {}
    }

    if let Some(secret) = &contact.recaptcha_secret {
        let human = verify_recaptcha(
            &state.http,
            &contact.recaptcha_verify_url,
            secret,
            req.recaptcha_token.trim(),
        )
        .await;
        if !human {
            return Err(ApiError::bad_request(
                "Verification failed. Please try again.",
            ));
        }
    }

    if !state.mailer.is_enabled() || contact.recipient.is_empty() {
        tracing::error!("Contact pipeline invoked without email configuration");
        return Err(ApiError::internal("The contact form is temporarily unavailable"));
    }

    tracing::info!(from = %req.email, "Contact submission accepted");

    state
        .mailer
        .send_owner_notification(&contact.recipient, &req)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Owner notification failed");
            ApiError::internal("Could not send your message")
        })?;

    if contact.send_confirmation {
        state.mailer.send_confirmation(&req).await.map_err(|e| {
            tracing::error!(error = %e, "Confirmation email failed");
            ApiError::internal("Could not send your message")
        })?;
    }

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ContactRequest {
        ContactRequest {
            name: "Jeanne".to_string(),
            email: "jeanne@example.com".to_string(),
            subject: String::new(),
            message: "Is the commode still available?".to_string(),
            company: String::new(),
            recaptcha_token: "tok".to_string(),
        }
    }

    #[test]
    fn honeypot_wins_over_everything() {
        let mut req = valid();
        req.company = "Acme Corp".to_string();
        // Even a fully valid submission is dropped when the hidden field
        // is filled, and a fully invalid one gets the same treatment
        assert_eq!(screen(&req, true), Screening::Bot);
        req.name.clear();
        req.message.clear();
        assert_eq!(screen(&req, true), Screening::Bot);
    }

    #[test]
    fn token_is_checked_before_fields_when_required() {
        let mut req = valid();
        req.recaptcha_token = String::new();
        req.name.clear();
        assert_eq!(screen(&req, true), Screening::MissingToken);
        // Without the requirement the field check runs
        assert_eq!(
            screen(&req, false),
            Screening::MissingFields(vec!["name"])
        );
    }

    #[test]
    fn missing_fields_are_listed_by_name() {
        let mut req = valid();
        req.name = "  ".to_string();
        req.email = String::new();
        req.message = String::new();
        assert_eq!(
            screen(&req, false),
            Screening::MissingFields(vec!["name", "email", "message"])
        );
    }

    #[test]
    fn malformed_email_counts_as_missing() {
        let mut req = valid();
        req.email = "not-an-address".to_string();
        assert_eq!(screen(&req, false), Screening::MissingFields(vec!["email"]));
    }

    #[test]
    fn clean_submission_is_delivered() {
        assert_eq!(screen(&valid(), true), Screening::Deliver);
        let mut req = valid();
        req.recaptcha_token = String::new();
        assert_eq!(screen(&req, false), Screening::Deliver);
    }

    #[test]
    fn subject_is_optional() {
        let mut req = valid();
        req.subject = String::new();
        assert_eq!(screen(&req, true), Screening::Deliver);
    }
}
