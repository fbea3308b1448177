//! Transactional email for the contact pipeline.
//!
//! One SMTP service in the style of the deployment notifier it replaces:
//! config-gated, multipart alternative bodies, structured logging on send.
//! Rendering is split out as pure functions so the pipeline's composition
//! rules (escaping, newline handling, subject fallback) are testable without
//! a transport.

use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::EmailConfig;
use crate::db::ContactRequest;

/// One attempted send, as recorded by a test outbox.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct RecordedEmail {
    pub to: String,
    pub subject: String,
    pub reply_to: Option<String>,
}

#[cfg(test)]
pub(crate) type Outbox = std::sync::Arc<std::sync::Mutex<Vec<RecordedEmail>>>;

pub struct ContactMailer {
    config: EmailConfig,
    #[cfg(test)]
    outbox: Option<Outbox>,
}

impl ContactMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            #[cfg(test)]
            outbox: None,
        }
    }

    /// Mailer that records every attempted send instead of speaking SMTP.
    #[cfg(test)]
    pub(crate) fn recording(outbox: Outbox) -> Self {
        Self {
            config: EmailConfig::default(),
            outbox: Some(outbox),
        }
    }

    /// Check if email sending is configured and enabled
    pub fn is_enabled(&self) -> bool {
        #[cfg(test)]
        if self.outbox.is_some() {
            return true;
        }
        self.config.is_configured()
    }

    /// Send the owner notification for a contact submission. Reply-to points
    /// at the submitter so the owner can answer directly.
    pub async fn send_owner_notification(
        &self,
        recipient: &str,
        submission: &ContactRequest,
    ) -> Result<()> {
        let subject = subject_or_default(&submission.subject, &submission.name);
        self.send_email(
            recipient,
            &subject,
            &render_owner_html(submission),
            &render_owner_text(submission),
            Some(&submission.email),
        )
        .await
    }

    /// Send the confirmation copy back to the submitter.
    pub async fn send_confirmation(&self, submission: &ContactRequest) -> Result<()> {
        self.send_email(
            &submission.email,
            "We have received your message",
            &render_confirmation_html(submission),
            &render_confirmation_text(submission),
            None,
        )
        .await
    }

    /// Send an email with HTML and plain text versions
    async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_body: &str,
        text_body: &str,
        reply_to: Option<&str>,
    ) -> Result<()> {
        #[cfg(test)]
        if let Some(outbox) = &self.outbox {
            outbox.lock().unwrap().push(RecordedEmail {
                to: to_email.to_string(),
                subject: subject.to_string(),
                reply_to: reply_to.map(|r| r.to_string()),
            });
            return Ok(());
        }

        let smtp_host = self
            .config
            .smtp_host
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SMTP host not configured"))?;
        let from_address = self
            .config
            .from_address
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("From address not configured"))?;

        let from: Mailbox = format!("{} <{}>", self.config.from_name, from_address).parse()?;
        let to: Mailbox = to_email.parse()?;

        let mut builder = Message::builder().from(from).to(to).subject(subject);
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let email = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text_body.to_string()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html_body.to_string()),
                ),
        )?;

        // Build SMTP transport
        let mailer = if self.config.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp_host)
        }
        .port(self.config.smtp_port);

        let mailer = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer
        };

        mailer.build().send(email).await?;

        tracing::info!(
            to = %to_email,
            subject = %subject,
            "Email sent successfully"
        );

        Ok(())
    }
}

/// Blank subjects fall back to a phrase built from the sender's name.
pub fn subject_or_default(subject: &str, name: &str) -> String {
    let subject = subject.trim();
    if subject.is_empty() {
        format!("New message from {name}")
    } else {
        subject.to_string()
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape the message body and render its newlines as line breaks.
fn message_as_html(message: &str) -> String {
    escape_html(message).replace('\n', "<br />")
}

fn render_owner_html(submission: &ContactRequest) -> String {
    let subject_row = if submission.subject.trim().is_empty() {
        String::new()
    } else {
        format!(
            "<p><strong>Subject:</strong> {}</p>\n",
            escape_html(&submission.subject)
        )
    };
    format!(
        r#"<h2>New message from the website</h2>
<p><strong>Name:</strong> {name}</p>
<p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
{subject_row}<p><strong>Message:</strong></p>
<p>{message}</p>
"#,
        name = escape_html(&submission.name),
        email = escape_html(&submission.email),
        subject_row = subject_row,
        message = message_as_html(&submission.message),
    )
}

fn render_owner_text(submission: &ContactRequest) -> String {
    format!(
        "New message from the website\n\nName: {}\nEmail: {}\nSubject: {}\n\n{}\n",
        submission.name,
        submission.email,
        subject_or_default(&submission.subject, &submission.name),
        submission.message,
    )
}

fn render_confirmation_html(submission: &ContactRequest) -> String {
    format!(
        r#"<h2>Thank you for your message, {name}!</h2>
<p>We have received your message and will get back to you shortly.</p>
<p><strong>Your message:</strong></p>
<p>{message}</p>
"#,
        name = escape_html(&submission.name),
        message = message_as_html(&submission.message),
    )
}

fn render_confirmation_text(submission: &ContactRequest) -> String {
    format!(
        "Thank you for your message, {}!\n\nWe have received your message and will get back to you shortly.\n\nYour message:\n{}\n",
        submission.name, submission.message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> ContactRequest {
        ContactRequest {
            name: "Jeanne".to_string(),
            email: "jeanne@example.com".to_string(),
            subject: String::new(),
            message: "Is the commode\nstill available?".to_string(),
            company: String::new(),
            recaptcha_token: String::new(),
        }
    }

    #[test]
    fn subject_falls_back_to_sender_name() {
        assert_eq!(subject_or_default("", "Jeanne"), "New message from Jeanne");
        assert_eq!(subject_or_default("  ", "Jeanne"), "New message from Jeanne");
        assert_eq!(subject_or_default("Commode", "Jeanne"), "Commode");
    }

    #[test]
    fn newlines_become_line_breaks_in_html() {
        let html = render_owner_html(&submission());
        assert!(html.contains("Is the commode<br />still available?"));
    }

    #[test]
    fn submitted_fields_are_html_escaped() {
        let mut s = submission();
        s.name = "<script>alert(1)</script>".to_string();
        s.message = "a < b & b > c".to_string();
        let html = render_owner_html(&s);
        assert!(!html.contains("<script>"));
        assert!(html.contains("a &lt; b &amp; b &gt; c"));
    }

    #[test]
    fn blank_subject_omits_the_subject_row() {
        let html = render_owner_html(&submission());
        assert!(!html.contains("Subject:"));

        let mut s = submission();
        s.subject = "Commode Louis XV".to_string();
        let html = render_owner_html(&s);
        assert!(html.contains("Subject:"));
    }

    #[test]
    fn unconfigured_mailer_is_disabled() {
        let mailer = ContactMailer::new(EmailConfig::default());
        assert!(!mailer.is_enabled());
    }

    #[tokio::test]
    async fn both_sends_go_through_the_outbox() {
        let outbox: Outbox = Default::default();
        let mailer = ContactMailer::recording(outbox.clone());

        let s = submission();
        mailer
            .send_owner_notification("owner@shop.test", &s)
            .await
            .unwrap();
        mailer.send_confirmation(&s).await.unwrap();

        let sent = outbox.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "owner@shop.test");
        assert_eq!(sent[0].subject, "New message from Jeanne");
        assert_eq!(sent[0].reply_to.as_deref(), Some("jeanne@example.com"));
        assert_eq!(sent[1].to, "jeanne@example.com");
    }
}
