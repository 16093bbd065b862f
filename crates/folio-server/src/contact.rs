//! Contact form relay.
//!
//! Validates a submission, forwards it to the site owner and sends the
//! visitor an acknowledgement. Nothing is retried: a transport failure is
//! reported once and the visitor may resubmit.

use std::sync::Arc;

use folio_common::{ContactError, FieldError};
use lettre::Address;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::mailer::{Mailer, OutgoingMail};

/// Allowed name length, in characters, after trimming.
pub const NAME_LENGTH: (usize, usize) = (2, 100);

/// Allowed message length, in characters, after trimming.
pub const MESSAGE_LENGTH: (usize, usize) = (10, 1000);

const NAME_ERROR: &str = "Name must be between 2 and 100 characters";
const EMAIL_ERROR: &str = "Please provide a valid email address";
const MESSAGE_ERROR: &str = "Message must be between 10 and 1000 characters";

/// Raw form body. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactSubmission {
    /// Visitor name
    pub name: String,
    /// Visitor email
    pub email: String,
    /// Message text
    pub message: String,
}

/// A submission that passed validation, trimmed and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    /// Trimmed name
    pub name: String,
    /// Normalized email
    pub email: String,
    /// Trimmed message
    pub message: String,
}

impl ContactSubmission {
    /// Checks every field and reports all failures together.
    pub fn validate(&self) -> Result<ValidContact, ContactError> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if !within(name, NAME_LENGTH) {
            errors.push(FieldError::new("name", NAME_ERROR, name));
        }

        let email = normalize_email(&self.email);
        if email.is_none() {
            errors.push(FieldError::new("email", EMAIL_ERROR, &self.email));
        }

        let message = self.message.trim();
        if !within(message, MESSAGE_LENGTH) {
            errors.push(FieldError::new("message", MESSAGE_ERROR, message));
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ValidContact {
                name: name.to_string(),
                email,
                message: message.to_string(),
            }),
            _ => Err(ContactError::Validation(errors)),
        }
    }
}

fn within(text: &str, (min, max): (usize, usize)) -> bool {
    let length = text.chars().count();
    length >= min && length <= max
}

/// Validates an email address and returns it trimmed with the domain
/// lowercased. Returns `None` if lettre cannot parse it or the domain has no
/// alphabetic top-level label.
#[must_use]
pub fn normalize_email(raw: &str) -> Option<String> {
    let address: Address = raw.trim().parse().ok()?;
    let domain = address.domain().to_ascii_lowercase();
    let has_tld = domain
        .rsplit_once('.')
        .is_some_and(|(_, tld)| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()));
    has_tld.then(|| format!("{}@{domain}", address.user()))
}

/// Escapes text for safe inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Escapes a multi-line message and turns newlines into `<br>`.
#[must_use]
pub fn message_html(text: &str) -> String {
    escape_html(text).replace("\r\n", "\n").replace('\n', "<br>")
}

/// Relays contact submissions through a `Mailer`.
pub struct ContactRelay {
    mailer: Arc<dyn Mailer>,
    sender: String,
    recipient: String,
    owner_name: String,
}

impl std::fmt::Debug for ContactRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactRelay")
            .field("mailer", &self.mailer.name())
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("owner_name", &self.owner_name)
            .finish()
    }
}

impl ContactRelay {
    /// Creates a relay.
    ///
    /// # Arguments
    /// * `mailer` - Transport for both messages
    /// * `sender` - From address of both messages
    /// * `recipient` - Where submissions are delivered
    /// * `owner_name` - Name signed on the auto-reply
    pub fn new(
        mailer: Arc<dyn Mailer>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        owner_name: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            sender: sender.into(),
            recipient: recipient.into(),
            owner_name: owner_name.into(),
        }
    }

    /// The message delivered to the site owner.
    #[must_use]
    pub fn primary_mail(&self, contact: &ValidContact) -> OutgoingMail {
        let name = escape_html(&contact.name);
        let email = escape_html(&contact.email);
        let message = message_html(&contact.message);
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #79c1a7;">New Contact Form Submission</h2>
  <div style="background: #f5f5f5; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
    <p><strong>Message:</strong></p>
    <div style="background: white; padding: 15px; border-radius: 4px; margin-top: 10px;">{message}</div>
  </div>
  <p style="color: #666; font-size: 12px;">This message was sent from your portfolio website contact form.</p>
</div>"#
        );

        OutgoingMail {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            reply_to: Some(contact.email.clone()),
            subject: format!("Portfolio Contact Form - Message from {}", contact.name),
            html,
        }
    }

    /// The acknowledgement sent back to the visitor.
    #[must_use]
    pub fn auto_reply(&self, contact: &ValidContact) -> OutgoingMail {
        let name = escape_html(&contact.name);
        let owner = escape_html(&self.owner_name);
        let message = message_html(&contact.message);
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #79c1a7;">Thank you for reaching out!</h2>
  <p>Hi {name},</p>
  <p>Thank you for your message. I've received your inquiry and will get back to you as soon as possible, usually within 24-48 hours.</p>
  <div style="background: #f5f5f5; padding: 15px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Your message:</strong></p>
    <div style="background: white; padding: 15px; border-radius: 4px;">{message}</div>
  </div>
  <p>Best regards,<br>{owner}</p>
  <div style="border-top: 1px solid #ddd; padding-top: 15px; margin-top: 30px; color: #666; font-size: 12px;">
    <p>This is an automated response. Please don't reply to this email.</p>
  </div>
</div>"#
        );

        OutgoingMail {
            from: self.sender.clone(),
            to: contact.email.clone(),
            reply_to: None,
            subject: format!("Thank you for contacting {}", self.owner_name),
            html,
        }
    }

    /// Validates and relays a submission. Returns the id it was logged under.
    ///
    /// The auto-reply is only attempted once the primary message went out.
    pub async fn relay(&self, submission: &ContactSubmission) -> Result<Uuid, ContactError> {
        let contact = submission.validate()?;
        let id = Uuid::new_v4();

        self.mailer
            .send(&self.primary_mail(&contact))
            .await
            .map_err(|e| {
                error!(%id, "Contact form error: {e}");
                ContactError::Transport(e.to_string())
            })?;

        self.mailer
            .send(&self.auto_reply(&contact))
            .await
            .map_err(|e| {
                error!(%id, "Auto-reply failed: {e}");
                ContactError::Transport(e.to_string())
            })?;

        info!(%id, via = self.mailer.name(), "Relayed contact from {}", contact.email);
        Ok(id)
    }

    /// Checks that the mail transport is reachable.
    pub async fn health(&self) -> Result<(), ContactError> {
        self.mailer
            .verify()
            .await
            .map_err(|e| ContactError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::RecordingMailer;

    fn submission(name: &str, email: &str, message: &str) -> ContactSubmission {
        ContactSubmission {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    fn relay(mailer: Arc<RecordingMailer>) -> ContactRelay {
        ContactRelay::new(mailer, "site@example.com", "owner@example.com", "Harish D")
    }

    fn fields(err: ContactError) -> Vec<String> {
        match err {
            ContactError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            ContactError::Transport(e) => panic!("unexpected transport error: {e}"),
        }
    }

    #[test]
    fn test_short_fields_fail_together() {
        let err = submission("Jo", "a@b.com", "short")
            .validate()
            .expect_err("message too short");
        assert_eq!(fields(err), vec!["message"]);

        let err = submission("J", "nope", "hi")
            .validate()
            .expect_err("everything wrong");
        assert_eq!(fields(err), vec!["name", "email", "message"]);
    }

    #[test]
    fn test_messages_and_values() {
        let err = submission(" J ", "a@b.com", "Hello there, world")
            .validate()
            .expect_err("name too short");
        match err {
            ContactError::Validation(errors) => {
                assert_eq!(errors[0].message, "Name must be between 2 and 100 characters");
                assert_eq!(errors[0].value, "J");
            },
            ContactError::Transport(_) => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_trimmed_lengths() {
        assert!(submission("  Jo  ", "a@b.com", "  0123456789  ").validate().is_ok());
        assert!(submission("Jo", "a@b.com", "  012345678  ").validate().is_err());
        assert!(submission(&"x".repeat(101), "a@b.com", "0123456789").validate().is_err());
        assert!(submission("Jo", "a@b.com", &"y".repeat(1001)).validate().is_err());
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(submission("Zoë", "a@b.com", "héllo wörld").validate().is_ok());
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM "),
            Some("Jane.Doe@example.com".to_string())
        );
        assert_eq!(normalize_email("a@b.co"), Some("a@b.co".to_string()));
        assert_eq!(
            normalize_email("first+tag@Mail.Example.org"),
            Some("first+tag@mail.example.org".to_string())
        );
        for good in ["Jane.Doe@Example.COM", "first+tag@mail.example.org"] {
            let normalized = normalize_email(good).expect("valid");
            assert!(normalized.parse::<lettre::message::Mailbox>().is_ok(), "{normalized}");
        }
        for bad in ["", "plain", "@b.com", "a@", "a@b", "a@b.c", "a b@c.com", "a@b.c0m"] {
            assert_eq!(normalize_email(bad), None, "{bad}");
        }
    }

    #[test]
    fn test_html_is_escaped() {
        assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
        assert_eq!(message_html("line one\nline <two>"), "line one<br>line &lt;two&gt;");
    }

    #[test]
    fn test_primary_mail() {
        let relay = relay(Arc::new(RecordingMailer::new()));
        let contact = submission("Ada <Lovelace>", "ada@Example.org", "Hello\nthere, friend")
            .validate()
            .expect("valid");
        let mail = relay.primary_mail(&contact);

        assert_eq!(mail.to, "owner@example.com");
        assert_eq!(mail.from, "site@example.com");
        assert_eq!(mail.reply_to.as_deref(), Some("ada@example.org"));
        assert_eq!(mail.subject, "Portfolio Contact Form - Message from Ada <Lovelace>");
        assert!(mail.html.contains("Ada &lt;Lovelace&gt;"));
        assert!(mail.html.contains("Hello<br>there, friend"));
    }

    #[test]
    fn test_auto_reply() {
        let relay = relay(Arc::new(RecordingMailer::new()));
        let contact = submission("Ada", "ada@example.org", "Hello there, friend")
            .validate()
            .expect("valid");
        let mail = relay.auto_reply(&contact);

        assert_eq!(mail.to, "ada@example.org");
        assert_eq!(mail.subject, "Thank you for contacting Harish D");
        assert!(mail.reply_to.is_none());
        assert!(mail.html.contains("Hi Ada,"));
    }

    #[tokio::test]
    async fn test_valid_submission_sends_two_mails() {
        let mailer = Arc::new(RecordingMailer::new());
        let relay = relay(mailer.clone());
        relay
            .relay(&submission("Ada", "ada@example.org", "Hello there, friend"))
            .await
            .expect("relayed");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[1].to, "ada@example.org");
    }

    #[tokio::test]
    async fn test_invalid_submission_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::new());
        let relay = relay(mailer.clone());
        let result = relay.relay(&submission("Jo", "a@b.com", "short")).await;
        assert!(matches!(result, Err(ContactError::Validation(_))));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_primary_failure_skips_auto_reply() {
        let mailer = Arc::new(RecordingMailer::failing_after(0));
        let relay = relay(mailer.clone());
        let result = relay
            .relay(&submission("Ada", "ada@example.org", "Hello there, friend"))
            .await;
        assert!(matches!(result, Err(ContactError::Transport(_))));
        assert_eq!(mailer.sent_count(), 0);
        assert!(relay.health().await.is_err());
    }
}
