//! Mail transport
//!
//! [`SmtpMailer`] wraps the synchronous `lettre` SMTP transport. Each send
//! opens a fresh connection, authenticates and delivers one message; there is
//! no pooling and no retry.

use crate::error::NotifyError;
use lettre::message::header::{Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

/// Port that speaks TLS from the first byte instead of STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

/// A fully rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    /// Subject line
    pub subject: String,
    /// Addresses the single message is sent to
    pub recipients: Vec<String>,
    /// Plain-text alternative
    pub text_body: String,
    /// HTML alternative
    pub html_body: String,
}

/// Something that can deliver an [`OutgoingMail`]
pub trait MailTransport: Send + Sync {
    /// Deliver one message, synchronously
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError>;
}

impl<T: MailTransport + ?Sized> MailTransport for Arc<T> {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        (**self).send(mail)
    }
}

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    /// SMTP server hostname
    pub server: String,
    /// SMTP server port
    pub port: u16,
    /// RFC 5322 "From" address
    pub sender: String,
    /// Login name
    pub username: String,
    /// Login password (app password for Gmail)
    pub password: String,
    /// Connection timeout
    pub timeout: Duration,
}

macro_rules! priority_header {
    ($ty:ident, $name:literal) => {
        #[derive(Debug, Clone)]
        struct $ty(String);

        impl Header for $ty {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($name)
            }

            fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Self(s.to_owned()))
            }

            fn display(&self) -> HeaderValue {
                HeaderValue::new(Self::name(), self.0.clone())
            }
        }
    };
}

priority_header!(XPriority, "X-Priority");
priority_header!(XMsMailPriority, "X-MSMail-Priority");
priority_header!(Importance, "Importance");

/// SMTP mail transport
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    /// Create a new mailer
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Connection settings in use
    pub fn settings(&self) -> &SmtpSettings {
        &self.settings
    }

    /// Assemble the MIME message
    pub fn build_message(&self, mail: &OutgoingMail) -> Result<Message, NotifyError> {
        if mail.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let mut builder = Message::builder()
            .from(self.settings.sender.parse::<Mailbox>()?)
            .subject(mail.subject.clone())
            .header(XPriority("1".to_string()))
            .header(XMsMailPriority("High".to_string()))
            .header(Importance("High".to_string()));

        for recipient in &mail.recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        builder
            .multipart(MultiPart::alternative_plain_html(
                mail.text_body.clone(),
                mail.html_body.clone(),
            ))
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let builder = if self.settings.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&self.settings.server)?
        } else {
            SmtpTransport::starttls_relay(&self.settings.server)?
        };

        Ok(builder
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.username.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(self.settings.timeout))
            .build())
    }
}

impl MailTransport for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        let message = self.build_message(mail)?;
        self.transport()?.send(&message)?;
        log::debug!(
            "SMTP delivery to {} via {}:{} accepted",
            mail.recipients.join(", "),
            self.settings.server,
            self.settings.port
        );
        Ok(())
    }
}
