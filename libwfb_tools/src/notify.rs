use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::{Message, SmtpTransport, Transport};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::Config;
use super::error::NotifyError;
use super::report::Report;

static ADDRESS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.]+@[\w.]+\.[\w]+$").expect("valid pattern"));

/// An email address that passed the `local@domain.tld` shape check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(address: &str) -> Result<Self, NotifyError> {
        if ADDRESS_PATTERN.is_match(address) {
            Ok(Self(address.to_string()))
        } else {
            Err(NotifyError::InvalidAddress(address.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Split a comma separated recipient list, validating every address
pub fn parse_recipients(list: &str) -> Result<Vec<EmailAddress>, NotifyError> {
    list.split(',').map(|a| EmailAddress::parse(a.trim())).collect()
}

/// Sends reports as HTML email through an SMTP relay
#[derive(Debug, Clone)]
pub struct Mailer {
    smtp_server: String,
    from: String,
    recipients: Vec<EmailAddress>,
    css: String,
}

impl Mailer {
    pub fn new(config: &Config, recipients: Vec<EmailAddress>) -> Self {
        Self {
            smtp_server: config.smtp_server.clone(),
            from: config.from_address.clone(),
            recipients,
            css: config.email_css.clone(),
        }
    }

    /// Build the multipart message: the HTML body followed by one attachment per image
    pub fn build_message(&self, report: &Report) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.parse::<Mailbox>()?)
            .subject(report.subject.as_str());
        for recipient in &self.recipients {
            builder = builder.to(recipient.as_str().parse::<Mailbox>()?);
        }

        let png = ContentType::parse("image/png")?;
        let mut body = MultiPart::mixed().singlepart(SinglePart::html(report.to_html(&self.css)));
        for attachment in &report.attachments {
            body = body.singlepart(
                lettre::message::Attachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), png.clone()),
            );
        }

        Ok(builder.multipart(body)?)
    }

    pub fn send(&self, report: &Report) -> Result<(), NotifyError> {
        let message = self.build_message(report)?;
        let transport = SmtpTransport::builder_dangerous(&self.smtp_server).build();
        transport.send(&message)?;
        spdlog::info!(
            "Sent \"{}\" to {} recipient(s) via {}",
            report.subject,
            self.recipients.len(),
            self.smtp_server
        );
        Ok(())
    }
}

/// Where a finished report goes: an email, or the terminal when no recipients were given.
#[derive(Debug, Clone)]
pub enum Notifier {
    Email(Mailer),
    Stdout,
}

impl Notifier {
    /// Email when a recipient list is given, stdout otherwise
    pub fn from_alert(alert: Option<&str>, config: &Config) -> Result<Self, NotifyError> {
        match alert {
            Some(list) => Ok(Self::Email(Mailer::new(config, parse_recipients(list)?))),
            None => Ok(Self::Stdout),
        }
    }

    /// Report images are only worth fetching when they will be attached to an email
    pub fn wants_images(&self) -> bool {
        matches!(self, Self::Email(_))
    }

    pub fn deliver(&self, report: &Report) -> Result<(), NotifyError> {
        match self {
            Self::Email(mailer) => mailer.send(report),
            Self::Stdout => {
                println!("{}", report.to_text());
                Ok(())
            }
        }
    }
}
