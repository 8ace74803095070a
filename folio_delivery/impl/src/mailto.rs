use std::sync::Arc;

use anyhow::Context;
use email_address::EmailAddress;
use folio_delivery_contracts::{handoff::MailHandoff, DeliveryChannel, DeliveryError};
use folio_models::contact::FormInput;
use tracing::debug;

/// Delivers contact messages by opening the visitor's mail client with a
/// prepared `mailto:` link.
#[derive(Debug, Clone)]
pub struct MailtoDeliveryChannel<Handoff> {
    handoff: Handoff,
    config: MailtoDeliveryConfig,
}

#[derive(Debug, Clone)]
pub struct MailtoDeliveryConfig {
    pub recipient: Arc<EmailAddress>,
    pub subject_prefix: Arc<str>,
}

impl<Handoff> MailtoDeliveryChannel<Handoff> {
    pub fn new(handoff: Handoff, config: MailtoDeliveryConfig) -> Self {
        Self { handoff, config }
    }
}

impl<Handoff> DeliveryChannel for MailtoDeliveryChannel<Handoff>
where
    Handoff: MailHandoff,
{
    async fn deliver(&self, input: FormInput) -> Result<(), DeliveryError> {
        let uri = mailto_uri(&self.config, &input);
        debug!(recipient = %self.config.recipient, "handing off mailto link");

        let opened = self
            .handoff
            .open(&uri)
            .await
            .context("Failed to hand off mailto link")?;

        opened.then_some(()).ok_or(DeliveryError::Rejected)
    }
}

/// Builds the `mailto:` link for a contact message. Subject and body are
/// percent-encoded, only unreserved characters are kept as is.
pub fn mailto_uri(config: &MailtoDeliveryConfig, input: &FormInput) -> String {
    let FormInput {
        name,
        email,
        message,
    } = input;

    let subject = format!("{}: {name}", config.subject_prefix);
    let body = format!("Name: {name}\nEmail: {email}\n\nMessage:\n{message}");

    format!(
        "mailto:{}?subject={}&body={}",
        config.recipient,
        urlencoding::encode(&subject),
        urlencoding::encode(&body)
    )
}
