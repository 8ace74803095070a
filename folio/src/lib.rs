use anyhow::Context;
use folio_config::{Config, DeliveryChannelKind};
use folio_core_contact_impl::{ContactFormConfig, ContactFormServiceImpl};
use folio_delivery_impl::{
    emailjs::{EmailJsDeliveryChannel, EmailJsDeliveryConfig},
    handoff::CommandMailHandoff,
    http::HttpClient,
    mailto::{MailtoDeliveryChannel, MailtoDeliveryConfig},
    DeliveryChannelImpl,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use folio_core_contact_contracts::ContactFormService;

pub type ContactForm = ContactFormServiceImpl<DeliveryChannelImpl>;

/// Builds a contact form wired to the delivery channel selected in `config`.
///
/// Must be called from within a tokio runtime, the form spawns its timers on it.
pub fn contact_form(config: &Config) -> anyhow::Result<ContactForm> {
    let delivery = delivery_channel(config)?;

    let form_config = ContactFormConfig {
        error_revert_delay: config.contact.error_revert_delay.into(),
        min_send_delay: config.contact.min_send_delay.into(),
    };

    Ok(ContactFormServiceImpl::new(delivery, form_config))
}

pub fn delivery_channel(config: &Config) -> anyhow::Result<DeliveryChannelImpl> {
    match config.delivery.channel {
        DeliveryChannelKind::Mailto => {
            let handoff = CommandMailHandoff::new(&config.delivery.opener)
                .context("Failed to set up the mailto opener")?;
            let mailto_config = MailtoDeliveryConfig {
                recipient: config.contact.recipient.clone().into(),
                subject_prefix: config.contact.subject_prefix.as_str().into(),
            };

            Ok(DeliveryChannelImpl::Mailto(MailtoDeliveryChannel::new(
                handoff,
                mailto_config,
            )))
        }
        DeliveryChannelKind::EmailJs => {
            let emailjs = config
                .emailjs
                .as_ref()
                .context("The emailjs delivery channel requires an [emailjs] config section")?;
            let emailjs_config = EmailJsDeliveryConfig::new(
                &emailjs.service_id,
                &emailjs.template_id,
                &emailjs.public_key,
                emailjs.send_endpoint_override.clone(),
            )
            .context("Invalid EmailJS configuration")?;
            let client = HttpClient::new().context("Failed to build the HTTP client")?;

            Ok(DeliveryChannelImpl::EmailJs(EmailJsDeliveryChannel::new(
                emailjs_config,
                client,
            )))
        }
    }
}

/// Installs a stderr subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    #[cfg(tracing_pretty)]
    let fmt_layer = fmt_layer.pretty();

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::from_default_env()))
        .init();
}
