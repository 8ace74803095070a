use emailjs::EmailJsDeliveryChannel;
use folio_delivery_contracts::{DeliveryChannel, DeliveryError};
use folio_models::contact::FormInput;
use handoff::CommandMailHandoff;
use mailto::MailtoDeliveryChannel;

pub mod emailjs;
pub mod handoff;
pub mod http;
pub mod mailto;

/// The delivery channel selected in the configuration.
#[derive(Debug, Clone)]
pub enum DeliveryChannelImpl {
    Mailto(MailtoDeliveryChannel<CommandMailHandoff>),
    EmailJs(EmailJsDeliveryChannel),
}

impl DeliveryChannel for DeliveryChannelImpl {
    async fn deliver(&self, input: FormInput) -> Result<(), DeliveryError> {
        match self {
            Self::Mailto(channel) => channel.deliver(input).await,
            Self::EmailJs(channel) => channel.deliver(input).await,
        }
    }
}
