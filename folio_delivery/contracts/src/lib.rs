use std::future::Future;

use folio_models::contact::FormInput;
use thiserror::Error;

pub mod handoff;

/// Transmits a contact message on behalf of the visitor.
///
/// Implementations make a single best-effort attempt and never retry.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait DeliveryChannel: Send + Sync + 'static {
    fn deliver(&self, input: FormInput) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("The message was not accepted for delivery.")]
    Rejected,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockDeliveryChannel {
    pub fn with_deliver(mut self, input: FormInput, result: Result<(), DeliveryError>) -> Self {
        self.expect_deliver()
            .once()
            .with(mockall::predicate::eq(input))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
