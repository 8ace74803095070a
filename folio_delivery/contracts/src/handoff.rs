use std::future::Future;

/// Hands a `mailto:` link over to the environment, which opens the visitor's
/// mail client.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait MailHandoff: Send + Sync + 'static {
    /// Returns `false` if the environment refused to open the link.
    fn open(&self, uri: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;
}

#[cfg(feature = "mock")]
impl MockMailHandoff {
    pub fn with_open(mut self, uri: String, result: bool) -> Self {
        self.expect_open()
            .once()
            .with(mockall::predicate::eq(uri))
            .return_once(move |_| Box::pin(std::future::ready(Ok(result))));
        self
    }
}
