use std::sync::Arc;

use anyhow::{ensure, Context};
use folio_delivery_contracts::{DeliveryChannel, DeliveryError};
use folio_models::contact::FormInput;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::http::HttpClient;

const SEND_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Delivers contact messages through the EmailJS transactional email API.
#[derive(Debug, Clone)]
pub struct EmailJsDeliveryChannel {
    config: EmailJsDeliveryConfig,
    client: HttpClient,
}

#[derive(Clone)]
pub struct EmailJsDeliveryConfig {
    send_endpoint: Arc<Url>,
    service_id: Arc<str>,
    template_id: Arc<str>,
    public_key: Arc<str>,
}

impl std::fmt::Debug for EmailJsDeliveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsDeliveryConfig")
            .field("send_endpoint", &self.send_endpoint.as_str())
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"[redacted]")
            .finish()
    }
}

impl EmailJsDeliveryConfig {
    /// Fails if one of the credentials is missing or still a `YOUR_...`
    /// placeholder.
    pub fn new(
        service_id: &str,
        template_id: &str,
        public_key: &str,
        send_endpoint_override: Option<Url>,
    ) -> anyhow::Result<Self> {
        for (name, value) in [
            ("service id", service_id),
            ("template id", template_id),
            ("public key", public_key),
        ] {
            ensure!(
                !is_placeholder(value),
                "The EmailJS {name} is not configured (got {value:?})"
            );
        }

        let send_endpoint = match send_endpoint_override {
            Some(url) => url,
            None => SEND_ENDPOINT
                .parse()
                .context("Failed to parse the EmailJS send endpoint")?,
        };

        Ok(Self {
            send_endpoint: send_endpoint.into(),
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
        })
    }
}

fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with("YOUR_")
}

impl EmailJsDeliveryChannel {
    pub fn new(config: EmailJsDeliveryConfig, client: HttpClient) -> Self {
        Self { config, client }
    }
}

impl DeliveryChannel for EmailJsDeliveryChannel {
    async fn deliver(&self, input: FormInput) -> Result<(), DeliveryError> {
        let request = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: TemplateParams {
                from_name: &input.name,
                from_email: &input.email,
                message: &input.message,
            },
        };

        let response = self
            .client
            .post((*self.config.send_endpoint).clone())
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the EmailJS API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, %body, "EmailJS rejected the message");
            return Err(DeliveryError::Rejected);
        }

        debug!(%status, "EmailJS accepted the message");
        Ok(())
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    from_name: &'a str,
    from_email: &'a str,
    message: &'a str,
}
