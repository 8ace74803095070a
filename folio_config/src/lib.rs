use std::path::Path;

use anyhow::Context;
use config::{File, FileFormat};
pub use duration::Duration;
use email_address::EmailAddress;
use serde::Deserialize;
use url::Url;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

pub fn load(paths: &[impl AsRef<Path>]) -> anyhow::Result<Config> {
    load_with_override(paths, &[])
}

/// Loads the given config files in order and applies the inline toml
/// `overrides` on top of them. Later sources take precedence.
pub fn load_with_override(
    paths: &[impl AsRef<Path>],
    overrides: &[&str],
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?;

    overrides
        .iter()
        .fold(builder, |builder, &content| {
            builder.add_source(File::from_str(content, FileFormat::Toml))
        })
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub contact: ContactConfig,
    pub delivery: DeliveryConfig,
    pub emailjs: Option<EmailJsConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    /// Address that receives the contact messages.
    pub recipient: EmailAddress,
    pub subject_prefix: String,
    /// How long the error state is shown before the form returns to idle.
    pub error_revert_delay: Duration,
    /// Minimum time spent in the sending state.
    pub min_send_delay: Duration,
}

#[derive(Debug, Deserialize)]
pub struct DeliveryConfig {
    pub channel: DeliveryChannelKind,
    /// Command used to hand `mailto:` links to the operating environment. The
    /// link is appended as the last argument.
    pub opener: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannelKind {
    Mailto,
    EmailJs,
}

#[derive(Debug, Deserialize)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub send_endpoint_override: Option<Url>,
}
