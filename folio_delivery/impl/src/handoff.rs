use std::sync::Arc;

use anyhow::{ensure, Context};
use folio_delivery_contracts::handoff::MailHandoff;
use tokio::process::Command;
use tracing::debug;

/// Opens `mailto:` links by running an external opener such as `xdg-open`.
#[derive(Debug, Clone)]
pub struct CommandMailHandoff {
    program: Arc<str>,
    args: Arc<[String]>,
}

impl CommandMailHandoff {
    /// `command` is the opener program followed by its arguments. The link is
    /// passed as the last argument.
    pub fn new(command: &[String]) -> anyhow::Result<Self> {
        let (program, args) = command
            .split_first()
            .context("The mailto opener command must not be empty")?;
        ensure!(
            !program.trim().is_empty(),
            "The mailto opener program must not be blank"
        );

        Ok(Self {
            program: program.as_str().into(),
            args: args.into(),
        })
    }
}

impl MailHandoff for CommandMailHandoff {
    async fn open(&self, uri: &str) -> anyhow::Result<bool> {
        let status = Command::new(&*self.program)
            .args(&*self.args)
            .arg(uri)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("Failed to run mailto opener {:?}", self.program))?;

        debug!(program = %self.program, %status, "mailto opener exited");

        Ok(status.success())
    }
}
