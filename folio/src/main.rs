use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use folio::ContactFormService;
use folio_config::{Config, DEFAULT_CONFIG_PATH};
use folio_models::{
    contact::FormInput,
    submission::{SubmissionFailure, SubmissionState},
};
use folio_utils::folio_version;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Command::Completion { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            env!("CARGO_BIN_NAME"),
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    folio::init_tracing();

    let config = folio_config::load(cli.config.as_slice()).context("Failed to load config")?;

    match cli.command {
        Command::Submit {
            name,
            email,
            message,
        } => {
            submit(
                &config,
                FormInput {
                    name,
                    email,
                    message,
                },
            )
            .await?
        }
        Command::CheckConfig { verbose } => {
            folio::delivery_channel(&config)?;
            verbose.then(|| println!("{config:#?}"));
        }
        Command::Completion { .. } => unreachable!(),
    }

    Ok(())
}

async fn submit(config: &Config, input: FormInput) -> anyhow::Result<()> {
    let form = folio::contact_form(config)?;

    let state = form.submit(input).await;
    let status = form.status();
    form.teardown();

    match state {
        SubmissionState::Success => {
            println!("Message sent");
            Ok(())
        }
        SubmissionState::Error(SubmissionFailure::Validation) => {
            for (field, error) in status.errors.iter() {
                eprintln!("{field}: {}", error.message);
            }
            bail!("The contact form input is invalid")
        }
        SubmissionState::Error(SubmissionFailure::Delivery) => {
            bail!("Failed to deliver the contact message")
        }
        state => bail!("Contact form ended up in unexpected state {state:?}"),
    }
}

#[derive(Debug, Parser)]
#[command(version = folio_version())]
struct Cli {
    /// Config files to load, later files take precedence
    #[arg(
        long,
        short,
        global = true,
        env = "FOLIO_CONFIG",
        value_delimiter = ':',
        default_value = DEFAULT_CONFIG_PATH
    )]
    config: Vec<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a contact message through the configured delivery channel
    #[command(aliases(["send", "s"]))]
    Submit {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
    /// Validate the config and the selected delivery channel
    CheckConfig {
        /// Print the loaded config
        #[arg(short, long)]
        verbose: bool,
    },
    /// Generate shell completions
    Completion {
        /// The shell to generate completions for
        #[clap(value_enum)]
        shell: Shell,
    },
}
