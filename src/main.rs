//! cloudshelf - Browse object storage as folders and manage compute instances.
//!
//! Usage:
//!   cloudshelf                         Launch the interactive shell
//!   cloudshelf buckets                 List buckets
//!   cloudshelf ls BUCKET [PREFIX]      List a folder
//!   cloudshelf rm BUCKET KEY           Delete an object
//!   cloudshelf instances               List instances
//!   cloudshelf start|stop|terminate ID Change instance state
//!   cloudshelf --help                  Show help

mod render;
mod shell;

use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail, eyre};
use serde::Serialize;
use tracing::Level;

use cloudshelf_core::{ClientConfig, InstanceAction, path};
use cloudshelf_gateway::{HttpGateway, RemoteGateway};
use cloudshelf_session::{Session, Settings, Update};

#[derive(Parser)]
#[command(
    name = "cloudshelf",
    version,
    about = "Browse object storage buckets as folders and manage compute instances",
    long_about = "cloudshelf talks to the cloud manager REST backend.\n\n\
                  Run without a subcommand for the interactive shell, or use \
                  subcommands for one-shot operations."
)]
struct Cli {
    /// Backend REST endpoint (overrides the settings file)
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Do not ask for confirmation before destructive actions
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check that the backend is reachable
    Health,

    /// List buckets
    Buckets {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the folders and files under a prefix
    Ls {
        bucket: String,

        /// Folder prefix (defaults to the bucket root)
        #[arg(default_value = "")]
        prefix: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete an object
    Rm { bucket: String, key: String },

    /// Delete an empty folder
    Rmdir { bucket: String, prefix: String },

    /// Delete an empty bucket
    Rb { bucket: String },

    /// List instances (terminated ones are hidden)
    Instances {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Start a stopped instance
    Start { id: String },

    /// Stop a running instance
    Stop { id: String },

    /// Terminate an instance
    Terminate { id: String },

    /// List VPCs
    Vpcs {
        /// Match name or id (case-insensitive) or CIDR block
        #[arg(short = 'F', long)]
        filter: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Interactive shell (the default)
    Browse,

    /// Show the effective settings
    Config {
        /// Write them to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::load();
    settings.client = client_config(&cli, &settings)?;
    let assume_yes = cli.yes || !settings.confirm_destructive;

    if let Some(Command::Config { save }) = cli.command {
        return run_config(&settings, save);
    }

    let gateway = HttpGateway::new(&settings.client)?;
    let session = Session::new(gateway, settings.client.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(dispatch(cli.command, session, assume_yes));
    rt.shutdown_timeout(std::time::Duration::from_millis(100));
    result
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Settings with command-line overrides applied.
fn client_config(cli: &Cli, settings: &Settings) -> Result<ClientConfig> {
    let base = &settings.client;
    ClientConfig::builder()
        .base_url(cli.endpoint.clone().unwrap_or_else(|| base.base_url.clone()))
        .timeout_ms(cli.timeout.unwrap_or(base.timeout_ms))
        .refetch_delay_ms(base.refetch_delay_ms)
        .build()
        .map_err(|e| eyre!("{e}"))
        .context("Invalid client configuration")
}

async fn dispatch(
    command: Option<Command>,
    mut session: Session<HttpGateway>,
    assume_yes: bool,
) -> Result<()> {
    match command {
        None | Some(Command::Browse) => shell::run(session).await,
        Some(Command::Health) => {
            let health = session.gateway().health().await?;
            println!("{} - {}", health.status, health.message);
            Ok(())
        }
        Some(Command::Buckets { format }) => {
            session.load_containers();
            settle(&mut session).await?;
            emit(format, session.view().containers(), render::print_containers)
        }
        Some(Command::Ls {
            bucket,
            prefix,
            format,
        }) => {
            open(&mut session, &bucket, &prefix).await?;
            emit(format, session.view().listing(), |listing| {
                render::print_listing(&bucket, listing)
            })
        }
        Some(Command::Rm { bucket, key }) => {
            open(&mut session, &bucket, &path::parent_of(&key)).await?;
            let id = session.request_delete_file(path::leaf_name(&key))?;
            confirm_and_run(&mut session, id, assume_yes).await
        }
        Some(Command::Rmdir { bucket, prefix }) => {
            let prefix = path::normalize_prefix(&prefix);
            open(&mut session, &bucket, &path::parent_of(&prefix)).await?;
            let id = session.request_delete_folder(path::leaf_name(&prefix))?;
            confirm_and_run(&mut session, id, assume_yes).await
        }
        Some(Command::Rb { bucket }) => {
            session.load_containers();
            settle(&mut session).await?;
            let id = session.request_delete_bucket(&bucket)?;
            confirm_and_run(&mut session, id, assume_yes).await
        }
        Some(Command::Instances { format }) => {
            session.load_instances();
            settle(&mut session).await?;
            emit(format, session.board().instances(), |_| {
                render::print_instances(session.board())
            })
        }
        Some(Command::Start { id }) => {
            instance_action(&mut session, &id, InstanceAction::Start, assume_yes).await
        }
        Some(Command::Stop { id }) => {
            instance_action(&mut session, &id, InstanceAction::Stop, assume_yes).await
        }
        Some(Command::Terminate { id }) => {
            instance_action(&mut session, &id, InstanceAction::Terminate, assume_yes).await
        }
        Some(Command::Vpcs { filter, format }) => {
            session.load_vpcs();
            settle(&mut session).await?;
            let vpcs = session.vpcs_matching(filter.as_deref().unwrap_or(""));
            emit(format, &vpcs, |vpcs| render::print_vpcs(vpcs))
        }
        Some(Command::Config { .. }) => Ok(()),
    }
}

/// Wait for in-flight calls and turn a reported failure into an error.
async fn settle<G: RemoteGateway>(session: &mut Session<G>) -> Result<()> {
    session.settle().await;
    if let Some(banner) = session.banner() {
        bail!("{banner}");
    }
    Ok(())
}

/// Open `bucket` and navigate to `prefix`.
async fn open<G: RemoteGateway>(session: &mut Session<G>, bucket: &str, prefix: &str) -> Result<()> {
    session.load_containers();
    settle(session).await?;
    session.open_container(bucket)?;
    settle(session).await?;
    session.jump_to(prefix)?;
    settle(session).await?;
    Ok(())
}

async fn instance_action<G: RemoteGateway>(
    session: &mut Session<G>,
    id: &str,
    action: InstanceAction,
    assume_yes: bool,
) -> Result<()> {
    session.load_instances();
    settle(session).await?;
    let request = session.request_instance_action(id, action)?;
    confirm_and_run(session, request, assume_yes).await?;

    if let Some(instance) = session.board().get(id) {
        render::print_instance(instance);
        println!(" {action} requested; the state will change shortly.");
    } else {
        println!(" {id} terminated.");
    }
    Ok(())
}

async fn confirm_and_run<G: RemoteGateway>(
    session: &mut Session<G>,
    id: cloudshelf_ops::ActionId,
    assume_yes: bool,
) -> Result<()> {
    if !assume_yes {
        let Some(action) = session.gate().pending() else {
            bail!("Nothing to confirm");
        };
        render::print_pending(action);
        if !ask_yes_no("Proceed?")? {
            session.cancel(id)?;
            eprintln!("Cancelled.");
            return Ok(());
        }
    }
    session.confirm(id)?;
    let updates = session.settle().await;
    if updates.contains(&Update::Deleted) {
        eprintln!("Deleted.");
    }
    if let Some(banner) = session.banner() {
        bail!("{banner}");
    }
    Ok(())
}

fn ask_yes_no(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Print `value` as JSON or through `text`.
fn emit<T: Serialize + ?Sized>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn run_config(settings: &Settings, save: bool) -> Result<()> {
    println!("{}", toml::to_string_pretty(settings)?);
    if save {
        let path = settings.save().context("Failed to save settings")?;
        eprintln!("Saved to {}", path.display());
    } else if let Some(path) = Settings::config_path() {
        eprintln!("Settings file: {}", path.display());
    }
    Ok(())
}
