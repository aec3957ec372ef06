//! dockenv CLI
//!
//! Thin front end over the `dockenv` library

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dockenv::{summarize, Client, Config, EnvError, StripMode};
use std::path::PathBuf;
use std::process::{ExitCode, Stdio};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dockenv")]
#[command(about = "Manage a named container environment")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long, env = "DOCKENV_CONFIG")]
    config: Option<PathBuf>,

    /// Docker daemon address (overrides the configuration)
    #[arg(short = 'H', long)]
    docker_host: Option<String>,

    /// Entry name rewrite for cp/ls (char-class, prefix)
    #[arg(long)]
    strip_mode: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the environment and make sure it is running
    Start { name: String },

    /// Stop the environment
    Stop { name: String },

    /// Remove the environment's container
    Rm { name: String },

    /// Stop and remove the environment
    Purge { name: String },

    /// Run a command inside the environment
    Exec {
        name: String,
        cmd: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Open an interactive shell inside the environment
    Shell {
        name: String,
        #[arg(default_value = "bash")]
        cmd: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Copy a path out of the environment as a tar archive
    Cp {
        name: String,
        path: String,
        /// Output file (stdout when omitted)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// List the entries of a path as they would be extracted
    Ls {
        name: String,
        path: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    let mut config = config.with_env()?;

    if let Some(host) = &args.docker_host {
        config.docker_host = Some(host.clone());
    }
    if let Some(mode) = &args.strip_mode {
        config.strip_mode = mode.parse::<StripMode>().map_err(anyhow::Error::msg)?;
    }
    config.validate()?;
    Ok(config)
}

fn exit_code(status: std::process::ExitStatus) -> ExitCode {
    ExitCode::from(exit_byte(status.code()))
}

/// Codes outside 0..=255 and signal deaths are reported as failure (1).
fn exit_byte(code: Option<i32>) -> u8 {
    match code.map(u8::try_from) {
        Some(Ok(code)) => code,
        _ => 1,
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = load_config(&args)?;
    let client = Client::from_config(&config)?;

    match args.command {
        Command::Start { name } => {
            client.find(&name).await?;
            info!("Environment {} is running", name);
        }
        Command::Stop { name } => {
            let env = client.find(&name).await?;
            client.stop(&env).await?;
        }
        Command::Rm { name } => {
            let env = client.find(&name).await?;
            client.remove(&env).await?;
        }
        Command::Purge { name } => {
            let env = client.find(&name).await?;
            client.purge(&env).await?;
        }
        Command::Exec { name, cmd, args } => {
            let env = client.find(&name).await?;
            let status = client
                .exec(&env, &cmd, &args)
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .context("failed to run docker exec")?;
            return Ok(exit_code(status));
        }
        Command::Shell { name, cmd, args } => {
            let env = client.find(&name).await?;
            let status = client
                .exec_interactive(&env, &cmd, &args)
                .status()
                .await
                .context("failed to run docker exec")?;
            return Ok(exit_code(status));
        }
        Command::Cp { name, path, output } => {
            let env = client.find(&name).await?;
            let archive = client.extract_path(&env, &path).await?;
            match output {
                Some(file) => {
                    tokio::fs::write(&file, &archive)
                        .await
                        .with_context(|| format!("failed to write {}", file.display()))?;
                    info!("Wrote {} bytes to {}", archive.len(), file.display());
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&archive).await?;
                    stdout.flush().await?;
                }
            }
        }
        Command::Ls { name, path, json } => {
            let env = client.find(&name).await?;
            let archive = client.extract_path(&env, &path).await?;
            let entries = summarize(archive.as_slice())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{:<9} {:>12}  {}", format!("{:?}", entry.kind), entry.size, entry.name);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(code) => Ok(code),
        Err(e) => match e.downcast_ref::<EnvError>() {
            Some(EnvError::MissingEnvironment(name)) => {
                bail!("environment {} does not exist", name)
            }
            Some(EnvError::NoSuchPath { name, path }) => {
                bail!("{} does not exist in environment {}", path, name)
            }
            _ => Err(e),
        },
    }
}
