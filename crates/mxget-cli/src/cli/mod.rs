//! CLI for mxget.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use mxget_core::config::{self, MxConfig};
use mxget_core::Request;
use std::path::PathBuf;

use commands::{run_completions, run_config, run_get, run_probe};

/// Top-level CLI for mxget.
#[derive(Debug, Parser)]
#[command(name = "mxget")]
#[command(
    about = "mxget: fetch still images and multipart/x-mixed-replace streams over HTTP",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by every command that talks to a server.
#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// User name for digest authentication.
    #[arg(long, requires = "password")]
    pub user: Option<String>,

    /// Password for digest authentication.
    #[arg(long, requires = "user")]
    pub password: Option<String>,

    /// Extra request header line, e.g. -H "Accept: image/jpeg". Repeatable.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Largest part to buffer, in bytes (overrides max_part_bytes from config.toml).
    #[arg(long, value_name = "BYTES")]
    pub max_part_bytes: Option<usize>,
}

impl ConnectArgs {
    pub fn request(&self, cfg: &MxConfig, url: &str) -> Request {
        let mut request = Request::new(url)
            .with_max_part_bytes(self.max_part_bytes.unwrap_or(cfg.max_part_bytes));
        if let (Some(user), Some(password)) = (&self.user, &self.password) {
            request = request.with_credentials(user.as_str(), password.as_str());
        }
        for line in &self.headers {
            request = request.with_header(line.as_str());
        }
        request
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a URL once. Part 0 goes to FILE, part n to <stem>_<n>.<ext>.
    Get {
        /// HTTP/HTTPS URL of a still image or a multipart stream.
        url: String,

        /// Output file for the first part.
        file: PathBuf,

        #[command(flatten)]
        connect: ConnectArgs,

        /// Stop after N parts.
        #[arg(long, default_value = "30", value_name = "N")]
        max_parts: u64,
    },

    /// Read a stream in the background for a while and report the frame rate.
    Probe {
        /// HTTP/HTTPS URL to read from.
        url: String,

        #[command(flatten)]
        connect: ConnectArgs,

        /// How long to read, in seconds.
        #[arg(long, default_value = "10", value_name = "S")]
        seconds: u64,
    },

    /// Print the config file path and the effective configuration.
    Config,

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Get {
                url,
                file,
                connect,
                max_parts,
            } => {
                let cfg = load_config()?;
                run_get(&cfg, &connect.request(&cfg, &url), &file, max_parts)?;
            }
            CliCommand::Probe {
                url,
                connect,
                seconds,
            } => {
                let cfg = load_config()?;
                run_probe(&cfg, connect.request(&cfg, &url), seconds)?;
            }
            CliCommand::Config => run_config()?,
            CliCommand::Completions { shell } => run_completions(shell)?,
        }

        Ok(())
    }
}

fn load_config() -> Result<MxConfig> {
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
