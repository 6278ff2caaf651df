//! CLI for vsearch backup and restore workflows.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use vsearch_core::backup::BackupKind;
use vsearch_core::config;

use commands::{run_cancel, run_start, run_status};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vsearch")]
#[command(about = "vsearch: backup and restore for a vector-search server", long_about = None)]
pub struct Cli {
    /// Server base URL (overrides `endpoint` in config.toml).
    #[arg(long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Create, restore, inspect or cancel backups.
    #[command(subcommand)]
    Backup(BackupCommand),
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Start a backup.
    Create {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        scope: Scope,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Restore a backup.
    Restore {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        scope: Scope,
        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Show the status of a backup.
    Status {
        #[command(flatten)]
        target: Target,
    },

    /// Show the status of a restore.
    RestoreStatus {
        #[command(flatten)]
        target: Target,
    },

    /// Cancel a running backup.
    Cancel {
        #[command(flatten)]
        target: Target,
    },

    /// Cancel a running restore.
    RestoreCancel {
        #[command(flatten)]
        target: Target,
    },
}

/// Backend and backup id.
#[derive(Debug, Args)]
pub struct Target {
    /// Storage backend (e.g. filesystem, s3, gcs, azure).
    pub backend: String,
    /// Backup identifier (lowercase letters, digits, `_` and `-`).
    pub id: String,
}

/// Collections covered by a backup or restore.
#[derive(Debug, Args)]
pub struct Scope {
    /// Only these collections (repeatable).
    #[arg(long, value_name = "COLLECTION", conflicts_with = "exclude")]
    pub include: Vec<String>,
    /// All collections except these (repeatable).
    #[arg(long, value_name = "COLLECTION")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Wait until the operation finishes. Ctrl-C cancels it on the server.
    #[arg(long)]
    pub wait: bool,
    /// Give up waiting after SECS (default from config). The operation keeps running.
    #[arg(long, value_name = "SECS", requires = "wait")]
    pub timeout: Option<u64>,
    /// Poll interval in milliseconds (default from config).
    #[arg(long, value_name = "MS", requires = "wait")]
    pub poll_ms: Option<u64>,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(endpoint) = cli.endpoint {
            cfg.endpoint = endpoint;
        }
        tracing::debug!(endpoint = %cfg.endpoint, "loaded config");

        match cli.command {
            CliCommand::Backup(cmd) => match cmd {
                BackupCommand::Create {
                    target,
                    scope,
                    wait,
                } => run_start(&cfg, BackupKind::Create, &target, &scope, &wait).await?,
                BackupCommand::Restore {
                    target,
                    scope,
                    wait,
                } => run_start(&cfg, BackupKind::Restore, &target, &scope, &wait).await?,
                BackupCommand::Status { target } => {
                    run_status(&cfg, BackupKind::Create, &target).await?
                }
                BackupCommand::RestoreStatus { target } => {
                    run_status(&cfg, BackupKind::Restore, &target).await?
                }
                BackupCommand::Cancel { target } => {
                    run_cancel(&cfg, BackupKind::Create, &target).await?
                }
                BackupCommand::RestoreCancel { target } => {
                    run_cancel(&cfg, BackupKind::Restore, &target).await?
                }
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
