//! CLI parse tests.

use super::{BackupCommand, Cli, CliCommand};
use clap::Parser;

pub(super) fn parse(args: &[&str]) -> BackupCommand {
    let cli = Cli::try_parse_from(args).unwrap();
    match cli.command {
        CliCommand::Backup(cmd) => cmd,
    }
}
