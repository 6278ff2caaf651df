//! `vsearch backup status|restore-status <backend> <id>`.

use anyhow::{Context, Result};
use vsearch_core::backup::BackupKind;
use vsearch_core::config::ClientConfig;

use super::print_snapshot;
use crate::cli::Target;

pub async fn run_status(cfg: &ClientConfig, kind: BackupKind, target: &Target) -> Result<()> {
    let client = cfg.backup_client()?;
    let snapshot = client
        .status(kind, &target.backend, &target.id)
        .await
        .with_context(|| format!("{kind} status for {}", target.id))?;
    print_snapshot(&snapshot);
    Ok(())
}
