//! `vsearch backup cancel|restore-cancel <backend> <id>`: cancel a backup or
//! restore started earlier.

use anyhow::Result;
use vsearch_core::backup::BackupKind;
use vsearch_core::config::ClientConfig;
use vsearch_core::operation::OperationPhase;

use super::print_snapshot;
use crate::cli::Target;

pub async fn run_cancel(cfg: &ClientConfig, kind: BackupKind, target: &Target) -> Result<()> {
    let client = cfg.backup_client()?;
    let controller = client
        .attach(kind, &target.backend, &target.id)
        .await?;
    controller.cancel().await?;
    print_snapshot(&controller.current_status());
    if controller.phase() == OperationPhase::Canceled {
        println!("Cancel requested for {kind} {}", target.id);
    } else {
        println!("{kind} {} already finished; nothing to cancel", target.id);
    }
    Ok(())
}
