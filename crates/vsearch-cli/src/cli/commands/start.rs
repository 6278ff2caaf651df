//! `vsearch backup create|restore`: start the operation, optionally wait for it.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use vsearch_core::backup::{BackupKind, BackupOperation, BackupRequest, BackupSnapshot};
use vsearch_core::config::ClientConfig;
use vsearch_core::operation::{OperationController, OperationError};

use super::print_snapshot;
use crate::cli::{Scope, Target, WaitArgs};

pub async fn run_start(
    cfg: &ClientConfig,
    kind: BackupKind,
    target: &Target,
    scope: &Scope,
    wait: &WaitArgs,
) -> Result<()> {
    let client = cfg.backup_client()?;
    let request = BackupRequest::new(&target.id)
        .include(scope.include.iter().cloned())
        .exclude(scope.exclude.iter().cloned());

    let controller = match kind {
        BackupKind::Create => client.start_backup(&target.backend, &request).await,
        BackupKind::Restore => client.start_restore(&target.backend, &request).await,
    }
    .with_context(|| format!("starting {kind} {}", target.id))?
    .with_retry_policy(cfg.retry_policy()?);

    print_snapshot(&controller.current_status());
    if !wait.wait {
        return Ok(());
    }

    let poll = wait
        .poll_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.poll_interval());
    let timeout = wait
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| cfg.wait_timeout());
    println!("Waiting for {kind} {} (Ctrl-C to cancel)...", target.id);

    match wait_or_cancel(&controller, poll, timeout).await {
        Ok(snapshot) => {
            print_snapshot(&snapshot);
            println!("{kind} {} completed", target.id);
            Ok(())
        }
        Err(OperationError::TimedOut { timeout }) => bail!(
            "{kind} {} still running after {}s; check later with `vsearch backup {}status`",
            target.id,
            timeout.as_secs(),
            if kind == BackupKind::Restore { "restore-" } else { "" }
        ),
        Err(e) => Err(e).with_context(|| format!("{kind} {}", target.id)),
    }
}

/// Waits for success; Ctrl-C requests remote cancel and then lets the wait observe it.
async fn wait_or_cancel(
    controller: &OperationController<BackupOperation>,
    poll: Duration,
    timeout: Duration,
) -> Result<BackupSnapshot, OperationError> {
    let wait = controller.wait_for_success(poll, timeout);
    tokio::pin!(wait);
    tokio::select! {
        res = &mut wait => return res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted, canceling...");
            if let Err(e) = controller.cancel().await {
                tracing::warn!(error = %e, "cancel request failed");
                eprintln!("warning: {e}");
            }
        }
    }
    wait.await
}
