//! CLI command handlers.

mod cancel;
mod start;
mod status;

pub use cancel::run_cancel;
pub use start::run_start;
pub use status::run_status;

use vsearch_core::backup::BackupSnapshot;

/// One-line summary used by every command.
fn print_snapshot(snapshot: &BackupSnapshot) {
    println!("{:<10} {:<12} {:<14} {}", "ID", "BACKEND", "STATUS", "PATH");
    println!(
        "{:<10} {:<12} {:<14} {}",
        snapshot.id,
        snapshot.backend,
        snapshot.status,
        snapshot.path.as_deref().unwrap_or("-")
    );
    if let Some(error) = snapshot.error.as_deref().filter(|e| !e.is_empty()) {
        println!("error: {error}");
    }
}
