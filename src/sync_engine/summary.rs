use crate::capability::HostCapability;
use crate::sync_engine::types::{SyncOutcome, SyncPlan};

/// End-of-run message shown to the user.
///
/// Upload-only hosts also say how many remote files are waiting to be
/// fetched by hand.
pub fn completion_summary(outcome: &SyncOutcome, plan: &SyncPlan, capability: &HostCapability) -> String {
    if capability.has_filesystem_write() {
        format!(
            "Sync complete!\nUploaded: {}\nDownloaded: {}\nSkipped: {}",
            outcome.uploaded_count, outcome.downloaded_count, outcome.skipped_count
        )
    } else {
        format!(
            "Sync complete!\nUploaded: {}\nSkipped: {}\n\n{} file(s) available to download (fetch each one with `sync-cli --fetch <name>`)",
            outcome.uploaded_count,
            outcome.skipped_count,
            plan.to_download.len()
        )
    }
}
