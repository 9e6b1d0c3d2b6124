//! Sync session context
//!
//! One session per login. It owns the current folder selection and the plan
//! derived from it; selecting a new folder discards both.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::capability::HostCapability;
use crate::errors::{Result, SyncError};
use crate::fs_writer::FileWriter;
use crate::logging::{LogLevel, LogManager};
use crate::remote::RemoteStore;
use crate::sync_engine::{
    collect, completion_summary, plan, select_folder, LocalInventory, PlanExecutor, SelectedFile,
    SyncOutcome, SyncPlan, SyncProgress,
};

pub struct SyncSession<R> {
    id: String,
    executor: PlanExecutor<R>,
    inventory: Option<LocalInventory>,
    plan: Option<SyncPlan>,
}

impl<R: RemoteStore> SyncSession<R> {
    pub fn new(remote: R, capability: HostCapability, log: Arc<LogManager>) -> Self {
        let id = format!("sync-{}", chrono::Utc::now().timestamp_millis());
        Self {
            executor: PlanExecutor::new(remote, capability, log).with_session_id(id.clone()),
            id,
            inventory: None,
            plan: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn executor(&self) -> &PlanExecutor<R> {
        &self.executor
    }

    pub fn capability(&self) -> &HostCapability {
        self.executor.capability()
    }

    pub fn inventory(&self) -> Option<&LocalInventory> {
        self.inventory.as_ref()
    }

    pub fn plan(&self) -> Option<&SyncPlan> {
        self.plan.as_ref()
    }

    fn trace(&self, level: LogLevel, message: &str) {
        self.executor.log_manager().log(level, message, Some(&self.id));
    }

    fn replace_inventory(&mut self, inventory: LocalInventory) -> &LocalInventory {
        self.trace(
            LogLevel::Info,
            &format!("Selected {} local file(s)", inventory.records.len()),
        );
        self.plan = None;
        self.inventory.insert(inventory)
    }

    /// Replace the selection with files handed over by a picker.
    pub fn select(&mut self, selection: Vec<SelectedFile>) -> &LocalInventory {
        let inventory = collect(selection, self.executor.capability());
        self.replace_inventory(inventory)
    }

    /// Replace the selection with the contents of `root`.
    ///
    /// The folder itself is the download target when none of its files
    /// could provide one.
    pub fn select_folder(&mut self, root: &Path, exclude_patterns: &[String]) -> Result<&LocalInventory> {
        let selection = select_folder(root, exclude_patterns)?;
        let mut inventory = collect(selection, self.executor.capability());

        if inventory.target_dir.is_none() && self.executor.capability().has_filesystem_write() {
            inventory.target_dir = Some(root.canonicalize()?);
        }

        Ok(self.replace_inventory(inventory))
    }

    /// Fetch the remote listing and plan against the current selection.
    ///
    /// On failure no plan is retained.
    pub async fn analyze(&mut self) -> Result<&SyncPlan> {
        self.plan = None;

        let local_names = self
            .inventory
            .as_ref()
            .ok_or_else(|| SyncError::InvalidSelection("No folder selected".to_string()))?
            .names();

        let remote_names = self.remote_names().await?;

        let sync_plan = plan(&local_names, &remote_names);
        self.trace(
            LogLevel::Info,
            &format!(
                "Planned {} upload(s) and {} download(s)",
                sync_plan.to_upload.len(),
                sync_plan.to_download.len()
            ),
        );

        Ok(self.plan.insert(sync_plan))
    }

    /// Execute the current plan. `Ok(None)` means a run was already in flight.
    pub async fn start(&self, progress: impl Fn(SyncProgress)) -> Result<Option<SyncOutcome>> {
        let plan = self.plan.as_ref().ok_or(SyncError::NoPlan)?;
        let inventory = self.inventory.as_ref().ok_or(SyncError::NoPlan)?;

        Ok(self
            .executor
            .execute(
                plan,
                &inventory.records,
                inventory.target_dir.as_deref(),
                progress,
            )
            .await)
    }

    /// Names currently in the remote workspace, in server order.
    pub async fn remote_names(&self) -> Result<Vec<String>> {
        Ok(self
            .executor
            .remote()
            .list_files()
            .await
            .map_err(SyncError::RemoteList)?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Download one remote file into `dest_dir` through `writer`.
    ///
    /// Works on every host, including upload-only ones, since the caller
    /// supplies the writer and the destination.
    pub async fn fetch_one(&self, name: &str, dest_dir: &Path, writer: &dyn FileWriter) -> Result<PathBuf> {
        self.executor
            .fetch_one(writer, dest_dir, name)
            .await
            .map_err(|failure| SyncError::Fetch {
                name: failure.name,
                message: failure.message,
            })
    }

    /// End the session and hand back the remote store.
    pub fn into_remote(self) -> R {
        self.executor.into_remote()
    }

    pub fn summary(&self, outcome: &SyncOutcome) -> Option<String> {
        self.plan
            .as_ref()
            .map(|plan| completion_summary(outcome, plan, self.executor.capability()))
    }
}
