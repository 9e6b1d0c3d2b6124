pub mod executor;
pub mod inventory;
pub mod planner;
pub mod summary;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use executor::PlanExecutor;
pub use inventory::{collect, select_folder, LocalInventory};
pub use planner::plan;
pub use summary::completion_summary;
pub use types::{
    FailureKind, FileHandle, FileId, LocalFileRecord, RemoteFileRecord, SelectedFile, SyncFailure,
    SyncOutcome, SyncPhase, SyncPlan, SyncProgress,
};
