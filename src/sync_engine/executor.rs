use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capability::HostCapability;
use crate::errors::RemoteError;
use crate::fs_writer::FileWriter;
use crate::logging::{LogLevel, LogManager};
use crate::path_validation::resolve_destination;
use crate::remote::RemoteStore;
use crate::sync_engine::inventory::find_record;
use crate::sync_engine::types::{
    FailureKind, LocalFileRecord, SyncFailure, SyncOutcome, SyncPhase, SyncPlan, SyncProgress,
};

/// Runs a [`SyncPlan`]: every upload first, then (desktop hosts only) every
/// download, one file at a time.
pub struct PlanExecutor<R> {
    remote: R,
    capability: HostCapability,
    log: Arc<LogManager>,
    session_id: Option<String>,
    busy: AtomicBool,
}

/// Clears the busy flag when an execution ends, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum DownloadStep {
    Written(PathBuf),
    NotOnServer,
}

impl<R: RemoteStore> PlanExecutor<R> {
    pub fn new(remote: R, capability: HostCapability, log: Arc<LogManager>) -> Self {
        Self {
            remote,
            capability,
            log,
            session_id: None,
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn capability(&self) -> &HostCapability {
        &self.capability
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn into_remote(self) -> R {
        self.remote
    }

    pub fn log_manager(&self) -> &Arc<LogManager> {
        &self.log
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn trace(&self, level: LogLevel, message: &str) {
        self.log.log(level, message, self.session_id.as_deref());
    }

    /// Execute `plan` against the remote store.
    ///
    /// Returns `None` without doing anything when another execution on this
    /// executor is still in flight. Per-file failures never abort the batch;
    /// they are counted and recorded in [`SyncOutcome::failures`].
    pub async fn execute(
        &self,
        plan: &SyncPlan,
        local_files: &[LocalFileRecord],
        target_dir: Option<&Path>,
        progress: impl Fn(SyncProgress),
    ) -> Option<SyncOutcome> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.trace(LogLevel::Warning, "Sync already in progress, ignoring request");
            return None;
        }
        let _guard = BusyGuard(&self.busy);

        let mut outcome = SyncOutcome::default();

        self.upload_phase(plan, local_files, &progress, &mut outcome).await;
        self.download_phase(plan, target_dir, &progress, &mut outcome).await;

        self.trace(
            LogLevel::Info,
            &format!(
                "Sync finished: {} uploaded, {} downloaded, {} skipped",
                outcome.uploaded_count, outcome.downloaded_count, outcome.skipped_count
            ),
        );

        Some(outcome)
    }

    async fn upload_phase(
        &self,
        plan: &SyncPlan,
        local_files: &[LocalFileRecord],
        progress: &impl Fn(SyncProgress),
        outcome: &mut SyncOutcome,
    ) {
        let total = plan.to_upload.len();

        for (index, name) in plan.to_upload.iter().enumerate() {
            progress(SyncProgress {
                phase: SyncPhase::Uploading,
                current_file: Some(name.clone()),
                processed_files: index,
                total_files: total,
            });

            let result = match find_record(local_files, name) {
                Some(record) => self.upload_one(record, name).await,
                None => Err(RemoteError::Other("no local file carries this name".to_string())),
            };

            match result {
                Ok(()) => {
                    outcome.uploaded_count += 1;
                    self.trace(LogLevel::Info, &format!("Uploaded {name}"));
                }
                Err(e) => {
                    outcome.skipped_count += 1;
                    self.trace(LogLevel::Warning, &format!("Failed to upload {name}: {e}"));
                    outcome.failures.push(SyncFailure {
                        name: name.clone(),
                        kind: FailureKind::Upload,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    async fn upload_one(&self, record: &LocalFileRecord, name: &str) -> Result<(), RemoteError> {
        let bytes = record
            .handle
            .read_bytes()
            .await
            .map_err(|e| RemoteError::Other(format!("failed to read local file: {e}")))?;

        self.remote.upload_file(name, &record.mime_hint, bytes).await
    }

    async fn download_phase(
        &self,
        plan: &SyncPlan,
        target_dir: Option<&Path>,
        progress: &impl Fn(SyncProgress),
        outcome: &mut SyncOutcome,
    ) {
        if plan.to_download.is_empty() {
            return;
        }

        let Some(writer) = self.capability.writer() else {
            self.trace(
                LogLevel::Info,
                &format!(
                    "{} file(s) left for manual download, host cannot write files",
                    plan.to_download.len()
                ),
            );
            return;
        };

        let Some(target_dir) = target_dir.filter(|dir| !dir.as_os_str().is_empty()) else {
            self.trace(
                LogLevel::Warning,
                "No download folder resolved from the selection, skipping downloads",
            );
            return;
        };

        let total = plan.to_download.len();

        for (index, name) in plan.to_download.iter().enumerate() {
            progress(SyncProgress {
                phase: SyncPhase::Downloading,
                current_file: Some(name.clone()),
                processed_files: index,
                total_files: total,
            });

            match self.download_one(&**writer, target_dir, name).await {
                Ok(DownloadStep::Written(_)) => {
                    outcome.downloaded_count += 1;
                    self.trace(LogLevel::Info, &format!("Downloaded {name}"));
                }
                Ok(DownloadStep::NotOnServer) => {
                    self.trace(
                        LogLevel::Debug,
                        &format!("{name} is no longer on the server, nothing to download"),
                    );
                }
                Err(failure) => {
                    self.trace(
                        LogLevel::Warning,
                        &format!("Failed to download {name}: {}", failure.message),
                    );
                    outcome.failures.push(failure);
                }
            }
        }
    }

    async fn download_one(
        &self,
        writer: &dyn FileWriter,
        target_dir: &Path,
        name: &str,
    ) -> Result<DownloadStep, SyncFailure> {
        let failure = |kind: FailureKind, message: String| SyncFailure {
            name: name.to_string(),
            kind,
            message,
        };

        // Identifiers are re-resolved per file; the listing may have moved on.
        let listing = self
            .remote
            .list_files()
            .await
            .map_err(|e| failure(FailureKind::Download, e.to_string()))?;

        let Some(record) = listing.into_iter().find(|r| r.name == name) else {
            return Ok(DownloadStep::NotOnServer);
        };

        let destination = resolve_destination(target_dir, name)
            .map_err(|message| failure(FailureKind::Write, message))?;

        let bytes = self
            .remote
            .download_file(&record.file_id)
            .await
            .map_err(|e| failure(FailureKind::Download, e.to_string()))?;

        writer
            .write_file(&destination, &bytes)
            .await
            .map_err(|e| failure(FailureKind::Write, e.message))?;

        Ok(DownloadStep::Written(destination))
    }

    /// Fetch one remote file by name into `target_dir`, outside of any plan.
    ///
    /// This is the manual download path for hosts that leave `toDownload`
    /// to the user. Returns the path that was written.
    pub async fn fetch_one(
        &self,
        writer: &dyn FileWriter,
        target_dir: &Path,
        name: &str,
    ) -> Result<PathBuf, SyncFailure> {
        match self.download_one(writer, target_dir, name).await {
            Ok(DownloadStep::Written(path)) => {
                self.trace(LogLevel::Info, &format!("Fetched {name} into {}", path.display()));
                Ok(path)
            }
            Ok(DownloadStep::NotOnServer) => Err(SyncFailure {
                name: name.to_string(),
                kind: FailureKind::Download,
                message: "no file with this name on the server".to_string(),
            }),
            Err(failure) => {
                self.trace(
                    LogLevel::Warning,
                    &format!("Failed to fetch {name}: {}", failure.message),
                );
                Err(failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::probe_host;
    use crate::sync_engine::test_support::{MemoryRemote, RecordingWriter};
    use crate::sync_engine::types::{FileHandle, SelectedFile};
    use crate::sync_engine::inventory::collect;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    fn local(files: &[(&str, &[u8])]) -> Vec<LocalFileRecord> {
        let selection = files
            .iter()
            .map(|(path, bytes)| SelectedFile::in_memory(path, bytes))
            .collect();
        collect(selection, &HostCapability::UploadOnlySync).records
    }

    fn plan_of(to_upload: &[&str], to_download: &[&str]) -> SyncPlan {
        SyncPlan {
            to_upload: to_upload.iter().map(|s| s.to_string()).collect(),
            to_download: to_download.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn full_sync(writer: Arc<RecordingWriter>) -> HostCapability {
        HostCapability::FullSync(writer)
    }

    #[tokio::test]
    async fn test_upload_failure_does_not_stop_batch() {
        let remote = MemoryRemote::default().failing_uploads(&["b.txt"]);
        let executor = PlanExecutor::new(remote, probe_host(true), Arc::new(LogManager::default()));
        let files = local(&[("f/a.txt", b"a"), ("f/b.txt", b"b")]);

        let outcome = executor
            .execute(&plan_of(&["a.txt", "b.txt"], &[]), &files, None, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.uploaded_count, 1);
        assert_eq!(outcome.skipped_count, 1);
        assert_eq!(executor.remote().uploads(), vec!["a.txt", "b.txt"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::Upload);
        assert!(outcome.failures[0].message.contains("rejected"));
    }

    #[tokio::test]
    async fn test_failure_of_first_upload_still_attempts_second() {
        let remote = MemoryRemote::default().failing_uploads(&["a.txt"]);
        let executor = PlanExecutor::new(remote, probe_host(true), Arc::new(LogManager::default()));
        let files = local(&[("f/a.txt", b"a"), ("f/b.txt", b"b")]);

        let outcome = executor
            .execute(&plan_of(&["a.txt", "b.txt"], &[]), &files, None, |_| {})
            .await
            .unwrap();

        assert_eq!((outcome.uploaded_count, outcome.skipped_count), (1, 1));
        assert_eq!(executor.remote().content("b.txt"), Some(b"b".to_vec()));
    }

    #[tokio::test]
    async fn test_missing_local_record_counts_as_skipped() {
        let executor = PlanExecutor::new(
            MemoryRemote::default(),
            probe_host(true),
            Arc::new(LogManager::default()),
        );
        let files = local(&[("f/a.txt", b"a")]);

        let outcome = executor
            .execute(&plan_of(&["a.txt", "ghost.txt"], &[]), &files, None, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.uploaded_count + outcome.skipped_count, 2);
        assert_eq!(outcome.skipped_count, 1);
        assert_eq!(executor.remote().uploads(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_duplicate_names_upload_first_match() {
        let executor = PlanExecutor::new(
            MemoryRemote::default(),
            probe_host(true),
            Arc::new(LogManager::default()),
        );
        let files = local(&[("f/one/same.txt", b"first"), ("f/two/same.txt", b"second")]);

        executor
            .execute(&plan_of(&["same.txt"], &[]), &files, None, |_| {})
            .await
            .unwrap();

        assert_eq!(executor.remote().content("same.txt"), Some(b"first".to_vec()));
    }

    #[tokio::test]
    async fn test_unreadable_local_file_is_skipped() {
        let executor = PlanExecutor::new(
            MemoryRemote::default(),
            probe_host(true),
            Arc::new(LogManager::default()),
        );
        let files = vec![LocalFileRecord {
            relative_name: "gone.txt".to_string(),
            handle: FileHandle::Disk(PathBuf::from("/definitely/not/here/gone.txt")),
            mime_hint: "text/plain".to_string(),
            size: 0,
        }];

        let outcome = executor
            .execute(&plan_of(&["gone.txt"], &[]), &files, None, |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.skipped_count, 1);
        assert!(executor.remote().uploads().is_empty());
    }

    #[tokio::test]
    async fn test_upload_only_host_never_downloads() {
        let remote = MemoryRemote::with_files(&[("old.cpp", b"int main() {}")]);
        let executor = PlanExecutor::new(remote, probe_host(true), Arc::new(LogManager::default()));

        let outcome = executor
            .execute(
                &plan_of(&[], &["old.cpp"]),
                &[],
                Some(Path::new("/tmp/target")),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 0);
        assert_eq!(executor.remote().list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(executor.remote().download_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_full_sync_without_target_dir_skips_downloads() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("old.cpp", b"x")]);
        let executor = PlanExecutor::new(remote, full_sync(writer.clone()), Arc::new(LogManager::default()));

        for target in [None, Some(Path::new(""))] {
            let outcome = executor
                .execute(&plan_of(&[], &["old.cpp"]), &[], target, |_| {})
                .await
                .unwrap();
            assert_eq!(outcome.downloaded_count, 0);
        }

        assert_eq!(executor.remote().download_calls.load(Ordering::SeqCst), 0);
        assert!(writer.written().is_empty());
    }

    #[tokio::test]
    async fn test_download_writes_into_target_dir() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("old.cpp", b"int main() {}"), ("notes.md", b"# n")]);
        let executor = PlanExecutor::new(remote, full_sync(writer.clone()), Arc::new(LogManager::default()));
        let target = PathBuf::from("/sync/target");

        let outcome = executor
            .execute(&plan_of(&[], &["old.cpp", "notes.md"]), &[], Some(&target), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 2);
        let written = writer.written();
        assert_eq!(written.get(&target.join("old.cpp")).unwrap(), b"int main() {}");
        assert_eq!(written.get(&target.join("notes.md")).unwrap(), b"# n");
        // One fresh listing per planned download.
        assert_eq!(executor.remote().list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_download_skips_names_gone_from_server() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("kept.txt", b"k")]);
        let executor = PlanExecutor::new(remote, full_sync(writer.clone()), Arc::new(LogManager::default()));

        let outcome = executor
            .execute(
                &plan_of(&[], &["deleted.txt", "kept.txt"]),
                &[],
                Some(Path::new("/sync/target")),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 1);
        assert!(outcome.failures.is_empty());
        assert_eq!(executor.remote().download_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_download_failures_are_isolated() {
        let target = PathBuf::from("/sync/target");
        let writer = Arc::new(RecordingWriter {
            fail_paths: [target.join("locked.txt")].into_iter().collect(),
            ..Default::default()
        });
        let remote = MemoryRemote::with_files(&[
            ("flaky.bin", b"f"),
            ("locked.txt", b"l"),
            ("fine.txt", b"ok"),
        ])
        .failing_downloads(&["flaky.bin"]);
        let log = Arc::new(LogManager::default());
        let executor = PlanExecutor::new(remote, full_sync(writer.clone()), log.clone());

        let outcome = executor
            .execute(
                &plan_of(&[], &["flaky.bin", "locked.txt", "fine.txt"]),
                &[],
                Some(&target),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 1);
        assert_eq!(outcome.skipped_count, 0);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].kind, FailureKind::Download);
        assert_eq!(outcome.failures[1].kind, FailureKind::Write);
        assert_eq!(outcome.failures[1].message, "permission denied");
        assert_eq!(log.get_logs_at_least(LogLevel::Warning, None).len(), 2);
        assert!(writer.written().contains_key(&target.join("fine.txt")));
    }

    #[tokio::test]
    async fn test_listing_failure_during_download_is_per_file() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("a.txt", b"a")]);
        remote.fail_list.store(true, Ordering::SeqCst);
        let executor = PlanExecutor::new(remote, full_sync(writer), Arc::new(LogManager::default()));

        let outcome = executor
            .execute(&plan_of(&[], &["a.txt", "b.txt"]), &[], Some(Path::new("/t")), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 0);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(executor.remote().list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsafe_remote_name_is_not_written() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("../escape.txt", b"x")]);
        let executor = PlanExecutor::new(remote, full_sync(writer.clone()), Arc::new(LogManager::default()));

        let outcome = executor
            .execute(&plan_of(&[], &["../escape.txt"]), &[], Some(Path::new("/t")), |_| {})
            .await
            .unwrap();

        assert_eq!(outcome.downloaded_count, 0);
        assert_eq!(outcome.failures[0].kind, FailureKind::Write);
        assert!(writer.written().is_empty());
        assert_eq!(executor.remote().download_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_uploads_complete_before_downloads_start() {
        let writer = Arc::new(RecordingWriter::default());
        let remote = MemoryRemote::with_files(&[("remote.txt", b"r")]);
        let executor = PlanExecutor::new(remote, full_sync(writer), Arc::new(LogManager::default()));
        let files = local(&[("f/one.txt", b"1"), ("f/two.txt", b"2")]);
        let phases = Mutex::new(Vec::new());

        executor
            .execute(
                &plan_of(&["one.txt", "two.txt"], &["remote.txt"]),
                &files,
                Some(Path::new("/t")),
                |p| phases.lock().unwrap().push((p.phase, p.current_file, p.processed_files)),
            )
            .await
            .unwrap();

        let phases = phases.into_inner().unwrap();
        assert_eq!(
            phases,
            vec![
                (SyncPhase::Uploading, Some("one.txt".to_string()), 0),
                (SyncPhase::Uploading, Some("two.txt".to_string()), 1),
                (SyncPhase::Downloading, Some("remote.txt".to_string()), 0),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_execute_is_noop() {
        let executor = PlanExecutor::new(
            MemoryRemote::default(),
            probe_host(true),
            Arc::new(LogManager::default()),
        );
        let files = local(&[("f/a.txt", b"a"), ("f/b.txt", b"b")]);
        let plan = plan_of(&["a.txt", "b.txt"], &[]);

        let (first, second) = tokio::join!(
            executor.execute(&plan, &files, None, |_| {}),
            executor.execute(&plan, &files, None, |_| {}),
        );

        let first = first.unwrap();
        assert!(second.is_none());
        assert_eq!(first.uploaded_count, 2);
        assert_eq!(executor.remote().uploads(), vec!["a.txt", "b.txt"]);
        assert!(!executor.is_busy());
    }

    #[tokio::test]
    async fn test_executor_reusable_after_completion() {
        let executor = PlanExecutor::new(
            MemoryRemote::default(),
            probe_host(true),
            Arc::new(LogManager::default()),
        )
        .with_session_id("s-1");
        let files = local(&[("f/a.txt", b"a")]);

        let first = executor.execute(&plan_of(&["a.txt"], &[]), &files, None, |_| {}).await;
        let second = executor.execute(&plan_of(&[], &[]), &files, None, |_| {}).await;

        assert_eq!(first.unwrap().uploaded_count, 1);
        assert_eq!(second.unwrap(), SyncOutcome::default());
        assert!(!executor.log_manager().get_logs(Some("s-1")).is_empty());
    }
}
