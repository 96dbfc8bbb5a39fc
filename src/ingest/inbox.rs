//! Directory-polling source of submissions.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{HomeworkSink, IngestionGateway};

/// Submits every file that appears in `dir`.
///
/// A file is picked up once its size is unchanged across two polls.  Files
/// already present when the watcher starts are ignored.
pub struct InboxWatcher {
    dir: PathBuf,
    gateway: IngestionGateway,
    sink: Arc<dyn HomeworkSink>,
    poll_interval: Duration,
    seen: HashSet<PathBuf>,
    pending: HashMap<PathBuf, u64>,
}

impl InboxWatcher {
    pub fn new(
        dir: PathBuf,
        gateway: IngestionGateway,
        sink: Arc<dyn HomeworkSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dir,
            gateway,
            sink,
            poll_interval,
            seen: HashSet::new(),
            pending: HashMap::new(),
        }
    }

    /// Mark the current directory contents as already handled.
    pub async fn skip_existing(&mut self) {
        for (path, _) in self.list().await {
            self.seen.insert(path);
        }
        log::debug!("ingest: ignoring {} pre-existing file(s)", self.seen.len());
    }

    pub async fn run(mut self, shutdown: CancellationToken) {
        self.skip_existing().await;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!("ingest: watching {}", self.dir.display());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.scan_once().await;
                }
                _ = shutdown.cancelled() => {
                    log::info!("ingest: shutting down");
                    break;
                }
            }
        }
    }

    /// One poll.  Returns how many files were handed to the sink.
    pub async fn scan_once(&mut self) -> usize {
        let listed = self.list().await;
        // Files removed before they settled are forgotten.
        self.pending.retain(|path, _| listed.iter().any(|(p, _)| p == path));

        let mut submitted = 0;
        for (path, size) in listed {
            if self.seen.contains(&path) {
                continue;
            }
            if self.pending.insert(path.clone(), size) != Some(size) {
                continue;
            }
            self.pending.remove(&path);
            self.seen.insert(path.clone());

            let source_id = format!("inbox:{}", path.display());
            match self.gateway.accept(&path, &source_id).await {
                Ok(submission) => {
                    let outcome = self.sink.submit(submission);
                    log::info!("ingest: {} → {outcome:?}", path.display());
                    submitted += 1;
                }
                Err(e) => log::warn!("ingest: rejected {}: {e}", path.display()),
            }
        }
        submitted
    }

    async fn list(&self) -> Vec<(PathBuf, u64)> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("ingest: cannot read {}: {e}", self.dir.display());
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.metadata().await {
                Ok(meta) if meta.is_file() => files.push((entry.path(), meta.len())),
                _ => {}
            }
        }
        files.sort();
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IngestConfig;
    use crate::ingest::SubmitOutcome;
    use crate::session::Submission;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<Submission>>);

    impl HomeworkSink for RecordingSink {
        fn submit(&self, submission: Submission) -> SubmitOutcome {
            self.0.lock().unwrap().push(submission);
            SubmitOutcome::Busy
        }
    }

    fn watcher(inbox: &std::path::Path, staging: &std::path::Path) -> (InboxWatcher, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let gateway = IngestionGateway::new(staging.to_path_buf(), &IngestConfig::default());
        (
            InboxWatcher::new(inbox.to_path_buf(), gateway, sink.clone(), Duration::from_millis(10)),
            sink,
        )
    }

    #[tokio::test]
    async fn new_files_are_submitted_once_stable() {
        let inbox = tempfile::tempdir().expect("inbox");
        let staging = tempfile::tempdir().expect("staging");
        let (mut watcher, sink) = watcher(inbox.path(), staging.path());
        watcher.skip_existing().await;

        std::fs::write(inbox.path().join("hw.pdf"), b"%PDF").unwrap();

        assert_eq!(watcher.scan_once().await, 0, "first sighting only records the size");
        assert_eq!(watcher.scan_once().await, 1);
        assert_eq!(watcher.scan_once().await, 0, "never submitted twice");
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn growing_files_wait() {
        let inbox = tempfile::tempdir().expect("inbox");
        let staging = tempfile::tempdir().expect("staging");
        let (mut watcher, _) = watcher(inbox.path(), staging.path());
        let path = inbox.path().join("hw.pdf");

        std::fs::write(&path, b"%P").unwrap();
        assert_eq!(watcher.scan_once().await, 0);
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        assert_eq!(watcher.scan_once().await, 0);
        assert_eq!(watcher.scan_once().await, 1);
    }

    #[tokio::test]
    async fn files_deleted_before_settling_are_forgotten() {
        let inbox = tempfile::tempdir().expect("inbox");
        let staging = tempfile::tempdir().expect("staging");
        let (mut watcher, sink) = watcher(inbox.path(), staging.path());
        let path = inbox.path().join("hw.pdf");

        std::fs::write(&path, b"%PDF").unwrap();
        assert_eq!(watcher.scan_once().await, 0);
        assert_eq!(watcher.pending.len(), 1);

        std::fs::remove_file(&path).unwrap();
        assert_eq!(watcher.scan_once().await, 0);
        assert!(watcher.pending.is_empty());
        assert!(sink.0.lock().unwrap().is_empty());

        // Coming back restarts the stability check.
        std::fs::write(&path, b"%PDF").unwrap();
        assert_eq!(watcher.scan_once().await, 0);
        assert_eq!(watcher.scan_once().await, 1);
    }

    #[tokio::test]
    async fn files_present_at_start_are_ignored() {
        let inbox = tempfile::tempdir().expect("inbox");
        let staging = tempfile::tempdir().expect("staging");
        std::fs::write(inbox.path().join("old.pdf"), b"%PDF").unwrap();
        let (mut watcher, sink) = watcher(inbox.path(), staging.path());

        watcher.skip_existing().await;
        watcher.scan_once().await;
        watcher.scan_once().await;

        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_files_are_not_retried() {
        let inbox = tempfile::tempdir().expect("inbox");
        let staging = tempfile::tempdir().expect("staging");
        let (mut watcher, sink) = watcher(inbox.path(), staging.path());

        std::fs::write(inbox.path().join("notes.txt"), b"hi").unwrap();
        for _ in 0..3 {
            assert_eq!(watcher.scan_once().await, 0);
        }
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
