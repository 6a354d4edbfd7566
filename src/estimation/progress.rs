//! Progress reporting while the model call is outstanding
//!
//! [`ProgressReporter`] spawns a background task that emits one notice per
//! interval until it is stopped. The only shared state is the cancellation
//! token (main flow -> task) and the append-only [`ProgressSink`].

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default interval between notices
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// How long `stop` waits for the task before aborting it
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Receives elapsed-time notices
pub trait ProgressSink: Send + Sync {
    /// Called once per elapsed interval
    fn notice(&self, elapsed: Duration);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn notice(&self, elapsed: Duration) {
        tracing::info!(
            elapsed_secs = elapsed.as_secs(),
            "Still waiting... ({}s elapsed)",
            elapsed.as_secs()
        );
    }
}

/// Handle to a running progress task
///
/// Dropping the handle cancels the task, so it never outlives the call it
/// guards even on early returns. [`ProgressReporter::stop`] additionally waits
/// for the task to finish.
pub struct ProgressReporter {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Start emitting notices every `interval`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(interval: Duration, sink: Arc<dyn ProgressSink>) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(interval, cancel.clone(), sink));
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Signal the task to stop and wait for it
    ///
    /// Idempotent: later calls return immediately.
    pub async fn stop(&mut self) {
        self.cancel.cancel();

        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
            tracing::warn!("Progress reporter did not stop in time, aborting");
            handle.abort();
        }
    }

    /// True once `stop` has been called or the handle dropped
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(interval: Duration, cancel: CancellationToken, sink: Arc<dyn ProgressSink>) {
    let mut elapsed = Duration::ZERO;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {
                if cancel.is_cancelled() {
                    break;
                }
                elapsed += interval;
                sink.notice(elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        notices: Mutex<Vec<Duration>>,
    }

    impl RecordingSink {
        fn secs(&self) -> Vec<u64> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .map(|d| d.as_secs())
                .collect()
        }
    }

    impl ProgressSink for RecordingSink {
        fn notice(&self, elapsed: Duration) {
            self.notices.lock().unwrap().push(elapsed);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_once_per_interval() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = ProgressReporter::start(DEFAULT_PROGRESS_INTERVAL, sink.clone());

        tokio::time::sleep(Duration::from_secs(12)).await;
        reporter.stop().await;

        assert_eq!(sink.secs(), vec![5, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_notice_before_first_interval() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = ProgressReporter::start(DEFAULT_PROGRESS_INTERVAL, sink.clone());

        tokio::time::sleep(Duration::from_millis(4900)).await;
        reporter.stop().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(sink.secs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let mut reporter = ProgressReporter::start(DEFAULT_PROGRESS_INTERVAL, sink.clone());

        tokio::time::sleep(Duration::from_secs(6)).await;
        reporter.stop().await;
        reporter.stop().await;
        assert!(reporter.is_stopped());

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(sink.secs(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let sink = Arc::new(RecordingSink::default());
        {
            let _reporter = ProgressReporter::start(DEFAULT_PROGRESS_INTERVAL, sink.clone());
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert!(sink.secs().is_empty());
    }
}
