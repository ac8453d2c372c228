use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Result, SaveError};
use crate::save::job::{run_save, SaveProgress, SaveReport, SaveRequest};

/// Messages from a save worker
#[derive(Debug)]
pub enum SaveEvent {
    /// The worker picked up the request
    Started,
    Progress(SaveProgress),
    Finished(Result<SaveReport>),
}

struct InFlight {
    cancel: Arc<AtomicBool>,
    events: UnboundedReceiver<SaveEvent>,
    task: JoinHandle<()>,
    progress: SaveProgress,
}

/// Runs saves on the tokio blocking pool, one at a time
///
/// `start` refuses a second save while one is in flight. The owner drives
/// completion either by calling `poll` from a UI loop or by awaiting `wait`.
pub struct SaveRunner {
    runtime: Handle,
    in_flight: Option<InFlight>,
}

impl SaveRunner {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime, in_flight: None }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Latest progress of the running save
    pub fn progress(&self) -> Option<SaveProgress> {
        self.in_flight.as_ref().map(|job| job.progress)
    }

    pub fn start(&mut self, request: SaveRequest) -> Result<()> {
        if self.is_busy() {
            warn!("Save requested while another is running");
            return Err(SaveError::AlreadyRunning.into());
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        let frames_requested = request.window.frame_count;

        let worker_cancel = Arc::clone(&cancel);
        let task = self.runtime.spawn_blocking(move || {
            let _ = tx.send(SaveEvent::Started);
            let result = run_save(&request, &worker_cancel, &|progress| {
                let _ = tx.send(SaveEvent::Progress(progress));
            });
            let _ = tx.send(SaveEvent::Finished(result));
        });

        debug!("Save worker spawned for {} frames", frames_requested);
        self.in_flight = Some(InFlight {
            cancel,
            events: rx,
            task,
            progress: SaveProgress { frames_written: 0, frames_requested },
        });
        Ok(())
    }

    /// Ask the running save to stop; the result arrives as a `Cancelled` error
    pub fn cancel(&self) {
        if let Some(job) = &self.in_flight {
            info!("Cancelling save in progress");
            job.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Drain pending events without blocking
    ///
    /// Returns the outcome once the worker finishes and frees the slot for
    /// the next save.
    pub fn poll(&mut self) -> Option<Result<SaveReport>> {
        let job = self.in_flight.as_mut()?;
        loop {
            match job.events.try_recv() {
                Ok(SaveEvent::Started) => debug!("Save worker started"),
                Ok(SaveEvent::Progress(progress)) => job.progress = progress,
                Ok(SaveEvent::Finished(result)) => {
                    self.in_flight = None;
                    return Some(result);
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.in_flight = None;
                    return Some(Err(SaveError::WorkerFailed {
                        reason: "worker exited without a result".to_string(),
                    }.into()));
                }
            }
        }
    }

    /// Await the running save, passing each progress update to `on_progress`
    pub async fn wait<F>(&mut self, mut on_progress: F) -> Option<Result<SaveReport>>
    where
        F: FnMut(SaveProgress),
    {
        let mut job = self.in_flight.take()?;
        while let Some(event) = job.events.recv().await {
            match event {
                SaveEvent::Started => debug!("Save worker started"),
                SaveEvent::Progress(progress) => {
                    job.progress = progress;
                    on_progress(progress);
                }
                SaveEvent::Finished(result) => return Some(result),
            }
        }

        let reason = match job.task.await {
            Err(e) => e.to_string(),
            Ok(()) => "worker exited without a result".to_string(),
        };
        Some(Err(SaveError::WorkerFailed { reason }.into()))
    }
}

impl Drop for SaveRunner {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::region::Region;
    use crate::save::job::TransformWindow;
    use crate::transform::TransformMode;
    use crate::video::{FrameRate, VideoMetadata};

    fn unreadable_request() -> SaveRequest {
        let frame_rate = FrameRate { num: 30, den: 1 };
        let mut config = Config::default();
        config.tools.ffmpeg = "region-fx-no-such-ffmpeg".to_string();
        SaveRequest {
            source: VideoMetadata {
                path: PathBuf::from("/nonexistent/input.mp4"),
                width: 320,
                height: 240,
                frame_rate,
                duration: Some(10.0),
                codec: "h264".to_string(),
                frame_count: None,
                has_audio: false,
            },
            window: TransformWindow::new(frame_rate, 0.0, 1.0).unwrap(),
            region: Region { start_x: 0, start_y: 0, end_x: 100, end_y: 100 },
            mode: TransformMode::Crop,
            config,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_flight_and_failure_reporting() {
        let mut runner = SaveRunner::new(Handle::current());
        runner.start(unreadable_request()).unwrap();
        assert!(runner.is_busy());
        assert_eq!(runner.progress().map(|p| p.frames_requested), Some(30));

        let second = runner.start(unreadable_request());
        assert!(matches!(second, Err(crate::error::RegionFxError::Save(SaveError::AlreadyRunning))));

        let outcome = runner.wait(|_| {}).await.unwrap();
        assert!(outcome.is_err());
        assert!(!runner.is_busy());

        // The slot is free again
        runner.start(unreadable_request()).unwrap();
        runner.cancel();
        assert!(runner.wait(|_| {}).await.unwrap().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_worker_announces_start_first() {
        let mut runner = SaveRunner::new(Handle::current());
        runner.start(unreadable_request()).unwrap();

        let job = runner.in_flight.as_mut().unwrap();
        assert!(matches!(job.events.recv().await, Some(SaveEvent::Started)));
        assert!(matches!(job.events.recv().await, Some(SaveEvent::Finished(Err(_)))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_poll_reports_completion() {
        let mut runner = SaveRunner::new(Handle::current());
        assert!(runner.poll().is_none());

        runner.start(unreadable_request()).unwrap();
        let outcome = loop {
            if let Some(outcome) = runner.poll() {
                break outcome;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        };
        assert!(outcome.is_err());
        assert!(!runner.is_busy());
    }
}
