//! Off-thread live preview.
//!
//! Rendering a large base image can take long enough to stall gesture
//! handling, so previews run on a worker thread. Every submission bumps a
//! generation counter; frames rendered for an older generation are dropped
//! (last write wins). Renders work on an owned snapshot, so no locking of the
//! live session is needed.

use crate::compositor::Compositor;
use crate::error::{Result, StudioError};
use crate::session::DesignSessionState;
use image::RgbaImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// A finished preview render.
#[derive(Debug)]
pub struct PreviewFrame {
    pub generation: u64,
    pub result: Result<RgbaImage>,
}

struct PreviewJob {
    generation: u64,
    state: DesignSessionState,
}

/// Background preview renderer.
pub struct PreviewRenderer {
    latest: Arc<AtomicU64>,
    jobs: Option<Sender<PreviewJob>>,
    frames: Receiver<PreviewFrame>,
    worker: Option<JoinHandle<()>>,
}

impl PreviewRenderer {
    /// Spawns the worker thread.
    pub fn spawn() -> Self {
        let latest = Arc::new(AtomicU64::new(0));
        let (job_tx, job_rx) = channel::<PreviewJob>();
        let (frame_tx, frame_rx) = channel();

        let worker_latest = Arc::clone(&latest);
        let worker = thread::spawn(move || {
            while let Ok(mut job) = job_rx.recv() {
                // Skip straight to the newest queued snapshot
                while let Ok(next) = job_rx.try_recv() {
                    job = next;
                }
                if job.generation != worker_latest.load(Ordering::Acquire) {
                    continue;
                }

                let result = Compositor::render_preview(&job.state);
                if job.generation != worker_latest.load(Ordering::Acquire) {
                    trace!(generation = job.generation, "Superseded preview discarded");
                    continue;
                }
                let frame = PreviewFrame {
                    generation: job.generation,
                    result,
                };
                if frame_tx.send(frame).is_err() {
                    break;
                }
            }
            debug!("Preview worker stopped");
        });

        Self {
            latest,
            jobs: Some(job_tx),
            frames: frame_rx,
            worker: Some(worker),
        }
    }

    /// Queues a snapshot for rendering and returns its generation.
    ///
    /// # Errors
    /// Returns [`StudioError::PreviewStopped`] if the worker thread has exited.
    pub fn submit(&self, state: DesignSessionState) -> Result<u64> {
        let jobs = self.jobs.as_ref().ok_or(StudioError::PreviewStopped)?;
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        if jobs.send(PreviewJob { generation, state }).is_err() {
            warn!(generation, "Preview worker is gone, snapshot dropped");
            return Err(StudioError::PreviewStopped);
        }
        Ok(generation)
    }

    /// Generation of the most recent submission (0 before any).
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Returns the newest current frame that has arrived, if any.
    ///
    /// Never blocks. Stale frames that raced past the worker's check are
    /// dropped here.
    pub fn poll(&self) -> Option<PreviewFrame> {
        let mut newest = None;
        while let Ok(frame) = self.frames.try_recv() {
            if frame.generation == self.latest_generation() {
                newest = Some(frame);
            }
        }
        newest
    }

    /// Blocks until the frame for the latest submission arrives or `timeout`
    /// elapses.
    pub fn wait_latest(&self, timeout: Duration) -> Option<PreviewFrame> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.frames.recv_timeout(remaining) {
                Ok(frame) if frame.generation == self.latest_generation() => return Some(frame),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

impl Drop for PreviewRenderer {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
