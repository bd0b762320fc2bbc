//! [`RefillController`] – the refill control loop.
//!
//! Owns the run/stop state machine and a single background task that keeps
//! repeating one refill cycle:
//!
//! 1. **Warm up** – capture and discard [`RefillConfig::warmup_frames`]
//!    frames so the classified frame is not a stale buffered one.
//! 2. **Sample** – capture the frame to classify.
//! 3. **Classify** – ask the classifier for its top result.
//! 4. **Decide** – apply [`decide`] with the configured threshold.
//! 5. **Act** – when a refill is required, run the motor once.
//! 6. **Pace** – wait [`RefillConfig::pacing_delay`], then yield to the
//!    scheduler before the next cycle.
//!
//! # Failure isolation
//!
//! Each cycle returns an explicit `Result<CycleOutcome, CycleError>`.  Device
//! errors ([`CycleError::Device`]) are logged and the loop carries on after
//! the pacing delay.  Only [`CycleError::Cancelled`] ends the task.
//!
//! # Cancellation
//!
//! Every task gets its own one-shot stop signal (a `watch` channel).  Captures,
//! classification and pacing race against it and are abandoned as soon as it
//! fires.  A motor run that has already been issued is awaited to completion:
//! the signal is checked immediately before issuing it instead, so no new run
//! can start once stop has been requested.  Dropping the controller drops the
//! signal's sender, which the task also treats as a stop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use refill_hal::Devices;
use refill_types::RefillError;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, error, info, info_span};

use crate::commands::LoopControl;
use crate::config::RefillConfig;
use crate::policy::decide;

/// Number of results requested from the classifier per cycle.
pub const TOP_K: usize = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Public types
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a [`RefillController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No loop task exists, or the last one has terminated.
    Idle,
    /// A loop task is running cycles.
    Running,
    /// Stop was requested; the task has not terminated yet.
    StopRequested,
}

/// What a completed cycle decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The motor was run once.
    Refilled,
    /// The classifier returned results, none of which required a refill.
    NotEmpty,
    /// The classifier returned no results at all.
    NoClassifications,
}

/// Why a cycle did not complete.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The stop signal fired.  Not a failure: the loop task exits.
    #[error("refill cycle cancelled")]
    Cancelled,
    /// A device call failed.  The loop continues with the next cycle.
    #[error(transparent)]
    Device(#[from] RefillError),
}

// ─────────────────────────────────────────────────────────────────────────────
// RefillController
// ─────────────────────────────────────────────────────────────────────────────

struct LoopTask {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl LoopTask {
    fn state(&self) -> LoopState {
        if self.handle.is_finished() {
            LoopState::Idle
        } else if *self.stop_tx.borrow() {
            LoopState::StopRequested
        } else {
            LoopState::Running
        }
    }
}

/// The refill control loop engine.
///
/// `start` and `stop` are idempotent and never fail, so they are safe to call
/// from any command handler.  Both must be called from within a Tokio
/// runtime.
pub struct RefillController {
    config: Arc<RefillConfig>,
    devices: Devices,
    task: Mutex<Option<LoopTask>>,
    cycles: Arc<AtomicU64>,
}

impl RefillController {
    pub fn new(config: RefillConfig, devices: Devices) -> Self {
        Self {
            config: Arc::new(config),
            devices,
            task: Mutex::new(None),
            cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &RefillConfig {
        &self.config
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.lock_task()
            .as_ref()
            .map_or(LoopState::Idle, LoopTask::state)
    }

    /// Number of cycles that ran to the end, failed ones included.
    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Acquire)
    }

    /// Spawn the loop task unless one is already running.
    ///
    /// Returns `true` when a new task was spawned.  If a previous task is
    /// still winding down after a stop, the new task joins it before running
    /// its first cycle, so two tasks never drive the devices at once.
    pub fn start(&self) -> bool {
        let mut slot = self.lock_task();
        if slot.as_ref().map(LoopTask::state) == Some(LoopState::Running) {
            debug!("refill loop already running");
            return false;
        }

        let previous = slot.take().map(|task| task.handle);
        let (stop_tx, stop_rx) = watch::channel(false);
        let runner = LoopRunner {
            config: Arc::clone(&self.config),
            devices: self.devices.clone(),
            stop: stop_rx,
            cycles: Arc::clone(&self.cycles),
        };

        let handle = tokio::spawn(
            async move {
                if let Some(previous) = previous {
                    let _ = previous.await;
                }
                runner.run().await;
            }
            .instrument(info_span!("refill_loop")),
        );

        *slot = Some(LoopTask { stop_tx, handle });
        info!("refill loop started");
        true
    }

    /// Signal the running loop to stop.
    ///
    /// Returns `true` when a running loop was signalled; a no-op otherwise.
    /// The task terminates at its next suspension point; use
    /// [`shutdown`][Self::shutdown] to wait for it.
    pub fn stop(&self) -> bool {
        let slot = self.lock_task();
        match slot.as_ref() {
            Some(task) if task.state() == LoopState::Running => {
                task.stop_tx.send_replace(true);
                info!("refill loop stop requested");
                true
            }
            _ => false,
        }
    }

    /// Stop the loop and wait for its task to terminate.
    pub async fn shutdown(&self) {
        let task = self.lock_task().take();
        let Some(task) = task else {
            return;
        };
        task.stop_tx.send_replace(true);
        if let Err(e) = task.handle.await
            && e.is_panic()
        {
            error!(error = %e, "refill loop task panicked");
        }
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<LoopTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LoopControl for RefillController {
    fn start(&self) -> bool {
        RefillController::start(self)
    }

    fn stop(&self) -> bool {
        RefillController::stop(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop task
// ─────────────────────────────────────────────────────────────────────────────

/// State owned by one loop task.
struct LoopRunner {
    config: Arc<RefillConfig>,
    devices: Devices,
    stop: watch::Receiver<bool>,
    cycles: Arc<AtomicU64>,
}

impl LoopRunner {
    async fn run(self) {
        let mut cycle: u64 = 0;
        loop {
            if self.stop_requested() {
                break;
            }
            cycle += 1;

            match self
                .run_cycle()
                .instrument(debug_span!("refill_cycle", cycle))
                .await
            {
                Ok(outcome) => debug!(cycle, ?outcome, "refill cycle complete"),
                Err(CycleError::Device(e)) => error!(cycle, error = %e, "refill cycle failed"),
                Err(CycleError::Cancelled) => break,
            }
            self.cycles.fetch_add(1, Ordering::AcqRel);

            if self
                .cancellable(tokio::time::sleep(self.config.pacing_delay))
                .await
                .is_err()
            {
                break;
            }
            tokio::task::yield_now().await;
        }
        info!(cycles = cycle, "refill loop stopped");
    }

    /// One warm-up → sample → classify → decide → act sequence.
    async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let Devices {
            camera,
            vision,
            motor,
        } = &self.devices;

        for _ in 0..self.config.warmup_frames {
            self.cancellable(camera.capture()).await??;
        }
        let image = self.cancellable(camera.capture()).await??;

        let classifications = self.cancellable(vision.classify(&image, TOP_K)).await??;
        if classifications.is_empty() {
            debug!("no classifications found");
        }

        if !decide(&classifications, self.config.confidence_level) {
            return Ok(if classifications.is_empty() {
                CycleOutcome::NoClassifications
            } else {
                CycleOutcome::NotEmpty
            });
        }

        // A result that lands after stop must not move the motor.
        if self.stop_requested() {
            return Err(CycleError::Cancelled);
        }
        info!(
            speed = self.config.actuator_speed,
            revolutions = self.config.actuator_revolutions,
            "refill required"
        );
        motor
            .go_for(self.config.actuator_speed, self.config.actuator_revolutions)
            .await?;
        Ok(CycleOutcome::Refilled)
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow() || self.stop.has_changed().is_err()
    }

    /// Drive `fut` to completion unless the stop signal fires first.
    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, CycleError> {
        let mut stop = self.stop.clone();
        // A dropped sender counts as a stop.
        let stopped = async move {
            let _ = stop.wait_for(|stopped| *stopped).await;
        };
        tokio::select! {
            biased;
            () = stopped => Err(CycleError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
