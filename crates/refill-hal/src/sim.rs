//! In-process simulated devices for demos and headless testing.
//!
//! [`SimRegistry`] builds a [`DeviceRegistry`] pre-populated with stub
//! drivers that return plausible data and record every command.  This lets
//! the full refill stack run in tests, CI pipelines and the CLI demo without
//! a camera, a vision model or a motor attached.
//!
//! # Stub behaviour
//!
//! | Driver | Stub behaviour |
//! |---|---|
//! | [`SimCamera`] | Returns a blank 4×4 greyscale [`Image`]; optionally fails every *n*-th capture. |
//! | [`SimClassifier`] | Returns one scripted [`Classification`] (changeable at runtime). |
//! | [`SimMotor`] | Counts every `go_for` call and keeps the most recent ones; always succeeds. |
//!
//! # Example
//!
//! ```rust
//! use refill_hal::sim::SimRegistry;
//!
//! let registry = SimRegistry::new()
//!     .with_camera("cam")
//!     .with_classifier("vision", "empty", 0.8)
//!     .with_motor("motor")
//!     .build();
//!
//! assert!(registry.resolve("cam", "vision", "motor").is_ok());
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use refill_types::{Classification, Image, RefillError};
use tracing::debug;

use crate::actuator::Actuator;
use crate::camera::ImageSource;
use crate::registry::DeviceRegistry;
use crate::vision::Classifier;

// ────────────────────────────────────────────────────────────────────────────
// Stub camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera that returns a blank (all-zero) 4×4 greyscale frame.
pub struct SimCamera {
    name: String,
    captures: AtomicU64,
    /// When non-zero, every `fail_every`-th capture returns an error.
    fail_every: u64,
}

impl SimCamera {
    /// Create a simulated camera that always succeeds.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::failing_every(name, 0)
    }

    /// Create a simulated camera whose every `n`-th capture fails.
    /// `n == 0` disables failures.
    pub fn failing_every(name: impl Into<String>, n: u64) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            captures: AtomicU64::new(0),
            fail_every: n,
        })
    }

    /// Number of capture attempts so far, failed ones included.
    pub fn capture_count(&self) -> u64 {
        self.captures.load(Ordering::Acquire)
    }
}

#[async_trait]
impl ImageSource for SimCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn capture(&self) -> Result<Image, RefillError> {
        let n = self.captures.fetch_add(1, Ordering::AcqRel) + 1;
        if self.fail_every != 0 && n % self.fail_every == 0 {
            return Err(RefillError::Capture {
                component: self.name.clone(),
                details: format!("simulated failure on capture #{n}"),
            });
        }
        Ok(Image {
            width: 4,
            height: 4,
            data: vec![0u8; 16],
            mime_type: "image/x-raw-gray".to_string(),
            captured_at: Utc::now(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub classifier
// ────────────────────────────────────────────────────────────────────────────

/// A simulated classifier that answers every request with one scripted
/// result.
pub struct SimClassifier {
    name: String,
    result: Mutex<Option<Classification>>,
}

impl SimClassifier {
    /// Create a classifier that always reports `label` at `confidence`.
    pub fn new(name: impl Into<String>, label: impl Into<String>, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            result: Mutex::new(Some(Classification::new(label, confidence))),
        })
    }

    /// Replace the scripted answer.  `None` makes the classifier return no
    /// results at all.
    pub fn set_result(&self, result: Option<Classification>) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = result;
    }
}

#[async_trait]
impl Classifier for SimClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(
        &self,
        _image: &Image,
        top_k: usize,
    ) -> Result<Vec<Classification>, RefillError> {
        let result = self
            .result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(result.into_iter().take(top_k).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub motor
// ────────────────────────────────────────────────────────────────────────────

/// Number of `(rpm, revolutions)` commands a [`SimMotor`] keeps.
pub const SIM_MOTOR_HISTORY: usize = 256;

/// A simulated motor that records `(rpm, revolutions)` commands.
/// Always succeeds.
///
/// Only the last [`SIM_MOTOR_HISTORY`] commands are kept, so a long-running
/// demo does not grow without bound; [`call_count`][Self::call_count] still
/// counts all of them.
pub struct SimMotor {
    name: String,
    call_count: AtomicU64,
    calls: Mutex<VecDeque<(f64, f64)>>,
}

impl SimMotor {
    /// Create a new simulated motor with the given name.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            call_count: AtomicU64::new(0),
            calls: Mutex::new(VecDeque::with_capacity(SIM_MOTOR_HISTORY)),
        })
    }

    /// The most recent commands, oldest first.
    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    /// Total number of commands received.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Actuator for SimMotor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn go_for(&self, rpm: f64, revolutions: f64) -> Result<(), RefillError> {
        debug!(motor = %self.name, rpm, revolutions, "sim motor go_for");
        self.call_count.fetch_add(1, Ordering::AcqRel);
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        if calls.len() == SIM_MOTOR_HISTORY {
            calls.pop_front();
        }
        calls.push_back((rpm, revolutions));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRegistry builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder that constructs a [`DeviceRegistry`] pre-populated with simulated
/// devices.
///
/// Call the `with_*` methods to add the simulated devices you need, then
/// call [`build`][Self::build] to obtain the registry.
#[derive(Default)]
pub struct SimRegistry {
    registry: DeviceRegistry,
}

impl SimRegistry {
    /// Create an empty [`SimRegistry`] builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`SimCamera`] that never fails.
    pub fn with_camera(self, name: impl Into<String>) -> Self {
        self.with_camera_driver(SimCamera::new(name))
    }

    /// Register a [`SimClassifier`] answering `label` at `confidence`.
    pub fn with_classifier(
        mut self,
        name: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        self.registry
            .register_classifier(SimClassifier::new(name, label, confidence));
        self
    }

    /// Register a [`SimMotor`].
    pub fn with_motor(mut self, name: impl Into<String>) -> Self {
        self.registry.register_actuator(SimMotor::new(name));
        self
    }

    /// Register a custom camera driver.  Useful when a test needs to keep a
    /// handle to the driver to assert on it.
    pub fn with_camera_driver(mut self, camera: Arc<dyn ImageSource>) -> Self {
        self.registry.register_camera(camera);
        self
    }

    /// Register a custom classifier driver.
    pub fn with_classifier_driver(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.registry.register_classifier(classifier);
        self
    }

    /// Register a custom actuator driver.
    pub fn with_motor_driver(mut self, motor: Arc<dyn Actuator>) -> Self {
        self.registry.register_actuator(motor);
        self
    }

    /// Consume the builder and return the configured [`DeviceRegistry`].
    pub fn build(self) -> DeviceRegistry {
        self.registry
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sim_camera_returns_blank_frame() {
        let cam = SimCamera::new("cam");
        let frame = cam.capture().await.expect("sim capture must succeed");
        assert_eq!(frame.width, 4);
        assert_eq!(frame.height, 4);
        assert!(frame.data.iter().all(|&b| b == 0));
        assert_eq!(cam.capture_count(), 1);
    }

    #[tokio::test]
    async fn sim_camera_fails_every_nth_capture() {
        let cam = SimCamera::failing_every("cam", 3);
        assert!(cam.capture().await.is_ok());
        assert!(cam.capture().await.is_ok());
        let err = cam.capture().await.unwrap_err();
        assert!(matches!(err, RefillError::Capture { .. }));
        assert!(cam.capture().await.is_ok());
        assert_eq!(cam.capture_count(), 4);
    }

    #[tokio::test]
    async fn sim_classifier_returns_scripted_result() {
        let vision = SimClassifier::new("vision", "empty", 0.8);
        let frame = SimCamera::new("cam").capture().await.unwrap();
        let results = vision.classify(&frame, 1).await.unwrap();
        assert_eq!(results, vec![Classification::new("empty", 0.8)]);

        vision.set_result(None);
        assert!(vision.classify(&frame, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sim_classifier_honours_zero_top_k() {
        let vision = SimClassifier::new("vision", "empty", 0.8);
        let frame = SimCamera::new("cam").capture().await.unwrap();
        assert!(vision.classify(&frame, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sim_motor_records_calls() {
        let motor = SimMotor::new("motor");
        motor.go_for(60.0, 10.0).await.unwrap();
        motor.go_for(30.0, 1.0).await.unwrap();
        assert_eq!(motor.calls(), vec![(60.0, 10.0), (30.0, 1.0)]);
        assert_eq!(motor.call_count(), 2);
    }

    #[tokio::test]
    async fn sim_motor_history_is_bounded() {
        let motor = SimMotor::new("motor");
        for i in 0..SIM_MOTOR_HISTORY + 10 {
            motor.go_for(i as f64, 1.0).await.unwrap();
        }
        let calls = motor.calls();
        assert_eq!(calls.len(), SIM_MOTOR_HISTORY);
        assert_eq!(calls[0], (10.0, 1.0));
        assert_eq!(motor.call_count(), (SIM_MOTOR_HISTORY + 10) as u64);
    }

    #[test]
    fn sim_registry_builds_resolvable_registry() {
        let motor = SimMotor::new("auger");
        let registry = SimRegistry::new()
            .with_camera("cam")
            .with_classifier("vision", "full", 0.4)
            .with_motor_driver(motor.clone())
            .build();
        let devices = registry.resolve("cam", "vision", "auger").unwrap();
        assert_eq!(devices.motor.name(), "auger");
    }

    #[tokio::test]
    async fn sim_registry_keeps_custom_classifier_handle() {
        let vision = SimClassifier::new("vision", "full", 0.9);
        let registry = SimRegistry::new()
            .with_camera("cam")
            .with_classifier_driver(vision.clone())
            .with_motor("motor")
            .build();
        let devices = registry.resolve("cam", "vision", "motor").unwrap();
        let frame = devices.camera.capture().await.unwrap();

        vision.set_result(Some(Classification::new("empty", 0.7)));
        let results = devices.vision.classify(&frame, 1).await.unwrap();
        assert_eq!(results, vec![Classification::new("empty", 0.7)]);
    }
}
