//! `refill-hal` – Capability Handles
//!
//! The device-facing traits the refill control loop depends on, plus a
//! registry that resolves configured names into live handles.
//!
//! # Modules
//!
//! - [`camera`] – [`ImageSource`][camera::ImageSource]: frame capture.
//! - [`vision`] – [`Classifier`][vision::Classifier]: image classification
//!   returning ordered `(label, confidence)` results.
//! - [`actuator`] – [`Actuator`][actuator::Actuator]: rotary motor driven
//!   for a number of revolutions at a given speed.
//! - [`registry`] – [`DeviceRegistry`][registry::DeviceRegistry] and the
//!   resolved [`Devices`][registry::Devices] bundle.
//! - [`sim`] – simulated drivers and the
//!   [`SimRegistry`][sim::SimRegistry] builder for tests and demos.

pub mod actuator;
pub mod camera;
pub mod registry;
pub mod sim;
pub mod vision;

pub use actuator::Actuator;
pub use camera::ImageSource;
pub use registry::{DeviceRegistry, Devices};
pub use sim::{SimCamera, SimClassifier, SimMotor, SimRegistry};
pub use vision::Classifier;
