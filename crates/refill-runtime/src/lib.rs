//! `refill-runtime` – the refill control loop
//!
//! Decides, cycle after cycle, whether a monitored container is empty and
//! runs a motor to refill it.
//!
//! # Modules
//!
//! - [`policy`] – [`decide`][policy::decide]: the pure refill decision over a
//!   set of classifications and a confidence threshold.
//! - [`controller`] – [`RefillController`][controller::RefillController]:
//!   the idle/running/stop-requested state machine and the background task
//!   driving warm-up → sample → classify → decide → act → pace cycles.
//! - [`commands`] – [`dispatch`][commands::dispatch]: the `start` / `stop`
//!   named-command surface.
//! - [`config`] – [`ServiceAttributes`][config::ServiceAttributes],
//!   [`validate_config`][config::validate_config] and the immutable
//!   [`RefillConfig`][config::RefillConfig].
//! - [`service`] – [`RefillService`][service::RefillService]: configure /
//!   reconfigure / close lifecycle bound to a
//!   [`DeviceRegistry`][refill_hal::DeviceRegistry].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console and
//!   optional OTLP trace export.

pub mod commands;
pub mod config;
pub mod controller;
pub mod policy;
pub mod service;
pub mod telemetry;

pub use commands::{Command, LoopControl, dispatch};
pub use config::{RefillConfig, ServiceAttributes, validate_config};
pub use controller::{CycleError, CycleOutcome, LoopState, RefillController};
pub use policy::decide;
pub use service::RefillService;
pub use telemetry::{TracerProviderGuard, init_tracing};
