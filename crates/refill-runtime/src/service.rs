//! [`RefillService`] – host-facing lifecycle of a refill controller.
//!
//! The host validates attributes with
//! [`validate_config`][crate::config::validate_config], then calls
//! [`RefillService::configure`] with the attributes and a
//! [`DeviceRegistry`] holding the resolved devices.  Reconfiguring stops the
//! previous controller and waits for its task before the new handles take
//! over.  [`RefillService::close`] stops and releases the loop.

use refill_hal::DeviceRegistry;
use refill_types::RefillError;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::commands::dispatch;
use crate::config::{RefillConfig, ServiceAttributes};
use crate::controller::{LoopState, RefillController};

pub struct RefillService {
    name: String,
    controller: Option<RefillController>,
}

impl RefillService {
    /// Create an unconfigured service.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controller: None,
        }
    }

    /// Create a service and configure it in one go.
    ///
    /// # Errors
    ///
    /// See [`configure`][Self::configure].
    pub async fn with_config(
        name: impl Into<String>,
        attrs: &ServiceAttributes,
        deps: &DeviceRegistry,
    ) -> Result<Self, RefillError> {
        let mut service = Self::new(name);
        service.configure(attrs, deps).await?;
        Ok(service)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The active controller, if the service has been configured.
    pub fn controller(&self) -> Option<&RefillController> {
        self.controller.as_ref()
    }

    /// (Re)initialise the service from `attrs`.
    ///
    /// Everything is validated and resolved before the running controller is
    /// touched, so a rejected reconfiguration leaves the previous loop as it
    /// was.  Starts the new loop when `auto_start` is set.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::MissingAttribute`] or
    /// [`RefillError::InvalidAttribute`] for bad attributes and
    /// [`RefillError::MissingDependency`] when a named device is not in
    /// `deps`.
    pub async fn configure(
        &mut self,
        attrs: &ServiceAttributes,
        deps: &DeviceRegistry,
    ) -> Result<(), RefillError> {
        let names = attrs.device_names()?;
        let config = RefillConfig::from_attributes(attrs)?;
        let devices = deps.resolve(names.camera, names.vision, names.motor)?;

        if let Some(previous) = self.controller.take() {
            previous.shutdown().await;
        }

        info!(service = %self.name, ?devices, ?config, "refill service configured");
        let controller = RefillController::new(config, devices);
        if controller.config().auto_start {
            controller.start();
        }
        self.controller = Some(controller);
        Ok(())
    }

    /// Lifecycle state of the loop; `Idle` when unconfigured.
    pub fn state(&self) -> LoopState {
        self.controller
            .as_ref()
            .map_or(LoopState::Idle, RefillController::state)
    }

    /// Dispatch a command object, see [`dispatch`].
    ///
    /// An unconfigured service has nothing to start or stop, so every key is
    /// answered with `false`.
    pub fn do_command(&self, request: &Map<String, Value>) -> Map<String, Value> {
        match &self.controller {
            Some(controller) => dispatch(controller, request),
            None => {
                warn!(service = %self.name, "command received before configure");
                request
                    .keys()
                    .map(|name| (name.clone(), Value::Bool(false)))
                    .collect()
            }
        }
    }

    /// Stop the loop and wait for its task to finish.  Safe to call more than
    /// once.
    pub async fn close(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.shutdown().await;
            info!(service = %self.name, "refill service closed");
        }
    }
}
