//! [`DeviceRegistry`] – name-indexed store of capability handles.
//!
//! The registry holds shared references to every registered
//! [`ImageSource`], [`Classifier`] and [`Actuator`].  When the refill service
//! is configured it asks the registry to resolve the three names from its
//! attributes into a [`Devices`] bundle.

use std::collections::HashMap;
use std::sync::Arc;

use refill_types::{DeviceKind, RefillError};

use crate::actuator::Actuator;
use crate::camera::ImageSource;
use crate::vision::Classifier;

/// The three resolved capability handles a control loop runs against.
///
/// Cloning is cheap; every clone shares the same drivers.
#[derive(Clone)]
pub struct Devices {
    pub camera: Arc<dyn ImageSource>,
    pub vision: Arc<dyn Classifier>,
    pub motor: Arc<dyn Actuator>,
}

impl std::fmt::Debug for Devices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Devices")
            .field("camera", &self.camera.name())
            .field("vision", &self.vision.name())
            .field("motor", &self.motor.name())
            .finish()
    }
}

/// Central capability-handle registry.
///
/// Construct with [`DeviceRegistry::new`], register drivers, then call
/// [`DeviceRegistry::resolve`] to look up the handles a service needs.
#[derive(Default, Clone)]
pub struct DeviceRegistry {
    cameras: HashMap<String, Arc<dyn ImageSource>>,
    classifiers: HashMap<String, Arc<dyn Classifier>>,
    actuators: HashMap<String, Arc<dyn Actuator>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image source.  Any previously registered camera with the
    /// same name is replaced.
    pub fn register_camera(&mut self, camera: Arc<dyn ImageSource>) {
        self.cameras.insert(camera.name().to_string(), camera);
    }

    /// Register a classifier.  Any previously registered classifier with the
    /// same name is replaced.
    pub fn register_classifier(&mut self, classifier: Arc<dyn Classifier>) {
        self.classifiers.insert(classifier.name().to_string(), classifier);
    }

    /// Register an actuator.  Any previously registered actuator with the
    /// same name is replaced.
    pub fn register_actuator(&mut self, actuator: Arc<dyn Actuator>) {
        self.actuators.insert(actuator.name().to_string(), actuator);
    }

    pub fn camera(&self, name: &str) -> Option<Arc<dyn ImageSource>> {
        self.cameras.get(name).cloned()
    }

    pub fn classifier(&self, name: &str) -> Option<Arc<dyn Classifier>> {
        self.classifiers.get(name).cloned()
    }

    pub fn actuator(&self, name: &str) -> Option<Arc<dyn Actuator>> {
        self.actuators.get(name).cloned()
    }

    /// Resolve the camera, classifier and motor names into a [`Devices`]
    /// bundle.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::MissingDependency`] for the first name that is
    /// not registered.
    pub fn resolve(
        &self,
        camera_name: &str,
        vision_name: &str,
        motor_name: &str,
    ) -> Result<Devices, RefillError> {
        let missing = |kind: DeviceKind, name: &str| RefillError::MissingDependency {
            kind,
            name: name.to_string(),
        };

        Ok(Devices {
            camera: self
                .camera(camera_name)
                .ok_or_else(|| missing(DeviceKind::Camera, camera_name))?,
            vision: self
                .classifier(vision_name)
                .ok_or_else(|| missing(DeviceKind::Vision, vision_name))?,
            motor: self
                .actuator(motor_name)
                .ok_or_else(|| missing(DeviceKind::Motor, motor_name))?,
        })
    }
}
