use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label a classifier must emit for a container that needs refilling.
pub const EMPTY_LABEL: &str = "empty";

/// A single labelled result returned by an image classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Class name, e.g. `"empty"` or `"full"`.
    pub label: String,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// `true` when this result names the empty class.
    pub fn is_empty_label(&self) -> bool {
        self.label == EMPTY_LABEL
    }
}

/// A raw frame produced by an image source.
///
/// The control loop never looks inside the pixel buffer; it only hands the
/// frame from the image source to the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Encoded or raw pixel data.
    pub data: Vec<u8>,
    /// e.g. `"image/jpeg"`.
    pub mime_type: String,
    pub captured_at: DateTime<Utc>,
}

/// The three device roles the refill service depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Camera,
    Vision,
    Motor,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Camera => write!(f, "camera"),
            DeviceKind::Vision => write!(f, "vision"),
            DeviceKind::Motor => write!(f, "motor"),
        }
    }
}

/// Error type spanning configuration problems and device failures.
///
/// The first three variants are fatal at configure time.  The device variants
/// are raised from inside a refill cycle and are recoverable: the control loop
/// logs them and carries on with the next cycle.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RefillError {
    #[error("Missing required {0} attribute.")]
    MissingAttribute(String),

    #[error("Invalid attribute {name}: {details}")]
    InvalidAttribute { name: String, details: String },

    #[error("No {kind} named '{name}' is available")]
    MissingDependency { kind: DeviceKind, name: String },

    #[error("Capture failed on {component}: {details}")]
    Capture { component: String, details: String },

    #[error("Classification failed on {component}: {details}")]
    Classification { component: String, details: String },

    #[error("Actuator fault on {component}: {details}")]
    Actuator { component: String, details: String },
}

impl RefillError {
    /// `true` for errors that can only be raised while configuring.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RefillError::MissingAttribute(_)
                | RefillError::InvalidAttribute { .. }
                | RefillError::MissingDependency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_detects_empty_label() {
        assert!(Classification::new("empty", 0.9).is_empty_label());
        assert!(!Classification::new("full", 0.9).is_empty_label());
        // Labels are matched exactly.
        assert!(!Classification::new("Empty", 0.9).is_empty_label());
    }

    #[test]
    fn classification_deserializes_from_json() {
        let c: Classification =
            serde_json::from_str(r#"{"label":"empty","confidence":0.8}"#).unwrap();
        assert_eq!(c, Classification::new("empty", 0.8));
    }

    #[test]
    fn device_kind_display_is_lowercase() {
        assert_eq!(DeviceKind::Camera.to_string(), "camera");
        assert_eq!(DeviceKind::Vision.to_string(), "vision");
        assert_eq!(DeviceKind::Motor.to_string(), "motor");
    }

    #[test]
    fn refill_error_display() {
        let err = RefillError::MissingAttribute("camera_name".to_string());
        assert_eq!(err.to_string(), "Missing required camera_name attribute.");

        let err = RefillError::MissingDependency {
            kind: DeviceKind::Motor,
            name: "feeder".to_string(),
        };
        assert!(err.to_string().contains("motor"));
        assert!(err.to_string().contains("feeder"));

        let err = RefillError::Capture {
            component: "cam".to_string(),
            details: "disconnected".to_string(),
        };
        assert!(err.to_string().contains("disconnected"));
    }

    #[test]
    fn configuration_errors_are_classified() {
        assert!(RefillError::MissingAttribute("motor_name".into()).is_configuration());
        assert!(
            !RefillError::Actuator {
                component: "m".into(),
                details: "stall".into()
            }
            .is_configuration()
        );
    }
}
