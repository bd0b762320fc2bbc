//! Service attributes and the immutable [`RefillConfig`] built from them.
//!
//! [`ServiceAttributes`] is the loosely-typed form delivered by the host (a
//! TOML table, a JSON object, …).  [`validate_config`] checks it and returns
//! the implicit device dependencies; [`RefillConfig::from_attributes`] turns
//! it into the strongly-typed configuration the control loop runs with.

use std::time::Duration;

use refill_types::RefillError;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.55;
pub const DEFAULT_ACTUATOR_SPEED: f64 = 60.0;
pub const DEFAULT_ACTUATOR_REVOLUTIONS: f64 = 10.0;
/// Frames discarded before the one that is classified.
pub const DEFAULT_WARMUP_FRAMES: usize = 3;
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_secs(10);

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Raw attributes of a refill service, as delivered by the host.
///
/// Unknown keys are ignored.  Every field is optional at the type level so
/// that a missing required name can be reported as a
/// [`RefillError::MissingAttribute`] instead of a deserialisation failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_name: Option<String>,
    /// Minimum confidence (exclusive) for an `"empty"` result to trigger a
    /// refill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    /// Motor speed in RPM.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuator_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actuator_revolutions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_frames: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pacing_delay_secs: Option<f64>,
}

/// Validate `attrs` and return the names of the devices the service depends
/// on, in `[camera, motor, vision]` order.
///
/// # Errors
///
/// Returns [`RefillError::MissingAttribute`] for the first absent device name
/// and [`RefillError::InvalidAttribute`] for an out-of-range tuning value.
pub fn validate_config(attrs: &ServiceAttributes) -> Result<Vec<String>, RefillError> {
    let names = attrs.device_names()?;
    RefillConfig::from_attributes(attrs)?;
    Ok(vec![
        names.camera.to_string(),
        names.motor.to_string(),
        names.vision.to_string(),
    ])
}

/// The three device names borrowed from a [`ServiceAttributes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNames<'a> {
    pub camera: &'a str,
    pub motor: &'a str,
    pub vision: &'a str,
}

impl ServiceAttributes {
    /// Borrow the required device names.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::MissingAttribute`] for the first absent name,
    /// checked in camera, motor, vision order.
    pub fn device_names(&self) -> Result<DeviceNames<'_>, RefillError> {
        Ok(DeviceNames {
            camera: required(&self.camera_name, "camera_name")?,
            motor: required(&self.motor_name, "motor_name")?,
            vision: required(&self.vision_name, "vision_name")?,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, RefillError> {
    value
        .as_deref()
        .ok_or_else(|| RefillError::MissingAttribute(name.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// RefillConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable tuning of a refill control loop.
///
/// Built once per configure and shared with the loop task; a reconfiguration
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct RefillConfig {
    pub confidence_level: f64,
    pub actuator_speed: f64,
    pub actuator_revolutions: f64,
    pub auto_start: bool,
    pub warmup_frames: usize,
    pub pacing_delay: Duration,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            actuator_speed: DEFAULT_ACTUATOR_SPEED,
            actuator_revolutions: DEFAULT_ACTUATOR_REVOLUTIONS,
            auto_start: false,
            warmup_frames: DEFAULT_WARMUP_FRAMES,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

impl RefillConfig {
    /// Build a config from `attrs`, filling unset values with defaults.
    ///
    /// Device names are not inspected here; see [`validate_config`].
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::InvalidAttribute`] when `confidence_level` lies
    /// outside `[0, 1]`, when the motor values are not finite, or when
    /// `pacing_delay_secs` is negative or not finite.
    pub fn from_attributes(attrs: &ServiceAttributes) -> Result<Self, RefillError> {
        let defaults = Self::default();

        let confidence_level = attrs.confidence_level.unwrap_or(defaults.confidence_level);
        if !(0.0..=1.0).contains(&confidence_level) {
            return Err(invalid(
                "confidence_level",
                format!("{confidence_level} is outside [0, 1]"),
            ));
        }

        let actuator_speed = attrs.actuator_speed.unwrap_or(defaults.actuator_speed);
        if !actuator_speed.is_finite() {
            return Err(invalid("actuator_speed", "must be a finite number"));
        }

        let actuator_revolutions = attrs
            .actuator_revolutions
            .unwrap_or(defaults.actuator_revolutions);
        if !actuator_revolutions.is_finite() {
            return Err(invalid("actuator_revolutions", "must be a finite number"));
        }

        let pacing_delay = match attrs.pacing_delay_secs {
            None => defaults.pacing_delay,
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|e| invalid("pacing_delay_secs", e.to_string()))?,
        };

        Ok(Self {
            confidence_level,
            actuator_speed,
            actuator_revolutions,
            auto_start: attrs.auto_start.unwrap_or(defaults.auto_start),
            warmup_frames: attrs.warmup_frames.unwrap_or(defaults.warmup_frames),
            pacing_delay,
        })
    }
}

fn invalid(name: &str, details: impl Into<String>) -> RefillError {
    RefillError::InvalidAttribute {
        name: name.to_string(),
        details: details.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named() -> ServiceAttributes {
        ServiceAttributes {
            camera_name: Some("cam".to_string()),
            motor_name: Some("motor".to_string()),
            vision_name: Some("vision".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RefillConfig::from_attributes(&named()).unwrap();
        assert_eq!(cfg, RefillConfig::default());
        assert!((cfg.confidence_level - 0.55).abs() < f64::EPSILON);
        assert!((cfg.actuator_speed - 60.0).abs() < f64::EPSILON);
        assert!((cfg.actuator_revolutions - 10.0).abs() < f64::EPSILON);
        assert!(!cfg.auto_start);
        assert_eq!(cfg.warmup_frames, 3);
        assert_eq!(cfg.pacing_delay, Duration::from_secs(10));
    }

    #[test]
    fn validate_returns_dependencies_in_order() {
        let deps = validate_config(&named()).unwrap();
        assert_eq!(deps, vec!["cam", "motor", "vision"]);
    }

    #[test]
    fn validate_reports_each_missing_name() {
        for field in ["camera_name", "motor_name", "vision_name"] {
            let mut attrs = named();
            match field {
                "camera_name" => attrs.camera_name = None,
                "motor_name" => attrs.motor_name = None,
                _ => attrs.vision_name = None,
            }
            assert_eq!(
                validate_config(&attrs).unwrap_err(),
                RefillError::MissingAttribute(field.to_string())
            );
        }
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut attrs = named();
        attrs.confidence_level = Some(1.5);
        let err = validate_config(&attrs).unwrap_err();
        assert!(matches!(err, RefillError::InvalidAttribute { ref name, .. } if name == "confidence_level"));
    }

    #[test]
    fn negative_pacing_delay_is_invalid() {
        let mut attrs = named();
        attrs.pacing_delay_secs = Some(-1.0);
        assert!(RefillConfig::from_attributes(&attrs).is_err());
    }

    #[test]
    fn attributes_deserialize_and_ignore_unknown_keys() {
        let attrs: ServiceAttributes = serde_json::from_value(serde_json::json!({
            "camera_name": "cam",
            "motor_name": "motor",
            "vision_name": "vision",
            "confidence_level": 0.7,
            "auto_start": true,
            "pacing_delay_secs": 0.5,
            "colour": "blue"
        }))
        .unwrap();
        let cfg = RefillConfig::from_attributes(&attrs).unwrap();
        assert!((cfg.confidence_level - 0.7).abs() < f64::EPSILON);
        assert!(cfg.auto_start);
        assert_eq!(cfg.pacing_delay, Duration::from_millis(500));
    }
}
