//! Generic `Actuator` trait for rotary motors that dispense a refill.
//!
//! Drivers implement this trait and register themselves with a
//! [`DeviceRegistry`][crate::registry::DeviceRegistry].  The control loop only
//! ever talks to the trait, so drivers can be swapped without touching the
//! decision logic.

use async_trait::async_trait;
use refill_types::RefillError;

/// A rotary actuator (stepper, DC gear motor, auger, …).
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Stable identifier for this motor, e.g. `"auger"`.
    fn name(&self) -> &str;

    /// Spin the motor at `rpm` for `revolutions` turns.
    ///
    /// Resolves once the motion is complete.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::Actuator`] if the command cannot be applied
    /// (e.g. the motor is stalled or in a fault state).
    async fn go_for(&self, rpm: f64, revolutions: f64) -> Result<(), RefillError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Minimal in-process motor used only for tests.
    struct MockMotor {
        name: String,
        total_revolutions: Mutex<f64>,
    }

    #[async_trait]
    impl Actuator for MockMotor {
        fn name(&self) -> &str {
            &self.name
        }

        async fn go_for(&self, _rpm: f64, revolutions: f64) -> Result<(), RefillError> {
            *self.total_revolutions.lock().unwrap() += revolutions;
            Ok(())
        }
    }

    #[tokio::test]
    async fn mock_motor_accumulates_revolutions() {
        let motor = MockMotor {
            name: "auger".to_string(),
            total_revolutions: Mutex::new(0.0),
        };
        assert_eq!(motor.name(), "auger");

        motor.go_for(60.0, 10.0).await.unwrap();
        motor.go_for(60.0, 2.5).await.unwrap();
        let total = *motor.total_revolutions.lock().unwrap();
        assert!((total - 12.5).abs() < f64::EPSILON);
    }
}
