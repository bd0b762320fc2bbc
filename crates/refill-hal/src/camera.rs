//! Generic `ImageSource` trait for cameras and any other frame producer.

use async_trait::async_trait;
use refill_types::{Image, RefillError};

/// A camera or image-capture device.
///
/// Drivers implement this trait and register themselves with a
/// [`DeviceRegistry`][crate::registry::DeviceRegistry].  Handles are shared
/// with the control-loop task, so `capture` takes `&self`; drivers that need
/// mutable state keep it behind their own lock.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Stable identifier for this camera, e.g. `"hopper_cam"`.
    fn name(&self) -> &str;

    /// Capture and return the next available frame.
    ///
    /// # Errors
    ///
    /// Returns [`RefillError::Capture`] if the frame cannot be captured
    /// (e.g. the device is disconnected or the buffer is unavailable).
    async fn capture(&self) -> Result<Image, RefillError>;
}
