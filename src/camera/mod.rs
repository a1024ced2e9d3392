mod builder;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod gst;
mod mock;
mod still;
#[cfg(test)]
mod tests;

use crate::error::CameraError;
use async_trait::async_trait;

pub use builder::MediaSourceBuilder;
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use gst::GstMediaSource;
pub use mock::{fake_jpeg, MockCounters, MockMediaSource};
pub use still::StillImageSource;

/// A live video source owned by the session controller.
///
/// `open` and `close` may wait on the device. `capture` must not: it hands
/// back the most recent frame the source already has, or fails.
#[async_trait]
pub trait MediaSource: Send {
    /// Acquire the device. A denied or missing device is an error.
    async fn open(&mut self) -> Result<(), CameraError>;

    /// Latest encoded frame
    fn capture(&mut self) -> Result<Vec<u8>, CameraError>;

    /// Release the device. Closing a closed source is a no-op.
    async fn close(&mut self) -> Result<(), CameraError>;

    fn is_open(&self) -> bool;

    /// Short human-readable name for logs
    fn describe(&self) -> String;
}
