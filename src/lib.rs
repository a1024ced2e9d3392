pub mod analysis;
pub mod camera;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod hold;
pub mod keyboard_input;
pub mod overlay;
pub mod scheduler;
pub mod session;

pub use analysis::{AnalysisClient, AnalysisResult, AnalysisTransport, HttpTransport};
pub use camera::{MediaSource, MediaSourceBuilder, MockMediaSource, StillImageSource};
pub use catalog::{PoseCatalog, PoseEntry};
pub use config::PosecoachConfig;
pub use error::{PosecoachError, Result};
pub use events::{EventBus, SessionEvent};
pub use frame::FrameSample;
pub use hold::{HoldState, HoldTimer};
pub use keyboard_input::{ControlCommand, KeyboardInputHandler};
pub use overlay::{OverlayComposer, OverlayInstruction};
pub use scheduler::{CaptureScheduler, Tick};
pub use session::{Session, SessionController, SessionSnapshot, SessionState, SessionSummary};

#[cfg(all(feature = "camera", target_os = "linux"))]
pub use camera::GstMediaSource;

#[cfg(feature = "render")]
pub use overlay::OverlayRenderer;
