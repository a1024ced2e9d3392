use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosecoachError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl PosecoachError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<C: Into<String>, M: Into<String>>(component: C, message: M) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Media source failures. Any of these during `open` keeps the session idle.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Camera access denied")]
    PermissionDenied,

    #[error("Failed to open camera device {device}: {details}")]
    DeviceOpen { device: String, details: String },

    #[error("Camera configuration error: {details}")]
    Configuration { details: String },

    #[error("No frame available from camera")]
    NoFrame,

    #[error("Camera is not open")]
    NotOpen,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Analysis request timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Analysis service returned HTTP {status}")]
    Status { status: u16 },

    #[error("Failed to decode analysis response: {details}")]
    Decode { details: String },

    #[error("Analysis request cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Pose catalog must contain at least one pose")]
    Empty,

    #[error("Unknown pose '{pose}'")]
    UnknownPose { pose: String },

    #[error("Pose '{pose}' is listed more than once")]
    DuplicatePose { pose: String },

    #[error("Failed to parse pose catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {details}")]
    PublishFailed { details: String },

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, PosecoachError>;
