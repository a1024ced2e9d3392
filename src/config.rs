use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PosecoachConfig {
    pub camera: CameraConfig,
    pub analysis: AnalysisConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub overlay: OverlayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Media source kind ("gstreamer" or "still")
    #[serde(default = "default_camera_source")]
    pub source: String,

    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Camera resolution (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// Frames per second requested from the device
    #[serde(default = "default_camera_fps")]
    pub fps: u32,

    /// JPEG file or directory of JPEG files used by the still source
    #[serde(default)]
    pub still_image_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisConfig {
    /// Full URL of the pose-analysis endpoint
    #[serde(default = "default_analysis_endpoint")]
    pub endpoint: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_analysis_timeout_ms")]
    pub timeout_ms: u64,

    /// MIME type used in the frame data URL
    #[serde(default = "default_image_mime")]
    pub image_mime: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Interval between capture+analyze cycles in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Pose selected at startup
    #[serde(default)]
    pub default_pose: Option<String>,

    /// Session event bus capacity
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct CatalogConfig {
    /// Optional TOML catalog file; the built-in catalog is used when absent
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OverlayConfig {
    /// Render the overlay onto the latest frame
    #[serde(default = "default_overlay_render")]
    pub render: bool,

    /// Path to TrueType font file for overlay text
    #[serde(default = "default_overlay_font_path")]
    pub font_path: String,

    #[serde(default = "default_title_font_size")]
    pub title_font_size: f32,

    #[serde(default = "default_line_font_size")]
    pub line_font_size: f32,

    /// Where the binary writes the rendered overlay JPEG
    #[serde(default)]
    pub output_path: Option<String>,
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl PosecoachConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("posecoach.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.source", default_camera_source())?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.fps", default_camera_fps())?
            .set_default("analysis.endpoint", default_analysis_endpoint())?
            .set_default("analysis.timeout_ms", default_analysis_timeout_ms() as i64)?
            .set_default("analysis.image_mime", default_image_mime())?
            .set_default("session.tick_interval_ms", default_tick_interval_ms() as i64)?
            .set_default(
                "session.event_bus_capacity",
                default_event_bus_capacity() as i64,
            )?
            .set_default("overlay.render", default_overlay_render())?
            .set_default("overlay.font_path", default_overlay_font_path())?
            .set_default("overlay.title_font_size", default_title_font_size() as f64)?
            .set_default("overlay.line_font_size", default_line_font_size() as f64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // POSECOACH_ANALYSIS__TIMEOUT_MS=2000 style overrides
            .add_source(
                Environment::with_prefix("POSECOACH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PosecoachConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.camera.source.as_str() {
            "gstreamer" => {}
            "still" => {
                if self.camera.still_image_path.is_none() {
                    return Err(ConfigError::Message(
                        "Camera source 'still' requires still_image_path".to_string(),
                    ));
                }
            }
            other => {
                return Err(ConfigError::Message(format!(
                    "Unknown camera source '{}'",
                    other
                )));
            }
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.fps == 0 {
            return Err(ConfigError::Message(
                "Camera fps must be greater than 0".to_string(),
            ));
        }

        if self.analysis.endpoint.trim().is_empty() {
            return Err(ConfigError::Message(
                "Analysis endpoint must not be empty".to_string(),
            ));
        }

        if self.analysis.timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Analysis timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.session.tick_interval_ms == 0 {
            return Err(ConfigError::Message(
                "Session tick_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.session.event_bus_capacity == 0 {
            return Err(ConfigError::Message(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.overlay.title_font_size <= 0.0 || self.overlay.line_font_size <= 0.0 {
            return Err(ConfigError::Message(
                "Overlay font sizes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PosecoachConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                source: default_camera_source(),
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                fps: default_camera_fps(),
                still_image_path: None,
            },
            analysis: AnalysisConfig {
                endpoint: default_analysis_endpoint(),
                timeout_ms: default_analysis_timeout_ms(),
                image_mime: default_image_mime(),
            },
            session: SessionConfig {
                tick_interval_ms: default_tick_interval_ms(),
                default_pose: None,
                event_bus_capacity: default_event_bus_capacity(),
            },
            catalog: CatalogConfig::default(),
            overlay: OverlayConfig {
                render: default_overlay_render(),
                font_path: default_overlay_font_path(),
                title_font_size: default_title_font_size(),
                line_font_size: default_line_font_size(),
                output_path: None,
            },
        }
    }
}

// Default value functions
fn default_camera_source() -> String {
    "gstreamer".to_string()
}
fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (640, 480)
}
fn default_camera_fps() -> u32 {
    30
}

fn default_analysis_endpoint() -> String {
    "http://localhost:5000/analyze_pose".to_string()
}
fn default_analysis_timeout_ms() -> u64 {
    5000
}
fn default_image_mime() -> String {
    "image/jpeg".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_event_bus_capacity() -> usize {
    64
}

fn default_overlay_render() -> bool {
    false
}
fn default_overlay_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}
fn default_title_font_size() -> f32 {
    16.0
}
fn default_line_font_size() -> f32 {
    14.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PosecoachConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.session.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.analysis.endpoint, "http://localhost:5000/analyze_pose");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[analysis]
endpoint = "http://10.0.0.2:5000/analyze_pose"
timeout_ms = 1500

[session]
tick_interval_ms = 500
default_pose = "Tree Pose"
"#
        )
        .unwrap();

        let config = PosecoachConfig::load_from_file(file.path()).unwrap();

        assert_eq!(config.analysis.endpoint, "http://10.0.0.2:5000/analyze_pose");
        assert_eq!(config.analysis.timeout(), Duration::from_millis(1500));
        assert_eq!(config.session.tick_interval_ms, 500);
        assert_eq!(config.session.default_pose.as_deref(), Some("Tree Pose"));
        // Untouched sections keep their defaults
        assert_eq!(config.camera.resolution, (640, 480));
        assert_eq!(config.analysis.image_mime, "image/jpeg");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = PosecoachConfig::load_from_file("/nonexistent/posecoach.toml").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.tick_interval_ms, 1000);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PosecoachConfig::default();
        config.session.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        config.session.tick_interval_ms = 1000;
        config.camera.source = "still".to_string();
        assert!(config.validate().is_err());

        config.camera.still_image_path = Some("./frames".to_string());
        assert!(config.validate().is_ok());

        config.camera.source = "webcam".to_string();
        assert!(config.validate().is_err());
    }
}
