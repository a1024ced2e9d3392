use super::{MediaSource, StillImageSource};
use crate::config::CameraConfig;
use crate::error::{CameraError, PosecoachError, Result};

/// Builds the media source named by `[camera] source`
pub struct MediaSourceBuilder {
    config: Option<CameraConfig>,
}

impl MediaSourceBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn config(mut self, config: CameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<Box<dyn MediaSource>> {
        let config = self
            .config
            .ok_or_else(|| PosecoachError::system("Camera configuration must be specified"))?;

        match config.source.as_str() {
            "still" => {
                let path = config.still_image_path.ok_or_else(|| CameraError::Configuration {
                    details: "Camera source 'still' requires still_image_path".to_string(),
                })?;
                Ok(Box::new(StillImageSource::new(path)))
            }
            "gstreamer" => build_gstreamer(config),
            other => Err(CameraError::Configuration {
                details: format!("Unknown camera source '{}'", other),
            }
            .into()),
        }
    }
}

impl Default for MediaSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "camera", target_os = "linux"))]
fn build_gstreamer(config: CameraConfig) -> Result<Box<dyn MediaSource>> {
    Ok(Box::new(super::GstMediaSource::new(config)))
}

#[cfg(not(all(feature = "camera", target_os = "linux")))]
fn build_gstreamer(_config: CameraConfig) -> Result<Box<dyn MediaSource>> {
    Err(CameraError::Configuration {
        details: "GStreamer camera support requires the 'camera' feature on Linux".to_string(),
    }
    .into())
}
