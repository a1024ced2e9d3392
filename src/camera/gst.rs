use super::MediaSource;
use crate::config::CameraConfig;
use crate::error::CameraError;
use async_trait::async_trait;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// V4L2 camera through a GStreamer MJPEG pipeline.
///
/// The appsink callback keeps only the newest JPEG, so `capture` is a copy
/// out of a mutex and never waits on the device.
pub struct GstMediaSource {
    config: CameraConfig,
    pipeline: Option<Pipeline>,
    latest: Arc<Mutex<Option<Vec<u8>>>>,
    frame_counter: Arc<AtomicU64>,
}

impl GstMediaSource {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            pipeline: None,
            latest: Arc::new(Mutex::new(None)),
            frame_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    fn device_path(&self) -> String {
        format!("/dev/video{}", self.config.index)
    }

    fn build_pipeline_string(&self) -> String {
        let (width, height) = self.config.resolution;
        format!(
            "v4l2src device={} io-mode=mmap do-timestamp=true ! \
             image/jpeg,width={},height={},framerate={}/1 ! \
             queue max-size-buffers=2 leaky=downstream ! \
             appsink name=sink sync=false max-buffers=1 drop=true emit-signals=false",
            self.device_path(),
            width,
            height,
            self.config.fps
        )
    }

    /// Probe the device node so a permission problem is reported as such
    fn check_device(&self) -> Result<(), CameraError> {
        let device = self.device_path();
        match std::fs::File::open(&device) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(CameraError::PermissionDenied)
            }
            Err(e) => Err(CameraError::DeviceOpen {
                device,
                details: e.to_string(),
            }),
        }
    }

    fn build_pipeline(&self) -> Result<Pipeline, CameraError> {
        let pipeline_desc = self.build_pipeline_string();
        info!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(&pipeline_desc)
            .map_err(|e| CameraError::Configuration {
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::Configuration {
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::Configuration {
                details: "Pipeline has no appsink named 'sink'".to_string(),
            })?
            .downcast::<AppSink>()
            .map_err(|_| CameraError::Configuration {
                details: "Element 'sink' is not an AppSink".to_string(),
            })?;

        let latest = Arc::clone(&self.latest);
        let frame_counter = Arc::clone(&self.frame_counter);
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink
                        .pull_sample()
                        .map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame_id = frame_counter.fetch_add(1, Ordering::Relaxed);
                    trace!("Received MJPEG frame {} ({} bytes)", frame_id, map.len());
                    *latest.lock() = Some(map.as_slice().to_vec());
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(pipeline)
    }
}

#[async_trait]
impl MediaSource for GstMediaSource {
    async fn open(&mut self) -> Result<(), CameraError> {
        if self.pipeline.is_some() {
            debug!("GStreamer media source already open");
            return Ok(());
        }

        gstreamer::init().map_err(|e| CameraError::Configuration {
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        self.check_device()?;
        let pipeline = self.build_pipeline()?;

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(CameraError::DeviceOpen {
                device: self.device_path(),
                details: format!("Failed to start pipeline: {}", e),
            });
        }

        info!(
            "Camera {} opened ({}x{} @ {}fps)",
            self.device_path(),
            self.config.resolution.0,
            self.config.resolution.1,
            self.config.fps
        );
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        if self.pipeline.is_none() {
            return Err(CameraError::NotOpen);
        }
        self.latest.lock().clone().ok_or(CameraError::NoFrame)
    }

    async fn close(&mut self) -> Result<(), CameraError> {
        let Some(pipeline) = self.pipeline.take() else {
            return Ok(());
        };

        *self.latest.lock() = None;
        match pipeline.set_state(gstreamer::State::Null) {
            Ok(_) => {
                info!(
                    "Camera {} released after {} frames",
                    self.device_path(),
                    self.frame_counter.load(Ordering::Relaxed)
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to stop GStreamer pipeline: {}", e);
                Err(CameraError::Configuration {
                    details: format!("Failed to stop pipeline: {}", e),
                })
            }
        }
    }

    fn is_open(&self) -> bool {
        self.pipeline.is_some()
    }

    fn describe(&self) -> String {
        format!("camera {}", self.device_path())
    }
}

impl Drop for GstMediaSource {
    fn drop(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            warn!("GStreamer media source dropped while open; stopping pipeline");
            let _ = pipeline.set_state(gstreamer::State::Null);
        }
    }
}
