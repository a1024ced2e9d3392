use super::MediaSource;
use crate::error::CameraError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Media source backed by JPEG files on disk.
///
/// Points at a single file or at a directory; directory entries with a
/// `.jpg`/`.jpeg` extension are loaded in name order and cycled.
pub struct StillImageSource {
    path: PathBuf,
    frames: Vec<Vec<u8>>,
    next: usize,
}

impl StillImageSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frames: Vec::new(),
            next: 0,
        }
    }

    fn map_io(&self, e: std::io::Error) -> CameraError {
        match e.kind() {
            ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            _ => CameraError::DeviceOpen {
                device: self.path.display().to_string(),
                details: e.to_string(),
            },
        }
    }

    async fn jpeg_paths(&self) -> Result<Vec<PathBuf>, CameraError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.map_io(e))?;

        if !metadata.is_dir() {
            return Ok(vec![self.path.clone()]);
        }

        let mut dir = tokio::fs::read_dir(&self.path)
            .await
            .map_err(|e| self.map_io(e))?;
        let mut paths = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| self.map_io(e))? {
            let path = entry.path();
            let is_jpeg = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false);
            if is_jpeg {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl MediaSource for StillImageSource {
    async fn open(&mut self) -> Result<(), CameraError> {
        let paths = self.jpeg_paths().await?;

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = tokio::fs::read(path).await.map_err(|e| self.map_io(e))?;
            debug!("Loaded still frame {} ({} bytes)", path.display(), bytes.len());
            frames.push(bytes);
        }

        if frames.is_empty() {
            return Err(CameraError::DeviceOpen {
                device: self.path.display().to_string(),
                details: "no JPEG images found".to_string(),
            });
        }

        info!(
            "Still image source opened with {} frame(s) from {}",
            frames.len(),
            self.path.display()
        );
        self.frames = frames;
        self.next = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        if self.frames.is_empty() {
            return Err(CameraError::NotOpen);
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        Ok(frame)
    }

    async fn close(&mut self) -> Result<(), CameraError> {
        self.frames.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.frames.is_empty()
    }

    fn describe(&self) -> String {
        format!("still images at {}", self.path.display())
    }
}
