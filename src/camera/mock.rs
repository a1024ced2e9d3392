use super::MediaSource;
use crate::error::CameraError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Open/close/capture counts shared between a mock source and its test
#[derive(Debug, Default)]
pub struct MockCounters {
    opens: AtomicU64,
    closes: AtomicU64,
    captures: AtomicU64,
}

impl MockCounters {
    pub fn opens(&self) -> u64 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> u64 {
        self.captures.load(Ordering::SeqCst)
    }
}

/// In-memory media source that cycles through a fixed set of frames
pub struct MockMediaSource {
    frames: Vec<Vec<u8>>,
    next: usize,
    open: bool,
    deny: bool,
    counters: Arc<MockCounters>,
}

impl MockMediaSource {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        Self {
            frames,
            next: 0,
            open: false,
            deny: false,
            counters: Arc::new(MockCounters::default()),
        }
    }

    /// A source with one small fake JPEG frame
    pub fn single_frame() -> Self {
        Self::new(vec![fake_jpeg(0)])
    }

    /// A source whose `open` always fails with `PermissionDenied`
    pub fn denied() -> Self {
        let mut source = Self::single_frame();
        source.deny = true;
        source
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl MediaSource for MockMediaSource {
    async fn open(&mut self) -> Result<(), CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        self.next = 0;
        debug!("Mock media source opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Vec<u8>, CameraError> {
        if !self.open {
            return Err(CameraError::NotOpen);
        }
        if self.frames.is_empty() {
            return Err(CameraError::NoFrame);
        }

        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = self.next.wrapping_add(1);
        self.counters.captures.fetch_add(1, Ordering::SeqCst);
        Ok(frame)
    }

    async fn close(&mut self) -> Result<(), CameraError> {
        if self.open {
            self.open = false;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            debug!("Mock media source closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn describe(&self) -> String {
        format!("mock ({} frames)", self.frames.len())
    }
}

/// Minimal JPEG-shaped bytes (SOI, JFIF header, pattern, EOI)
pub fn fake_jpeg(seed: u8) -> Vec<u8> {
    let mut data = vec![
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x01, 0x00,
        0x48, 0x00, 0x48, 0x00, 0x00,
    ];
    data.extend(vec![seed; 64]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}
