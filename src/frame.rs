use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use std::sync::Arc;
use tokio::time::Instant;

/// One frame pulled from the media source for a single tick.
///
/// Lives only for the tick that produced it; the image bytes are shared so
/// the analysis task and the snapshot fallback image can both hold them.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// Tick that triggered the capture
    pub captured_at_tick: u64,
    /// Monotonic capture instant
    pub captured_at: Instant,
    /// Encoded image (JPEG for every built-in source)
    pub image_bytes: Arc<Vec<u8>>,
}

impl FrameSample {
    pub fn new(captured_at_tick: u64, image_bytes: Vec<u8>) -> Self {
        Self {
            captured_at_tick,
            captured_at: Instant::now(),
            image_bytes: Arc::new(image_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.image_bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_bytes.is_empty()
    }

    /// Encode the image as a `data:` URL for the analysis service
    pub fn to_data_url(&self, mime: &str) -> String {
        encode_data_url(mime, &self.image_bytes)
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
}

/// Decode a `data:<mime>;base64,<payload>` string.
///
/// A bare base64 payload without the `data:` header is accepted too.
/// Returns `None` for anything that is not valid base64.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let payload = match url.split_once(',') {
        Some((header, payload)) => {
            if !header.ends_with(";base64") {
                return None;
            }
            payload
        }
        None => url,
    };

    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    BASE64_STANDARD.decode(payload).ok()
}
