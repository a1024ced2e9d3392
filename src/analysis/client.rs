use super::types::{AnalysisResult, AnalyzeRequest, AnalyzeResponse};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::frame::FrameSample;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Wire seam to the pose-analysis service
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    async fn post_analyze(&self, request: &AnalyzeRequest)
        -> Result<AnalyzeResponse, AnalysisError>;

    /// Endpoint description for log lines
    fn endpoint(&self) -> &str;
}

/// Encodes frames, calls the analysis service and isolates its failures.
///
/// `analyze` never returns an error: transport failures, timeouts and bad
/// status codes are logged and reported as `None`, which the session treats
/// as a tick without a result.
#[derive(Clone)]
pub struct AnalysisClient {
    transport: Arc<dyn AnalysisTransport>,
    timeout: Duration,
    image_mime: String,
}

impl AnalysisClient {
    pub fn new(transport: Arc<dyn AnalysisTransport>, config: &AnalysisConfig) -> Self {
        Self {
            transport,
            timeout: config.timeout(),
            image_mime: config.image_mime.clone(),
        }
    }

    pub async fn analyze(&self, frame: &FrameSample, pose_id: &str) -> Option<AnalysisResult> {
        match self.try_analyze(frame, pose_id).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    "Pose analysis for tick {} failed ({}): {}",
                    frame.captured_at_tick,
                    self.transport.endpoint(),
                    e
                );
                None
            }
        }
    }

    /// Fallible form of [`AnalysisClient::analyze`]
    pub async fn try_analyze(
        &self,
        frame: &FrameSample,
        pose_id: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalyzeRequest {
            frame: frame.to_data_url(&self.image_mime),
            pose: pose_id.to_string(),
        };

        debug!(
            "Sending tick {} frame ({} bytes) for pose '{}'",
            frame.captured_at_tick,
            frame.len(),
            pose_id
        );

        let response = tokio::time::timeout(self.timeout, self.transport.post_analyze(&request))
            .await
            .map_err(|_| AnalysisError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            })??;

        let result = AnalysisResult::from(response);
        debug!(
            "Tick {} analysis: correct={} feedback_items={} annotated={}",
            frame.captured_at_tick,
            result.is_correct,
            result.feedback_items.len(),
            result.annotated_image.is_some()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct StubTransport {
        reply: Mutex<Option<Result<AnalyzeResponse, AnalysisError>>>,
        delay: Duration,
        seen: Mutex<Vec<AnalyzeRequest>>,
    }

    impl StubTransport {
        fn new(reply: Result<AnalyzeResponse, AnalysisError>, delay: Duration) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                delay,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AnalysisTransport for StubTransport {
        async fn post_analyze(
            &self,
            request: &AnalyzeRequest,
        ) -> Result<AnalyzeResponse, AnalysisError> {
            self.seen.lock().push(request.clone());
            tokio::time::sleep(self.delay).await;
            self.reply
                .lock()
                .take()
                .unwrap_or(Err(AnalysisError::Cancelled))
        }

        fn endpoint(&self) -> &str {
            "stub://analyze_pose"
        }
    }

    fn config(timeout_ms: u64) -> AnalysisConfig {
        AnalysisConfig {
            endpoint: "stub://analyze_pose".to_string(),
            timeout_ms,
            image_mime: "image/jpeg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_analysis() {
        let transport = Arc::new(StubTransport::new(
            Ok(AnalyzeResponse {
                is_correct: true,
                feedback: vec!["Great job! Your pose is well-aligned.".to_string()],
                frame_with_landmarks: None,
            }),
            Duration::ZERO,
        ));
        let client = AnalysisClient::new(transport.clone(), &config(1000));
        let frame = FrameSample::new(1, vec![1, 2, 3]);

        let result = client.analyze(&frame, "Tree Pose").await.unwrap();

        assert!(result.is_correct);
        assert_eq!(result.feedback_items.len(), 1);

        let seen = transport.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].pose, "Tree Pose");
        assert_eq!(seen[0].frame, "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn test_status_error_is_no_result() {
        let transport = Arc::new(StubTransport::new(
            Err(AnalysisError::Status { status: 500 }),
            Duration::ZERO,
        ));
        let client = AnalysisClient::new(transport, &config(1000));

        let frame = FrameSample::new(2, vec![0]);
        assert!(client.analyze(&frame, "Cat Pose").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_no_result() {
        let transport = Arc::new(StubTransport::new(
            Ok(AnalyzeResponse::default()),
            Duration::from_secs(10),
        ));
        let client = AnalysisClient::new(transport, &config(250));
        let frame = FrameSample::new(3, vec![0]);

        match client.try_analyze(&frame, "Cat Pose").await {
            Err(AnalysisError::Timeout { after_ms }) => assert_eq!(after_ms, 250),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }
}
