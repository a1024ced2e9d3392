use super::client::AnalysisTransport;
use super::types::{AnalyzeRequest, AnalyzeResponse};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// `reqwest` transport for `POST /analyze_pose`
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("posecoach/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            "Pose analysis endpoint: {} (timeout {}ms)",
            config.endpoint, config.timeout_ms
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_ms: config.timeout_ms,
        })
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn post_analyze(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<AnalyzeResponse, AnalysisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout {
                        after_ms: self.timeout_ms,
                    }
                } else {
                    AnalysisError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!("Analysis response: HTTP {} ({} bytes)", status, body.len());

        let value: Value = serde_json::from_slice(&body).map_err(|e| AnalysisError::Decode {
            details: e.to_string(),
        })?;

        AnalyzeResponse::from_json(&value).ok_or_else(|| AnalysisError::Decode {
            details: "response body is not a JSON object".to_string(),
        })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
