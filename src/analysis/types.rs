use crate::frame::decode_data_url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Body of `POST /analyze_pose`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeRequest {
    /// Data-URL encoded frame
    pub frame: String,
    /// Pose identifier from the catalog
    pub pose: String,
}

/// Raw service response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(default)]
    pub is_correct: bool,

    #[serde(default)]
    pub feedback: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_with_landmarks: Option<String>,
}

impl AnalyzeResponse {
    /// Lenient extraction from a decoded JSON body.
    ///
    /// Returns `None` only when the body is not a JSON object. Missing,
    /// null or mistyped fields fall back to their defaults, and non-string
    /// feedback entries are skipped.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let is_correct = object
            .get("isCorrect")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let feedback = object
            .get("feedback")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let frame_with_landmarks = object
            .get("frameWithLandmarks")
            .and_then(Value::as_str)
            .map(str::to_string);

        Some(Self {
            is_correct,
            feedback,
            frame_with_landmarks,
        })
    }
}

/// Classification of one frame, with wire defaults already applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub is_correct: bool,
    pub feedback_items: Vec<String>,
    pub annotated_image: Option<Arc<Vec<u8>>>,
}

impl From<AnalyzeResponse> for AnalysisResult {
    fn from(response: AnalyzeResponse) -> Self {
        let annotated_image = response.frame_with_landmarks.as_deref().and_then(|url| {
            let decoded = decode_data_url(url);
            if decoded.is_none() {
                debug!("Ignoring undecodable frameWithLandmarks ({} chars)", url.len());
            }
            decoded.map(Arc::new)
        });

        Self {
            is_correct: response.is_correct,
            feedback_items: response.feedback,
            annotated_image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gets_defaults() {
        let response = AnalyzeResponse::from_json(&serde_json::json!({})).unwrap();
        let result = AnalysisResult::from(response);

        assert!(!result.is_correct);
        assert!(result.feedback_items.is_empty());
        assert!(result.annotated_image.is_none());
    }

    #[test]
    fn test_null_and_mistyped_fields_get_defaults() {
        let value = serde_json::json!({"isCorrect": null, "feedback": null});
        assert_eq!(
            AnalyzeResponse::from_json(&value),
            Some(AnalyzeResponse::default())
        );

        let value = serde_json::json!({"isCorrect": "yes", "feedback": ["Lift", 7, null]});
        let response = AnalyzeResponse::from_json(&value).unwrap();
        assert!(!response.is_correct);
        assert_eq!(response.feedback, vec!["Lift"]);
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert_eq!(AnalyzeResponse::from_json(&serde_json::json!([1, 2])), None);
        assert_eq!(AnalyzeResponse::from_json(&serde_json::json!("ok")), None);
    }

    #[test]
    fn test_full_response() {
        let body = r#"{
            "isCorrect": true,
            "feedback": ["Great job! Your pose is well-aligned."],
            "frameWithLandmarks": "data:image/jpeg;base64,AQID",
            "extra": 42
        }"#;
        let value: Value = serde_json::from_str(body).unwrap();
        let result = AnalysisResult::from(AnalyzeResponse::from_json(&value).unwrap());

        assert!(result.is_correct);
        assert_eq!(result.feedback_items, vec!["Great job! Your pose is well-aligned."]);
        assert_eq!(result.annotated_image.as_deref(), Some(&vec![1u8, 2, 3]));
    }

    #[test]
    fn test_bad_landmark_image_is_dropped() {
        let value = serde_json::json!({
            "isCorrect": false,
            "frameWithLandmarks": "data:image/jpeg;base64,@@"
        });
        let result = AnalysisResult::from(AnalyzeResponse::from_json(&value).unwrap());
        assert!(result.annotated_image.is_none());
    }

    #[test]
    fn test_request_shape() {
        let request = AnalyzeRequest {
            frame: "data:image/jpeg;base64,AQID".to_string(),
            pose: "Tree Pose".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["frame"], "data:image/jpeg;base64,AQID");
        assert_eq!(json["pose"], "Tree Pose");
    }
}
