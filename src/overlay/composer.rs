use crate::analysis::AnalysisResult;
use serde::Serialize;
use std::sync::Arc;

pub const INSTRUCTIONS_TITLE: &str = "Instructions:";
pub const HOLD_MESSAGE: &str = "Great! Hold this pose";
pub const ADJUST_MESSAGE: &str = "Adjust your position to match the reference pose";
pub const BULLET: &str = "\u{2022} ";

/// Content of the feedback box drawn over the video frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayInstruction {
    pub title: String,
    pub lines: Vec<String>,
    /// Annotated frame from the service; `None` means draw over the raw frame
    #[serde(skip)]
    pub source_image: Option<Arc<Vec<u8>>>,
}

impl OverlayInstruction {
    /// Whether the lines come from service feedback (drives box sizing)
    pub fn has_feedback(&self) -> bool {
        self.lines.iter().any(|line| line.starts_with(BULLET))
    }
}

/// Stateless mapping from an analysis result to overlay content
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayComposer;

impl OverlayComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, result: &AnalysisResult) -> OverlayInstruction {
        let lines = if !result.feedback_items.is_empty() {
            result
                .feedback_items
                .iter()
                .map(|item| format!("{}{}", BULLET, item))
                .collect()
        } else if result.is_correct {
            vec![HOLD_MESSAGE.to_string()]
        } else {
            vec![ADJUST_MESSAGE.to_string()]
        };

        OverlayInstruction {
            title: INSTRUCTIONS_TITLE.to_string(),
            lines,
            source_image: result.annotated_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_lines_are_bulleted() {
        let result = AnalysisResult {
            is_correct: true,
            feedback_items: vec![
                "Try raising your right elbow a bit.".to_string(),
                "Almost perfect! Just fine-tune your left knee.".to_string(),
            ],
            annotated_image: None,
        };

        let overlay = OverlayComposer::new().compose(&result);

        assert_eq!(overlay.title, "Instructions:");
        assert_eq!(
            overlay.lines,
            vec![
                "\u{2022} Try raising your right elbow a bit.",
                "\u{2022} Almost perfect! Just fine-tune your left knee.",
            ]
        );
        assert!(overlay.has_feedback());
    }

    #[test]
    fn test_correct_without_feedback() {
        let result = AnalysisResult {
            is_correct: true,
            ..AnalysisResult::default()
        };
        let overlay = OverlayComposer::new().compose(&result);

        assert_eq!(overlay.lines, vec![HOLD_MESSAGE]);
        assert!(!overlay.has_feedback());
    }

    #[test]
    fn test_incorrect_without_feedback() {
        let overlay = OverlayComposer::new().compose(&AnalysisResult::default());
        assert_eq!(overlay.lines, vec![ADJUST_MESSAGE]);
        assert!(overlay.source_image.is_none());
    }

    #[test]
    fn test_annotated_image_passed_through() {
        let image = Arc::new(vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let result = AnalysisResult {
            annotated_image: Some(Arc::clone(&image)),
            ..AnalysisResult::default()
        };

        let overlay = OverlayComposer::new().compose(&result);
        assert_eq!(overlay.source_image, Some(image));
    }
}
