use crate::overlay::OverlayInstruction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No media source open
    #[default]
    Idle,
    /// Media source open and the tick schedule running
    Active,
}

/// Session record owned by the controller
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub state: SessionState,
    /// May change in either state
    pub selected_pose_id: Option<String>,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// What the presentation layer needs to draw one frame of session state
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub session_id: Option<String>,
    pub selected_pose_id: Option<String>,
    pub reference_image: Option<String>,
    pub elapsed_ticks: u64,
    pub elapsed_seconds: f64,
    pub current_hold_seconds: f64,
    pub best_hold_seconds: f64,
    pub feedback_items: Vec<String>,
    pub overlay: Option<OverlayInstruction>,
    /// Annotated image for the last applied tick, or that tick's raw frame
    #[serde(skip)]
    pub overlay_image: Option<Arc<Vec<u8>>>,
}

impl SessionSnapshot {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

/// Published once when a session stops
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub pose_id: Option<String>,
    pub best_hold_seconds: f64,
    pub elapsed_seconds: f64,
    pub ended_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Final message shown to the user
    pub fn message(&self) -> String {
        format!("Best hold time: {:.1} seconds", self.best_hold_seconds)
    }
}
