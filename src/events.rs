use crate::error::EventBusError;
use crate::session::SessionSummary;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Notifications for the presentation layer.
///
/// Continuous per-tick state goes through the session snapshot channel;
/// these are the discrete moments worth a toast.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Media source opened and the tick schedule is running
    CameraStarted {
        session_id: String,
        timestamp: SystemTime,
    },
    /// Media source could not be opened; the session stays idle
    CameraError { message: String, timestamp: SystemTime },
    /// A pose was selected (hold progress was reset)
    PoseSelected {
        pose_id: String,
        reference_image: String,
        timestamp: SystemTime,
    },
    /// Session stopped; carries the final summary
    SessionEnded { summary: SessionSummary },
}

impl SessionEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> SystemTime {
        match self {
            SessionEvent::CameraStarted { timestamp, .. } => *timestamp,
            SessionEvent::CameraError { timestamp, .. } => *timestamp,
            SessionEvent::PoseSelected { timestamp, .. } => *timestamp,
            SessionEvent::SessionEnded { summary } => summary.ended_at.into(),
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::CameraStarted { .. } => {
                "Your camera feed is now active. Strike your pose!".to_string()
            }
            SessionEvent::CameraError { .. } => {
                "Could not access camera. Please check permissions.".to_string()
            }
            SessionEvent::PoseSelected { pose_id, .. } => {
                format!("Selected: {}. Get ready to strike the pose!", pose_id)
            }
            SessionEvent::SessionEnded { summary } => summary.message(),
        }
    }

    /// Short title for the event
    pub fn title(&self) -> &'static str {
        match self {
            SessionEvent::CameraStarted { .. } => "Camera Started",
            SessionEvent::CameraError { .. } => "Camera Error",
            SessionEvent::PoseSelected { .. } => "Pose Selected",
            SessionEvent::SessionEnded { .. } => "Session Ended",
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::CameraStarted { .. } => "camera_started",
            SessionEvent::CameraError { .. } => "camera_error",
            SessionEvent::PoseSelected { .. } => "pose_selected",
            SessionEvent::SessionEnded { .. } => "session_ended",
        }
    }
}

/// Event bus for presentation notifications using a broadcast channel
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: SessionEvent) -> Result<usize, EventBusError> {
        match &event {
            SessionEvent::CameraError { message, .. } => {
                error!("Camera error: {}", message);
            }
            SessionEvent::SessionEnded { summary } => {
                info!("{}", summary.message());
            }
            _ => {
                debug!("Event: {}", event.description());
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Publish, treating "nobody is listening" as fine
    pub fn notify(&self, event: SessionEvent) {
        let event_type = event.event_type();
        if let Err(e) = self.publish(event) {
            debug!("No subscribers for {} event: {}", event_type, e);
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Receive the next event, skipping over lag
pub async fn recv_event(
    receiver: &mut broadcast::Receiver<SessionEvent>,
) -> Result<SessionEvent, EventBusError> {
    loop {
        match receiver.recv().await {
            Ok(event) => return Ok(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event receiver lagged behind by {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => {
                return Err(EventBusError::ChannelClosed);
            }
        }
    }
}
