use super::{runtime, SessionController, SessionState, SessionSummary};
use crate::error::Result;
use crate::events::SessionEvent;
use chrono::Utc;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl SessionController {
    /// Open the media source and begin ticking.
    ///
    /// If the source cannot be opened the session stays idle, a
    /// `CameraError` event is published and the error is returned.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_active() {
            warn!("Session is already active");
            return Ok(());
        }

        {
            let mut media = self.media.lock().await;
            if let Err(e) = media.open().await {
                error!("Failed to open {}: {}", media.describe(), e);
                self.shared.events.notify(SessionEvent::CameraError {
                    message: e.to_string(),
                    timestamp: SystemTime::now(),
                });
                return Err(e.into());
            }
            info!("Media source opened: {}", media.describe());
        }

        let session_id = Uuid::new_v4().to_string();
        {
            let mut core = self.shared.core.lock();
            core.begin_selection();
            core.elapsed_ticks = 0;
            core.session.state = SessionState::Active;
            core.session.session_id = Some(session_id.clone());
            core.session.started_at = Some(Utc::now());
        }

        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        self.runtime = Some(runtime::spawn(
            Arc::clone(&self.shared),
            Arc::clone(&self.media),
            tick_rx,
        ));
        self.scheduler.start(self.shared.tick_interval, move |tick| {
            if tick_tx.send(tick).is_err() {
                debug!("Tick {} dropped: session runtime has exited", tick.index);
            }
        });

        self.shared.publish_snapshot();
        self.shared.events.notify(SessionEvent::CameraStarted {
            session_id: session_id.clone(),
            timestamp: SystemTime::now(),
        });

        info!(
            "Session {} started ({}ms ticks)",
            session_id,
            self.shared.tick_interval.as_millis()
        );
        Ok(())
    }

    /// Stop ticking, release the media source and return the summary.
    ///
    /// The best hold survives for the summary; the running hold and the
    /// elapsed counter are zeroed. Returns `None` when already idle.
    pub async fn stop(&mut self) -> Result<Option<SessionSummary>> {
        if !self.is_active() {
            debug!("Stop requested while idle");
            return Ok(None);
        }

        self.scheduler.stop().await;
        if let Some(runtime) = self.runtime.take() {
            runtime.cancel.cancel();
            if let Err(e) = runtime.task.await {
                warn!("Session runtime ended abnormally: {}", e);
            }
        }

        let summary = {
            let mut core = self.shared.core.lock();
            core.cancel_pending();

            let elapsed_seconds =
                core.elapsed_ticks as f64 * self.shared.tick_interval.as_secs_f64();
            core.hold.interrupt();
            core.elapsed_ticks = 0;
            core.session.state = SessionState::Idle;
            core.session.started_at = None;

            SessionSummary {
                session_id: core.session.session_id.take().unwrap_or_default(),
                pose_id: core.session.selected_pose_id.clone(),
                best_hold_seconds: core.hold.state().best_hold_seconds,
                elapsed_seconds,
                ended_at: Utc::now(),
            }
        };

        {
            let mut media = self.media.lock().await;
            if let Err(e) = media.close().await {
                warn!("Failed to release {}: {}", media.describe(), e);
            }
        }

        self.shared.publish_snapshot();
        self.shared.events.notify(SessionEvent::SessionEnded {
            summary: summary.clone(),
        });

        info!(
            "Session {} stopped after {:.0}s",
            summary.session_id, summary.elapsed_seconds
        );
        Ok(Some(summary))
    }

    /// Select the target pose. Allowed in either state.
    ///
    /// Resets hold progress and clears feedback; any in-flight analysis for
    /// the previous pose is cancelled. The media source is not touched.
    pub fn select_pose(&self, pose_id: &str) -> Result<()> {
        let entry = self.shared.catalog.resolve(pose_id)?;

        {
            let mut core = self.shared.core.lock();
            core.begin_selection();
            core.session.selected_pose_id = Some(entry.id.clone());
        }

        self.shared.publish_snapshot();
        self.shared.events.notify(SessionEvent::PoseSelected {
            pose_id: entry.id.clone(),
            reference_image: entry.reference_image.clone(),
            timestamp: SystemTime::now(),
        });

        info!("Pose selected: {}", entry.id);
        Ok(())
    }

    /// Select the next (or previous) pose in catalog order
    pub fn cycle_pose(&self, backwards: bool) -> Result<String> {
        let current = self.selected_pose();
        let next = self
            .shared
            .catalog
            .next_after(current.as_deref(), backwards)
            .to_string();
        self.select_pose(&next)?;
        Ok(next)
    }
}
