mod lifecycle;
mod runtime;
mod types;

pub use types::{Session, SessionSnapshot, SessionState, SessionSummary};

use crate::analysis::AnalysisClient;
use crate::camera::MediaSource;
use crate::catalog::PoseCatalog;
use crate::config::SessionConfig;
use crate::events::{EventBus, SessionEvent};
use crate::hold::{HoldState, HoldTimer};
use crate::overlay::{OverlayComposer, OverlayInstruction};
use crate::scheduler::CaptureScheduler;
use parking_lot::Mutex;
use runtime::{PendingAnalysis, RuntimeHandle};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Everything the controller mutates, behind one lock.
///
/// Only the controller's operations and its tick runtime touch this.
struct SessionCore {
    session: Session,
    hold: HoldTimer,
    elapsed_ticks: u64,
    feedback_items: Vec<String>,
    overlay: Option<OverlayInstruction>,
    overlay_image: Option<Arc<Vec<u8>>>,
    pending: Option<PendingAnalysis>,
    /// Bumped whenever hold progress is reset for a new selection or session
    selection: u64,
}

impl SessionCore {
    /// Cancel the in-flight analysis, if any; its result will be discarded
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!("Cancelling analysis for tick {}", pending.tick);
            pending.cancel.cancel();
        }
    }

    /// Start over for a new selection; work begun for the old one is dropped
    fn begin_selection(&mut self) {
        self.cancel_pending();
        self.selection = self.selection.wrapping_add(1);
        self.hold.reset();
        self.clear_feedback();
    }

    fn clear_feedback(&mut self) {
        self.feedback_items.clear();
        self.overlay = None;
        self.overlay_image = None;
    }
}

/// State shared between the controller and its tick runtime
struct SessionShared {
    core: Mutex<SessionCore>,
    snapshots: watch::Sender<SessionSnapshot>,
    events: EventBus,
    client: AnalysisClient,
    catalog: PoseCatalog,
    composer: OverlayComposer,
    tick_interval: Duration,
}

impl SessionShared {
    fn build_snapshot(&self, core: &SessionCore) -> SessionSnapshot {
        let hold = core.hold.state();
        let reference_image = core
            .session
            .selected_pose_id
            .as_deref()
            .and_then(|id| self.catalog.reference_image(id))
            .map(str::to_string);

        SessionSnapshot {
            state: core.session.state,
            session_id: core.session.session_id.clone(),
            selected_pose_id: core.session.selected_pose_id.clone(),
            reference_image,
            elapsed_ticks: core.elapsed_ticks,
            elapsed_seconds: core.elapsed_ticks as f64 * self.tick_interval.as_secs_f64(),
            current_hold_seconds: hold.current_hold_seconds,
            best_hold_seconds: hold.best_hold_seconds,
            feedback_items: core.feedback_items.clone(),
            overlay: core.overlay.clone(),
            overlay_image: core.overlay_image.clone(),
        }
    }

    /// Push the current state to snapshot watchers
    fn publish_snapshot(&self) {
        let snapshot = {
            let core = self.core.lock();
            self.build_snapshot(&core)
        };
        self.snapshots.send_replace(snapshot);
    }
}

/// Owns one coaching session: the media source, the capture schedule,
/// hold bookkeeping and the overlay shown to the user.
///
/// `start`, `stop` and `select_pose` are the only ways to change session
/// state; per-tick updates come from the runtime task spawned by `start`.
pub struct SessionController {
    shared: Arc<SessionShared>,
    media: Arc<tokio::sync::Mutex<Box<dyn MediaSource>>>,
    scheduler: CaptureScheduler,
    runtime: Option<RuntimeHandle>,
}

impl SessionController {
    pub fn new(
        media: Box<dyn MediaSource>,
        client: AnalysisClient,
        catalog: PoseCatalog,
        config: &SessionConfig,
    ) -> Self {
        let tick_interval = config.tick_interval();
        let core = SessionCore {
            session: Session::default(),
            hold: HoldTimer::new(tick_interval),
            elapsed_ticks: 0,
            feedback_items: Vec::new(),
            overlay: None,
            overlay_image: None,
            pending: None,
            selection: 0,
        };
        let (snapshots, _) = watch::channel(SessionSnapshot::default());

        Self {
            shared: Arc::new(SessionShared {
                core: Mutex::new(core),
                snapshots,
                events: EventBus::new(config.event_bus_capacity),
                client,
                catalog,
                composer: OverlayComposer::new(),
                tick_interval,
            }),
            media: Arc::new(tokio::sync::Mutex::new(media)),
            scheduler: CaptureScheduler::new(),
            runtime: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.core.lock().session.state
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn selected_pose(&self) -> Option<String> {
        self.shared.core.lock().session.selected_pose_id.clone()
    }

    pub fn hold_state(&self) -> HoldState {
        self.shared.core.lock().hold.state()
    }

    /// Current session state, built fresh
    pub fn snapshot(&self) -> SessionSnapshot {
        let core = self.shared.core.lock();
        self.shared.build_snapshot(&core)
    }

    /// Watch per-tick state changes
    pub fn subscribe_snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Receive discrete session notifications
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn catalog(&self) -> &PoseCatalog {
        &self.shared.catalog
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.tick_interval
    }
}

/// Dropping an active controller stops ticking but cannot release the media
/// source, which needs an async close; call `stop()` first.
impl Drop for SessionController {
    fn drop(&mut self) {
        if self.is_active() {
            tracing::warn!("Session controller dropped while active; media source left open");
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.cancel.cancel();
        }
        self.shared.core.lock().cancel_pending();
    }
}
