use super::{SessionShared, SessionState};
use crate::analysis::AnalysisResult;
use crate::camera::MediaSource;
use crate::frame::FrameSample;
use crate::scheduler::Tick;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

type SharedMedia = Arc<tokio::sync::Mutex<Box<dyn MediaSource>>>;

/// The analysis request currently allowed to update the session
pub(super) struct PendingAnalysis {
    pub tick: u64,
    pub cancel: CancellationToken,
}

/// A finished analysis request on its way back to the runtime
struct AnalysisCompletion {
    tick: u64,
    frame: FrameSample,
    result: Option<AnalysisResult>,
}

/// The running tick loop of an active session
pub(super) struct RuntimeHandle {
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

/// Spawn the loop that serializes ticks and analysis completions.
///
/// Every state change for a tick happens on this one task, so results are
/// applied in tick order and never concurrently.
pub(super) fn spawn(
    shared: Arc<SessionShared>,
    media: SharedMedia,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
) -> RuntimeHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<AnalysisCompletion>();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                Some(done) = done_rx.recv() => shared.apply_completion(done),
                tick = ticks.recv() => match tick {
                    Some(tick) => shared.on_tick(tick, &media, &done_tx).await,
                    None => break,
                },
            }
        }

        debug!("Session runtime exited");
    });

    RuntimeHandle { cancel, task }
}

impl SessionShared {
    /// One capture+analyze cycle. Capture failures make the tick a no-op.
    async fn on_tick(
        &self,
        tick: Tick,
        media: &SharedMedia,
        done_tx: &mpsc::UnboundedSender<AnalysisCompletion>,
    ) {
        let (pose_id, selection) = {
            let mut core = self.core.lock();
            if core.session.state != SessionState::Active {
                return;
            }
            core.elapsed_ticks += 1;
            (core.session.selected_pose_id.clone(), core.selection)
        };
        self.publish_snapshot();

        let Some(pose_id) = pose_id else {
            trace!("Tick {}: no pose selected", tick.index);
            return;
        };

        let captured = media.lock().await.capture();
        let frame = match captured {
            Ok(bytes) => FrameSample::new(tick.index, bytes),
            Err(e) => {
                warn!("Tick {}: frame capture failed: {}", tick.index, e);
                return;
            }
        };

        let cancel = CancellationToken::new();
        {
            let mut core = self.core.lock();
            // The pose may have been reselected while the frame was captured
            if core.session.state != SessionState::Active || core.selection != selection {
                debug!("Tick {}: selection changed during capture, skipping", tick.index);
                return;
            }
            core.cancel_pending();
            core.pending = Some(PendingAnalysis {
                tick: tick.index,
                cancel: cancel.clone(),
            });
        }

        let client = self.client.clone();
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Analysis for tick {} cancelled", frame.captured_at_tick);
                    return;
                }
                result = client.analyze(&frame, &pose_id) => result,
            };

            let _ = done_tx.send(AnalysisCompletion {
                tick: frame.captured_at_tick,
                frame,
                result,
            });
        });
    }

    /// Apply a finished analysis if it is still the pending one
    fn apply_completion(&self, done: AnalysisCompletion) {
        {
            let mut core = self.core.lock();

            let is_pending = core
                .pending
                .as_ref()
                .is_some_and(|pending| pending.tick == done.tick);
            if core.session.state != SessionState::Active || !is_pending {
                debug!("Discarding stale analysis result for tick {}", done.tick);
                return;
            }
            core.pending = None;

            let Some(result) = done.result else {
                // No result: keep the previous overlay and hold progress
                return;
            };

            let hold = core.hold.update(&result, done.tick);
            let overlay = self.composer.compose(&result);

            core.overlay_image = Some(
                overlay
                    .source_image
                    .clone()
                    .unwrap_or_else(|| Arc::clone(&done.frame.image_bytes)),
            );
            core.feedback_items = result.feedback_items;
            core.overlay = Some(overlay);

            debug!(
                "Tick {} applied: correct={} hold={:.1}s best={:.1}s",
                done.tick,
                result.is_correct,
                hold.current_hold_seconds,
                hold.best_hold_seconds
            );
        }

        self.publish_snapshot();
    }
}
