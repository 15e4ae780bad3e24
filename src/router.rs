//! Event router: the single consumer of the transport engine's event
//! stream.
//!
//! Each engine event is classified, resolved against the session
//! registry, and translated into a [`TransferNotification`] for
//! observers. Events for sessions the registry does not know are an
//! expected race (already cleaned up, or not yet registered) and are
//! dropped silently. Terminal events always tear the session down,
//! resolved or not, using the handle carried by the event itself —
//! otherwise the engine would keep orphaned sessions alive forever.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::engine::events::{EngineEvent, SessionStatus};
use crate::engine::{SessionHandle, TransportEngine};
use crate::registry::SessionRegistry;
use crate::shutdown::ShutdownSignal;

// ── Outbound notifications ───────────────────────────────────────────────────

/// Direction of a transfer as seen in a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// The session is seeding: upload complete, serving peers.
    Sending,
    /// The session is still fetching pieces.
    Receiving,
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sending => f.write_str("sending"),
            Self::Receiving => f.write_str("receiving"),
        }
    }
}

/// Notification emitted to external observers (UI, alerting).
///
/// For any request id, `Completed` or `Failed` is final: no further
/// notification for that id follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferNotification {
    Progress {
        request_id: String,
        phase: TransferPhase,
        /// Peer and rate summary, e.g. `Peers: 3 | Down: 512 KB/s | Up: 0 KB/s`.
        summary: String,
        /// Whole percentage in `0..=100`.
        percent: u8,
        bytes_transferred: u64,
    },
    Completed {
        request_id: String,
    },
    Failed {
        request_id: String,
        message: String,
    },
}

/// Progress percentage for a status snapshot.
///
/// Zero while the total wanted size is unknown, otherwise
/// `floor(done * 100 / wanted)` clamped to 100.
pub(crate) fn progress_percent(total_done: u64, total_wanted: u64) -> u8 {
    if total_wanted == 0 {
        return 0;
    }
    let pct = (total_done as u128 * 100) / total_wanted as u128;
    pct.min(100) as u8
}

// ── Router ───────────────────────────────────────────────────────────────────

pub(crate) struct EventRouter {
    registry: Arc<SessionRegistry>,
    engine: Arc<dyn TransportEngine>,
    notify_tx: mpsc::UnboundedSender<TransferNotification>,
}

impl EventRouter {
    pub(crate) fn new(
        registry: Arc<SessionRegistry>,
        engine: Arc<dyn TransportEngine>,
        notify_tx: mpsc::UnboundedSender<TransferNotification>,
    ) -> Self {
        Self {
            registry,
            engine,
            notify_tx,
        }
    }

    /// Spawn the router task. It exits when shutdown is signaled or the
    /// engine drops its side of the event channel.
    pub(crate) fn spawn(
        self,
        mut events: mpsc::UnboundedReceiver<EngineEvent>,
        stop: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.wait() => break,
                    ev = events.recv() => match ev {
                        Some(ev) => self.handle_event(ev),
                        None => break,
                    },
                }
            }
            debug!(event = "router_stopped", "Event router task exited");
        })
    }

    fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::StateUpdate(statuses) => self.handle_state_update(statuses),
            EngineEvent::SessionFinished { handle } => self.handle_finished(handle),
            EngineEvent::SessionError { handle, message } => self.handle_error(handle, message),
            // Informational kinds carry no routing obligation.
            EngineEvent::PeerCountChanged { .. } | EngineEvent::ListenStarted { .. } => {}
        }
    }

    fn handle_state_update(&self, statuses: Vec<SessionStatus>) {
        for status in statuses {
            let Some(request_id) = self.registry.lookup_by_hash(&status.content_hash) else {
                // Untracked session, e.g. removed while the snapshot was
                // in flight.
                trace!(
                    event = "status_unresolved",
                    content_hash = %status.content_hash,
                    "Dropping status for untracked session"
                );
                continue;
            };

            let phase = if status.seeding {
                TransferPhase::Sending
            } else {
                TransferPhase::Receiving
            };
            let summary = format!(
                "Peers: {} | Down: {} KB/s | Up: {} KB/s",
                status.num_peers,
                status.download_rate / 1024,
                status.upload_rate / 1024
            );

            self.emit(TransferNotification::Progress {
                request_id,
                phase,
                summary,
                percent: progress_percent(status.total_done, status.total_wanted),
                bytes_transferred: status.total_done,
            });
        }
    }

    fn handle_finished(&self, handle: SessionHandle) {
        if let Some((request_id, _)) = self.registry.remove_by_hash(handle.content_hash()) {
            debug!(
                event = "transfer_finished",
                request_id = %request_id,
                content_hash = %handle.content_hash(),
                "Transfer finished"
            );
            self.emit(TransferNotification::Completed { request_id });
        }
        self.remove_from_engine(&handle);
    }

    fn handle_error(&self, handle: SessionHandle, message: String) {
        if let Some((request_id, _)) = self.registry.remove_by_hash(handle.content_hash()) {
            error!(
                event = "transfer_error",
                request_id = %request_id,
                error = %message,
                "Transfer failed"
            );
            self.emit(TransferNotification::Failed {
                request_id,
                message: format!("Transfer failed: {message}"),
            });
        }
        self.remove_from_engine(&handle);
    }

    /// Terminal teardown in the engine. Runs whether or not the registry
    /// resolved the event, so a session unknown to us cannot linger.
    fn remove_from_engine(&self, handle: &SessionHandle) {
        if handle.is_valid() {
            self.engine.remove_session(handle);
        }
    }

    fn emit(&self, notification: TransferNotification) {
        // An absent observer must not stop teardown; a closed channel is
        // fine to ignore.
        let _ = self.notify_tx.send(notification);
    }
}
