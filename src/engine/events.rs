//! Asynchronous event vocabulary of the transport engine.
//!
//! Events are delivered on the engine's own background context through
//! an unbounded channel obtained once via
//! [`TransportEngine::take_events`](super::TransportEngine::take_events).
//! Channel order preserves the engine's emission order.

use super::SessionHandle;

/// One session's status inside a periodic state-update batch.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Hex content hash the engine labels this session with.
    pub content_hash: String,
    /// True while the session is seeding (upload-complete) rather than
    /// still fetching pieces.
    pub seeding: bool,
    /// Connected peer count.
    pub num_peers: u32,
    /// Payload download rate in bytes per second.
    pub download_rate: u64,
    /// Payload upload rate in bytes per second.
    pub upload_rate: u64,
    /// Bytes of wanted data already transferred.
    pub total_done: u64,
    /// Total bytes wanted; zero until metadata is known.
    pub total_wanted: u64,
}

/// Events emitted by the transport engine.
///
/// `SessionFinished` and `SessionError` are terminal: the session they
/// name is torn down by the router and no further events for it are
/// meaningful. Kinds the router does not route are informational only.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Periodic batched status snapshot covering every live session.
    StateUpdate(Vec<SessionStatus>),

    /// A session completed its transfer.
    SessionFinished { handle: SessionHandle },

    /// A session hit a fatal transport error.
    SessionError { handle: SessionHandle, message: String },

    /// A peer connected to or disconnected from a session.
    /// Informational; not routed.
    PeerCountChanged { content_hash: String, num_peers: u32 },

    /// The engine bound its listen socket. Informational; not routed.
    ListenStarted { port: u16 },
}
