//! Transport engine adapter boundary.
//!
//! The engine owns the wire-level peer protocol (piece exchange, peer
//! discovery, choking) and runs its own background context. This crate
//! treats it as a black box behind [`TransportEngine`]: begin/remove
//! sessions, build descriptors, and consume its event stream. Session
//! creation reports failure through an invalid-handle sentinel, never
//! through panics or exceptions.

pub mod events;

use std::fmt;
use std::path::Path;
use tokio::sync::mpsc;

use events::EngineEvent;

/// Options applied when the engine lays out and serializes a descriptor.
#[derive(Debug, Clone)]
pub struct DescriptorOptions {
    /// Creator label stamped into the descriptor.
    pub creator: String,
    /// Mark the descriptor private (no public discovery network).
    pub private: bool,
}

/// Opaque reference to a live engine session.
///
/// Valid only between successful creation and removal; after removal the
/// engine ignores it. The invalid sentinel ([`SessionHandle::invalid`])
/// is how `begin_seeding` / `begin_download` report failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    raw: u64,
    content_hash: String,
    display_name: String,
}

impl SessionHandle {
    /// Construct a valid handle. Only engine adapters should call this.
    pub fn new(raw: u64, content_hash: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            raw,
            content_hash: content_hash.into(),
            display_name: display_name.into(),
        }
    }

    /// The sentinel returned by the engine when session creation fails.
    pub fn invalid() -> Self {
        Self {
            raw: 0,
            content_hash: String::new(),
            display_name: String::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.raw != 0 && !self.content_hash.is_empty()
    }

    /// Raw engine-side session id.
    pub fn raw(&self) -> u64 {
        self.raw
    }

    /// Hex content hash the engine derives from the descriptor.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Derive the shareable magnet-style locator for this session.
    ///
    /// Encodes the content hash plus, when known, a display name, which
    /// is enough for a remote peer to join the transfer without the
    /// descriptor file.
    pub fn to_locator(&self) -> String {
        if self.display_name.is_empty() {
            format!("magnet:?xt=urn:btih:{}", self.content_hash)
        } else {
            format!("magnet:?xt=urn:btih:{}&dn={}", self.content_hash, self.display_name)
        }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "session({}, {})", self.raw, self.content_hash)
        } else {
            f.write_str("session(invalid)")
        }
    }
}

/// Capability surface of the external transport engine.
///
/// Implementations wrap a real peer-wire engine; tests script a fake.
/// All methods may be called concurrently from multiple contexts.
pub trait TransportEngine: Send + Sync {
    /// Start the process-wide network session.
    fn start_session(&self) -> anyhow::Result<()>;

    /// Stop the process-wide network session, terminating all transfers.
    /// Idempotent.
    fn stop_session(&self);

    /// Hand over the event stream to its single consumer.
    ///
    /// Returns `None` on every call after the first; exactly one router
    /// may consume engine events.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<EngineEvent>>;

    /// Lay out a single-file storage description for `source`, apply
    /// `opts`, and serialize it to descriptor bytes.
    fn build_descriptor(&self, source: &Path, opts: &DescriptorOptions) -> anyhow::Result<Vec<u8>>;

    /// Begin seeding the content described by `descriptor`, reading
    /// payload data relative to `base_dir`. Returns the invalid sentinel
    /// on failure.
    fn begin_seeding(&self, descriptor: &[u8], base_dir: &Path) -> SessionHandle;

    /// Begin downloading the content named by `locator` into `save_dir`.
    /// Returns the invalid sentinel on failure.
    fn begin_download(&self, locator: &str, save_dir: &Path) -> SessionHandle;

    /// Tear down a session. Best-effort and idempotent: unknown or
    /// already-removed handles are ignored.
    fn remove_session(&self, handle: &SessionHandle);

    /// Toggle deterministic front-to-back piece order for a session.
    fn set_sequential(&self, handle: &SessionHandle, sequential: bool);
}
