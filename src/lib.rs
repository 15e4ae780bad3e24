//! Peer-to-peer transfer session management over an external transport
//! engine.
//!
//! One side offers a file ("seed"), the other retrieves it ("download"),
//! identified by a shareable magnet-style locator. The engine owns the
//! wire protocol and delivers events on its own background context; this
//! crate owns the hard part around it: tracking live sessions, keeping
//! the request-id / content-hash identity maps consistent under
//! concurrency, routing asynchronous engine events to the right logical
//! request, and tearing sessions down exactly once.
//!
//! Entry point is [`TransferManager`]: construct it with an engine
//! adapter, consume the returned [`TransferNotification`] stream, and
//! call [`start_seeding`](TransferManager::start_seeding) /
//! [`start_download`](TransferManager::start_download).

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod manager;
pub mod registry;
pub mod router;
mod shutdown;

#[cfg(test)]
pub(crate) mod testkit;

pub use config::ManagerConfig;
pub use engine::events::{EngineEvent, SessionStatus};
pub use engine::{DescriptorOptions, SessionHandle, TransportEngine};
pub use error::{RegistryError, TransferError};
pub use manager::TransferManager;
pub use registry::SessionRegistry;
pub use router::{TransferNotification, TransferPhase};
