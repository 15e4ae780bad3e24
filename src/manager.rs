//! Transfer session manager: the facade the rest of the application
//! talks to.
//!
//! Owns the transport engine adapter for its lifetime, registers every
//! session it creates before returning, and leaves all asynchronous
//! progress reporting to the event router. One manager per process is
//! the intended shape; construct it explicitly, hand it to consumers,
//! and a fresh one may be built after `shutdown`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ManagerConfig;
use crate::descriptor;
use crate::engine::{DescriptorOptions, SessionHandle, TransportEngine};
use crate::error::TransferError;
use crate::registry::SessionRegistry;
use crate::router::{EventRouter, TransferNotification};
use crate::shutdown::ShutdownSignal;

pub struct TransferManager {
    engine: Arc<dyn TransportEngine>,
    registry: Arc<SessionRegistry>,
    config: ManagerConfig,
    notify_tx: mpsc::UnboundedSender<TransferNotification>,
    stop: ShutdownSignal,
    router_task: Mutex<Option<JoinHandle<()>>>,
}

impl TransferManager {
    /// Start the engine session, claim its event stream, and spawn the
    /// event router. Returns the manager plus the notification stream
    /// observers consume.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        engine: Arc<dyn TransportEngine>,
        config: ManagerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransferNotification>), TransferError> {
        engine.start_session().map_err(|e| {
            TransferError::SessionInitFailed(format!("engine session failed to start: {e}"))
        })?;

        let events = engine.take_events().ok_or_else(|| {
            TransferError::SessionInitFailed("engine event stream already subscribed".to_string())
        })?;

        let registry = Arc::new(SessionRegistry::new());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let stop = ShutdownSignal::new();

        let router = EventRouter::new(
            Arc::clone(&registry),
            Arc::clone(&engine),
            notify_tx.clone(),
        );
        let router_task = router.spawn(events, stop.clone());

        info!(event = "manager_started", "Transfer session manager started");

        Ok((
            Self {
                engine,
                registry,
                config,
                notify_tx,
                stop,
                router_task: Mutex::new(Some(router_task)),
            },
            notify_rx,
        ))
    }

    /// Build a descriptor for `source`, begin seeding it, register the
    /// session, and return the shareable locator.
    ///
    /// The serialized descriptor is staged in a temp file beside the
    /// source and deleted before this returns, success or not. The
    /// engine stores the session against the source's parent directory
    /// because the descriptor records a path relative to it.
    pub fn start_seeding(&self, source: &Path, request_id: &str) -> Result<String, TransferError> {
        validate_request_id(request_id)?;

        let opts = DescriptorOptions {
            creator: self.config.creator.clone(),
            private: self.config.private_descriptors,
        };
        let staged = descriptor::build(self.engine.as_ref(), source, &opts)?;

        let base_dir = parent_dir(source);
        let handle = self.engine.begin_seeding(staged.bytes(), &base_dir);
        if !handle.is_valid() {
            return Err(TransferError::SessionInitFailed(
                "engine returned an invalid handle for seeding".to_string(),
            ));
        }

        self.register(request_id, &handle)?;

        let locator = handle.to_locator();
        info!(
            event = "seeding_started",
            request_id = %request_id,
            content_hash = %handle.content_hash(),
            "Started seeding"
        );
        Ok(locator)
    }

    /// Begin downloading the content named by `locator` into
    /// `save_directory` (created if absent) and register the session.
    ///
    /// An invalid handle from the engine is reported twice on purpose:
    /// as the returned error and as a `Failed` notification, so
    /// observers that never saw the synchronous call still learn of it.
    pub fn start_download(
        &self,
        locator: &str,
        save_directory: &Path,
        request_id: &str,
    ) -> Result<(), TransferError> {
        validate_request_id(request_id)?;
        if locator.trim().is_empty() {
            return Err(TransferError::InvalidInput("locator is empty".to_string()));
        }

        std::fs::create_dir_all(save_directory).map_err(|e| {
            TransferError::InvalidInput(format!(
                "cannot create save directory {}: {e}",
                save_directory.display()
            ))
        })?;

        let handle = self.engine.begin_download(locator, save_directory);
        if !handle.is_valid() {
            self.emit(TransferNotification::Failed {
                request_id: request_id.to_string(),
                message: "Failed to initialize download session.".to_string(),
            });
            return Err(TransferError::SessionInitFailed(
                "engine returned an invalid handle for download".to_string(),
            ));
        }

        self.register(request_id, &handle)?;

        if self.config.sequential_download {
            // Front-to-back piece order keeps partial progress meaningful.
            self.engine.set_sequential(&handle, true);
        }

        info!(
            event = "download_started",
            request_id = %request_id,
            content_hash = %handle.content_hash(),
            "Started download"
        );
        Ok(())
    }

    /// Tear down a session ahead of its terminal event. Idempotent:
    /// invalid, unknown, and already-removed handles are all no-ops.
    pub fn cleanup(&self, handle: &SessionHandle) {
        if !handle.is_valid() {
            return;
        }
        if let Some((request_id, _)) = self.registry.remove_by_hash(handle.content_hash()) {
            debug!(
                event = "session_cleaned_up",
                request_id = %request_id,
                content_hash = %handle.content_hash(),
                "Removed session"
            );
        }
        self.engine.remove_session(handle);
    }

    /// Handle for a live request id, e.g. to cancel it via [`cleanup`].
    ///
    /// [`cleanup`]: Self::cleanup
    pub fn handle_for(&self, request_id: &str) -> Option<SessionHandle> {
        self.registry.lookup_by_request(request_id)
    }

    /// Live session count, mostly for diagnostics.
    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Stop the router, drop every registry entry, and stop the engine
    /// session. Safe with transfers still active (the engine is the
    /// source of truth for terminating network activity) and safe to
    /// call more than once. A new manager may be constructed afterwards.
    pub async fn shutdown(&self) {
        self.stop.cancel();
        let task = self.router_task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(task) = task {
            let _ = task.await;
        }
        let dropped = self.registry.clear();
        if !dropped.is_empty() {
            info!(
                event = "manager_shutdown",
                dropped_sessions = dropped.len(),
                "Shutting down with sessions still active"
            );
        }
        self.engine.stop_session();
    }

    /// Install the registry entry for a freshly created session. A
    /// duplicate request id or content hash loses the race: the engine
    /// session is removed so nothing leaks, and the caller sees
    /// `SessionInitFailed`.
    fn register(&self, request_id: &str, handle: &SessionHandle) -> Result<(), TransferError> {
        if let Err(e) = self
            .registry
            .insert(request_id, handle.content_hash(), handle.clone())
        {
            warn!(
                event = "session_register_failure",
                request_id = %request_id,
                error = %e,
                "Removing just-created engine session after registry conflict"
            );
            self.engine.remove_session(handle);
            return Err(TransferError::SessionInitFailed(e.to_string()));
        }
        Ok(())
    }

    fn emit(&self, notification: TransferNotification) {
        let _ = self.notify_tx.send(notification);
    }
}

fn validate_request_id(request_id: &str) -> Result<(), TransferError> {
    if request_id.trim().is_empty() {
        return Err(TransferError::InvalidInput("request id is empty".to_string()));
    }
    Ok(())
}

/// Parent directory of a file, falling back to `.` for bare names.
fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
