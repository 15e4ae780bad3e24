//! Shared test fixtures: a scripted in-memory transport engine and a
//! self-cleaning temp directory.

use sha3::{Digest, Sha3_256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::engine::events::EngineEvent;
use crate::engine::{DescriptorOptions, SessionHandle, TransportEngine};

/// Initialize tracing for test output. Safe to call repeatedly.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Temp directory guard ─────────────────────────────────────────────────────

/// Unique temp directory removed on drop.
pub(crate) struct TestDir {
    path: PathBuf,
}

impl TestDir {
    pub(crate) fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("peerdrop-{label}-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&path).expect("create test dir");
        Self { path }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path.join(name);
        std::fs::write(&path, contents).expect("write test file");
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

// ── Scripted fake engine ─────────────────────────────────────────────────────

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug)]
struct FakeSession {
    sequential: bool,
}

/// In-memory [`TransportEngine`] with scriptable failure modes.
///
/// Content hashes are SHA3-256 over the descriptor bytes, truncated to
/// 40 hex chars so they look like the engine's session labels.
pub(crate) struct FakeEngine {
    started: AtomicBool,
    fail_descriptor: AtomicBool,
    fail_sessions: AtomicBool,
    next_id: AtomicU64,
    removed: AtomicUsize,
    sessions: Mutex<HashMap<u64, FakeSession>>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<EngineEvent>>>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            started: AtomicBool::new(false),
            fail_descriptor: AtomicBool::new(false),
            fail_sessions: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            removed: AtomicUsize::new(0),
            sessions: Mutex::new(HashMap::new()),
            events_tx: tx,
            events_rx: Mutex::new(Some(rx)),
        }
    }

    /// Make every subsequent `build_descriptor` call fail.
    pub(crate) fn fail_descriptor_builds(&self) {
        self.fail_descriptor.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `begin_*` call return the invalid sentinel.
    pub(crate) fn fail_session_creation(&self) {
        self.fail_sessions.store(true, Ordering::SeqCst);
    }

    /// Inject a synthetic engine event, as the real engine would from
    /// its background context.
    pub(crate) fn push_event(&self, event: EngineEvent) {
        self.events_tx.send(event).expect("event channel open");
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Number of `remove_session` calls observed.
    pub(crate) fn removed_count(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    /// Sessions still live inside the fake engine.
    pub(crate) fn live_session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub(crate) fn is_sequential(&self, handle: &SessionHandle) -> bool {
        self.sessions
            .lock()
            .unwrap()
            .get(&handle.raw())
            .map(|s| s.sequential)
            .unwrap_or(false)
    }

    fn content_hash_of(descriptor: &[u8]) -> String {
        let digest = Sha3_256::digest(descriptor);
        hex_of(&digest[..20])
    }

    fn create_session(&self, content_hash: String, display_name: String) -> SessionHandle {
        if self.fail_sessions.load(Ordering::SeqCst) {
            return SessionHandle::invalid();
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sessions
            .lock()
            .unwrap()
            .insert(id, FakeSession { sequential: false });
        SessionHandle::new(id, content_hash, display_name)
    }
}

impl TransportEngine for FakeEngine {
    fn start_session(&self) -> anyhow::Result<()> {
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_session(&self) {
        self.started.store(false, Ordering::SeqCst);
        self.sessions.lock().unwrap().clear();
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<EngineEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    fn build_descriptor(&self, source: &Path, opts: &DescriptorOptions) -> anyhow::Result<Vec<u8>> {
        if self.fail_descriptor.load(Ordering::SeqCst) {
            anyhow::bail!("engine refused to lay out descriptor");
        }
        let contents = std::fs::read(source)?;
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let body = format!(
            "peerdrop-descriptor\ncreator={}\nprivate={}\nname={name}\nlength={}\nsha3={}\n",
            opts.creator,
            opts.private,
            contents.len(),
            hex_of(&Sha3_256::digest(&contents)),
        );
        Ok(body.into_bytes())
    }

    fn begin_seeding(&self, descriptor: &[u8], _base_dir: &Path) -> SessionHandle {
        let text = String::from_utf8_lossy(descriptor);
        let name = text
            .lines()
            .find_map(|l| l.strip_prefix("name="))
            .unwrap_or_default()
            .to_string();
        self.create_session(Self::content_hash_of(descriptor), name)
    }

    fn begin_download(&self, locator: &str, _save_dir: &Path) -> SessionHandle {
        let Some(rest) = locator.strip_prefix("magnet:?xt=urn:btih:") else {
            return SessionHandle::invalid();
        };
        let hash = rest.split('&').next().unwrap_or_default();
        if hash.is_empty() {
            return SessionHandle::invalid();
        }
        let name = rest
            .split('&')
            .find_map(|p| p.strip_prefix("dn="))
            .unwrap_or_default();
        self.create_session(hash.to_string(), name.to_string())
    }

    fn remove_session(&self, handle: &SessionHandle) {
        self.removed.fetch_add(1, Ordering::SeqCst);
        self.sessions.lock().unwrap().remove(&handle.raw());
    }

    fn set_sequential(&self, handle: &SessionHandle, sequential: bool) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(&handle.raw()) {
            session.sequential = sequential;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_engine_round_trip() {
        let dir = TestDir::new("fake-engine");
        let source = dir.write_file("file.bin", b"0123456789");
        let engine = FakeEngine::new();
        let opts = DescriptorOptions {
            creator: "peerdrop".to_string(),
            private: true,
        };

        let descriptor = engine.build_descriptor(&source, &opts).unwrap();
        let seed = engine.begin_seeding(&descriptor, dir.path());
        assert!(seed.is_valid());
        assert_eq!(seed.content_hash().len(), 40);

        let download = engine.begin_download(&seed.to_locator(), dir.path());
        assert!(download.is_valid());
        assert_eq!(download.content_hash(), seed.content_hash());
        assert_eq!(engine.live_session_count(), 2);
    }

    #[test]
    fn test_event_stream_single_consumer() {
        let engine = FakeEngine::new();
        assert!(engine.take_events().is_some());
        assert!(engine.take_events().is_none());
    }
}
