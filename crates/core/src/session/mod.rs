//! Session management: one control connection's authority over one media
//! stream.
//!
//! A session is created when a control connection is accepted and destroyed
//! by TEARDOWN or connection loss. It tracks:
//!
//! - The state machine driven by control commands.
//! - The server-assigned session id (allocated at SETUP, never reused
//!   during the server's lifetime).
//! - The negotiated media destination (peer address + declared port).
//! - The frame source and the per-session datagram socket.
//! - The pacing-thread handle while media is flowing.
//!
//! ## Lifecycle
//!
//! ```text
//! accept         -> Init
//! SETUP          -> Ready      (source opened, socket bound, id assigned)
//! PLAY           -> Playing    (pacing thread spawned)
//! PAUSE          -> Ready      (pacing thread joined, source reclaimed)
//! TEARDOWN       -> Terminated (resources released, connection closes)
//! TCP disconnect -> Terminated (same cleanup)
//! ```
//!
//! A session is owned and mutated by exactly one control thread, so it
//! carries no locks. The pacing thread only uses what was captured at PLAY
//! time and never reaches back into the session.

pub mod pacer;
pub mod transport;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rand::RngExt;

use crate::error::Result;
use crate::server::StreamConfig;
use crate::source::VideoSource;
use crate::transport::MediaSocket;
pub use pacer::Pacer;
pub use transport::TransportHeader;

/// Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Control connection accepted, nothing negotiated yet.
    Init,
    /// SETUP completed: source open, media port known, id assigned.
    Ready,
    /// Media is being delivered by a pacing thread.
    Playing,
    /// TEARDOWN processed (or connection lost). Terminal.
    Terminated,
}

/// What a session operation did with a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command was valid in the current state and was executed.
    Completed,
    /// The command arrived outside its required state. Nothing changed;
    /// the handler still sends a reply saying so.
    Ignored,
}

/// One client's session. Single-writer: only the owning control thread
/// touches it.
pub struct Session {
    state: SessionState,
    id: Option<u32>,
    /// Last accepted client sequence number. Informational only — not
    /// verified, not used for replay protection.
    last_cseq: Option<u32>,
    peer_addr: SocketAddr,
    media_port: Option<u16>,
    resource: Option<PathBuf>,
    source: Option<VideoSource>,
    media_socket: Option<MediaSocket>,
    pacer: Option<Pacer>,
    registry: SessionRegistry,
    config: Arc<StreamConfig>,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, registry: SessionRegistry, config: Arc<StreamConfig>) -> Self {
        Self {
            state: SessionState::Init,
            id: None,
            last_cseq: None,
            peer_addr,
            media_port: None,
            resource: None,
            source: None,
            media_socket: None,
            pacer: None,
            registry,
            config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Server-assigned id, present once SETUP has completed.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    /// Record the client's sequence number from an accepted request.
    pub fn note_cseq(&mut self, cseq: u32) {
        self.last_cseq = Some(cseq);
    }

    pub fn last_cseq(&self) -> Option<u32> {
        self.last_cseq
    }

    /// SETUP: open the named frame source, bind the media socket, allocate
    /// a session id, and record the client's declared media port.
    ///
    /// Valid only in `Init`. A missing source leaves the session in `Init`
    /// with the error propagated (the handler replies 404).
    pub fn setup(&mut self, resource: &str, client_port: u16) -> Result<Outcome> {
        if self.state != SessionState::Init {
            return Ok(Outcome::Ignored);
        }

        let path = self.config.media_root.join(resource);
        let source = VideoSource::open(&path)?;
        let socket = MediaSocket::bind()?;

        let id = self.registry.register(self.peer_addr);

        self.id = Some(id);
        self.media_port = Some(client_port);
        self.resource = Some(path);
        self.source = Some(source);
        self.media_socket = Some(socket);
        self.state = SessionState::Ready;

        tracing::info!(
            session_id = id,
            resource,
            client_port,
            peer = %self.peer_addr,
            "session ready"
        );

        Ok(Outcome::Completed)
    }

    /// PLAY: hand the frame source to a fresh pacing thread.
    ///
    /// Valid only in `Ready`.
    pub fn play(&mut self) -> Outcome {
        if self.state != SessionState::Ready {
            return Outcome::Ignored;
        }
        let Some(id) = self.id else {
            return Outcome::Ignored;
        };
        let Some(port) = self.media_port else {
            return Outcome::Ignored;
        };
        let Some(socket) = self.media_socket.clone() else {
            return Outcome::Ignored;
        };
        let Some(source) = self.source.take() else {
            return Outcome::Ignored;
        };

        let dest = SocketAddr::new(self.peer_addr.ip(), port);
        self.pacer = Some(Pacer::spawn(
            source,
            socket,
            dest,
            id,
            self.config.payload_type,
            self.config.frame_interval,
        ));
        self.state = SessionState::Playing;

        tracing::info!(session_id = id, %dest, "session playing");
        Outcome::Completed
    }

    /// PAUSE: stop the pacing thread and wait for it to exit, then take
    /// the frame source back so a later PLAY resumes where it left off.
    ///
    /// Valid only in `Playing`. The reply must not be written until this
    /// returns — by then the stream is confirmed silent.
    pub fn pause(&mut self) -> Result<Outcome> {
        if self.state != SessionState::Playing {
            return Ok(Outcome::Ignored);
        }
        let Some(pacer) = self.pacer.take() else {
            return Ok(Outcome::Ignored);
        };

        let source = match pacer.stop() {
            Some(source) => source,
            None => {
                // The thread died with the source. Reopen from the start
                // so the session can keep operating.
                let Some(path) = self.resource.clone() else {
                    return Ok(Outcome::Ignored);
                };
                VideoSource::open(path)?
            }
        };

        self.source = Some(source);
        self.state = SessionState::Ready;

        tracing::info!(session_id = ?self.id, "session paused");
        Ok(Outcome::Completed)
    }

    /// TEARDOWN: stop any running pacing thread, release the source and
    /// socket, deregister, and enter the terminal state.
    ///
    /// Valid in every state, and idempotent — disconnect cleanup calls it
    /// too.
    pub fn teardown(&mut self) {
        if let Some(pacer) = self.pacer.take() {
            pacer.stop();
        }
        self.source = None;
        self.media_socket = None;
        self.media_port = None;
        self.resource = None;

        if let Some(id) = self.id.take() {
            self.registry.remove(id);
            tracing::info!(session_id = id, "session terminated");
        }

        self.state = SessionState::Terminated;
    }
}

/// Thread-safe inventory of live sessions, owned by the dispatcher.
///
/// Allocates session ids from a counter seeded randomly at construction,
/// so ids are strictly increasing (never reused while the server lives)
/// without being guessable across restarts. Used for inventory and
/// shutdown accounting only — session state itself lives with the owning
/// control thread.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<u32, SocketAddr>>>,
    next_id: Arc<AtomicU32>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU32::new(rand::rng().random::<u32>())),
        }
    }

    /// Allocate the next session id and record the session's peer.
    pub fn register(&self, peer: SocketAddr) -> u32 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sessions.write().insert(id, peer);

        let total = self.sessions.read().len();
        tracing::debug!(session_id = id, %peer, total_sessions = total, "session registered");

        id
    }

    /// Drop a session from the inventory (TEARDOWN or disconnect).
    pub fn remove(&self, id: u32) -> bool {
        let removed = self.sessions.write().remove(&id).is_some();
        if removed {
            let total = self.sessions.read().len();
            tracing::debug!(session_id = id, total_sessions = total, "session deregistered");
        }
        removed
    }

    pub fn contains(&self, id: u32) -> bool {
        self.sessions.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Ids of all live sessions.
    pub fn ids(&self) -> Vec<u32> {
        self.sessions.read().keys().copied().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_movie(dir: &tempfile::TempDir, name: &str, frames: usize) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        for i in 0..frames {
            let payload = format!("frame-{i:04}");
            write!(file, "{:05}", payload.len()).unwrap();
            file.write_all(payload.as_bytes()).unwrap();
        }
    }

    fn test_session(dir: &tempfile::TempDir) -> (Session, SessionRegistry) {
        let registry = SessionRegistry::new();
        let config = Arc::new(StreamConfig {
            media_root: dir.path().to_path_buf(),
            frame_interval: Duration::from_millis(5),
            payload_type: 26,
        });
        let peer = "127.0.0.1:49152".parse().unwrap();
        (Session::new(peer, registry.clone(), config), registry)
    }

    #[test]
    fn registry_register_and_remove() {
        let registry = SessionRegistry::new();
        let peer = "127.0.0.1:1000".parse().unwrap();

        let a = registry.register(peer);
        let b = registry.register(peer);
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a));

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert_eq!(registry.ids(), vec![b]);
    }

    #[test]
    fn setup_transitions_to_ready() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 4);
        let (mut session, registry) = test_session(&dir);

        assert_eq!(session.setup("movie.dat", 25000).unwrap(), Outcome::Completed);
        assert_eq!(session.state(), SessionState::Ready);

        let id = session.id().unwrap();
        assert!(registry.contains(id));
    }

    #[test]
    fn setup_missing_file_stays_init() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 4);
        let (mut session, registry) = test_session(&dir);

        assert!(session.setup("missing.dat", 25000).is_err());
        assert_eq!(session.state(), SessionState::Init);
        assert!(session.id().is_none());
        assert!(registry.is_empty());

        // The session is still usable.
        assert_eq!(session.setup("movie.dat", 25000).unwrap(), Outcome::Completed);
    }

    #[test]
    fn setup_twice_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 4);
        let (mut session, _registry) = test_session(&dir);

        session.setup("movie.dat", 25000).unwrap();
        let first_id = session.id();

        assert_eq!(session.setup("movie.dat", 26000).unwrap(), Outcome::Ignored);
        assert_eq!(session.id(), first_id);
    }

    #[test]
    fn play_before_setup_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _registry) = test_session(&dir);

        assert_eq!(session.play(), Outcome::Ignored);
        assert_eq!(session.state(), SessionState::Init);
    }

    #[test]
    fn pause_while_ready_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 4);
        let (mut session, _registry) = test_session(&dir);

        session.setup("movie.dat", 25000).unwrap();
        assert_eq!(session.pause().unwrap(), Outcome::Ignored);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn play_pause_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 50);
        let (mut session, _registry) = test_session(&dir);

        session.setup("movie.dat", 25000).unwrap();
        assert_eq!(session.play(), Outcome::Completed);
        assert_eq!(session.state(), SessionState::Playing);

        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(session.pause().unwrap(), Outcome::Completed);
        assert_eq!(session.state(), SessionState::Ready);

        // A second PLAY resumes with the reclaimed source.
        assert_eq!(session.play(), Outcome::Completed);
        session.teardown();
    }

    #[test]
    fn teardown_from_playing_releases_everything() {
        let dir = tempfile::tempdir().unwrap();
        write_movie(&dir, "movie.dat", 50);
        let (mut session, registry) = test_session(&dir);

        session.setup("movie.dat", 25000).unwrap();
        session.play();
        session.teardown();

        assert_eq!(session.state(), SessionState::Terminated);
        assert!(session.id().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn teardown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, _registry) = test_session(&dir);

        session.teardown();
        session.teardown();
        assert_eq!(session.state(), SessionState::Terminated);
    }
}
