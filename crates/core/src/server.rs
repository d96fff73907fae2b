use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::{Result, StreamError};
use crate::session::SessionRegistry;
use crate::transport::tcp;

/// Streaming parameters applied to every session.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Directory that SETUP resource names are resolved against.
    pub media_root: PathBuf,
    /// Fixed inter-frame sleep of the pacing loop. Determines the nominal
    /// output rate; there is no catch-up when processing falls behind.
    pub frame_interval: Duration,
    /// Payload type written into every media packet (MJPEG by default).
    pub payload_type: u8,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("."),
            // 20 frames/second
            frame_interval: Duration::from_millis(50),
            payload_type: 26,
        }
    }
}

/// The dispatcher: accepts control connections and gives each one its own
/// session and control thread.
///
/// Owns the run flag, the configuration, and the [`SessionRegistry`]
/// (id allocation + live-session inventory). Sessions are otherwise fully
/// independent of each other.
pub struct Server {
    registry: SessionRegistry,
    running: Arc<AtomicBool>,
    bind_addr: String,
    config: Arc<StreamConfig>,
}

impl Server {
    pub fn new(bind_addr: &str) -> Self {
        Self::with_config(bind_addr, StreamConfig::default())
    }

    /// Create a server with custom streaming parameters.
    pub fn with_config(bind_addr: &str, config: StreamConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            running: Arc::new(AtomicBool::new(false)),
            bind_addr: bind_addr.to_string(),
            config: Arc::new(config),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.running.load(Ordering::SeqCst) {
            return Err(StreamError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.bind_addr)?;
        listener.set_nonblocking(true)?;

        self.running.store(true, Ordering::SeqCst);

        let registry = self.registry.clone();
        let config = self.config.clone();
        let running = self.running.clone();

        tracing::info!(addr = %self.bind_addr, media_root = %self.config.media_root.display(), "server listening");

        thread::spawn(move || {
            tcp::accept_loop(listener, registry, config, running);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        tracing::info!(active_sessions = self.registry.len(), "server stopping");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ids of all currently live sessions.
    pub fn active_sessions(&self) -> Vec<u32> {
        self.registry.ids()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> Arc<StreamConfig> {
        self.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_twice_fails() {
        let mut server = Server::new("127.0.0.1:0");
        server.start().unwrap();
        assert!(matches!(server.start(), Err(StreamError::AlreadyRunning)));
        server.stop();
    }

    #[test]
    fn stop_clears_running() {
        let mut server = Server::new("127.0.0.1:0");
        server.start().unwrap();
        assert!(server.is_running());
        server.stop();
        assert!(!server.is_running());
    }

    #[test]
    fn bad_bind_addr_errors() {
        let mut server = Server::new("not-an-address");
        assert!(server.start().is_err());
        assert!(!server.is_running());
    }
}
