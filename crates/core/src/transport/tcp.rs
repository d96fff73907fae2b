use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::protocol::{CommandHandler, Request, Response};
use crate::server::StreamConfig;
use crate::session::SessionRegistry;

/// Lines in one control request: the request line plus two headers.
/// Every supported method carries exactly `CSeq` and one of
/// `Transport`/`Session`.
const REQUEST_LINES: usize = 3;

/// Non-blocking TCP accept loop.
///
/// Checks the `running` flag between accepts with a 50ms poll interval
/// so that [`crate::server::Server::stop`] can terminate it promptly.
pub fn accept_loop(
    listener: TcpListener,
    registry: SessionRegistry,
    config: Arc<StreamConfig>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => {
                if stream.set_nonblocking(false).is_err() {
                    continue;
                }
                let reg = registry.clone();
                let cfg = config.clone();
                let run = running.clone();
                thread::spawn(move || {
                    Connection::handle(stream, reg, cfg, run);
                });
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            }
        }
    }
    tracing::debug!("accept loop exited");
}

/// A single control connection with its own lifecycle.
///
/// The spawned thread owns this connection's session (via the handler) and
/// is its sole writer; when the loop exits for any reason, cleanup
/// equivalent to TEARDOWN runs before the connection is dropped.
struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    handler: CommandHandler,
    peer_addr: SocketAddr,
}

impl Connection {
    /// Entry point: set up a connection and run its command loop.
    pub fn handle(
        stream: TcpStream,
        registry: SessionRegistry,
        config: Arc<StreamConfig>,
        running: Arc<AtomicBool>,
    ) {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(_) => return,
        };

        tracing::info!(%peer_addr, "client connected");

        let reader_stream = match stream.try_clone() {
            Ok(s) => s,
            Err(_) => return,
        };

        let handler = CommandHandler::new(peer_addr, registry, config);

        let mut conn = Connection {
            reader: BufReader::new(reader_stream),
            writer: stream,
            handler,
            peer_addr,
        };

        let reason = conn.run(&running);
        conn.handler.cleanup();

        tracing::info!(peer_addr = %conn.peer_addr, reason, "client disconnected");
    }

    /// Command/reply loop. Returns the reason for exiting.
    fn run(&mut self, running: &Arc<AtomicBool>) -> &'static str {
        while running.load(Ordering::SeqCst) {
            let request_text = match self.read_request() {
                Some(text) => text,
                None => return "connection closed by client",
            };

            let response = match Request::parse(&request_text) {
                Ok(request) => {
                    tracing::debug!(
                        peer = %self.peer_addr,
                        method = %request.method,
                        resource = %request.resource,
                        "request"
                    );
                    self.handler.handle(&request)
                }
                Err(e) => {
                    // Malformed framing still gets an answer; the session
                    // is untouched.
                    tracing::warn!(peer = %self.peer_addr, error = %e, "unparsable request");
                    Response::bad_request().with_cseq(0)
                }
            };

            tracing::debug!(peer = %self.peer_addr, status = response.status_code, "reply");

            if self
                .writer
                .write_all(response.serialize().as_bytes())
                .is_err()
            {
                return "write error";
            }

            if self.handler.finished() {
                return "session torn down";
            }
        }

        "server shutting down"
    }

    /// Collect one request's lines.
    ///
    /// A request is [`REQUEST_LINES`] line-feed-terminated lines. Blank
    /// lines between requests are skipped; a blank line inside a request
    /// terminates it early so malformed traffic gets a 400 instead of
    /// stalling the reader. Returns `None` when the connection is gone.
    fn read_request(&mut self) -> Option<String> {
        let mut text = String::new();
        let mut lines = 0;

        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    return if text.is_empty() { None } else { Some(text) };
                }
                Ok(_) => {
                    if line.trim().is_empty() {
                        if text.is_empty() {
                            continue;
                        }
                        return Some(text);
                    }

                    text.push_str(&line);
                    lines += 1;

                    if lines == REQUEST_LINES {
                        return Some(text);
                    }
                }
                Err(_) => return None,
            }
        }
    }
}
