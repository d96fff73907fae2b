use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::StreamError;
use crate::protocol::request::Request;
use crate::protocol::response::Response;
use crate::server::StreamConfig;
use crate::session::{Outcome, Session, SessionRegistry, SessionState, TransportHeader};

/// Handles control commands for a single connection.
///
/// Owns that connection's [`Session`] — the session's single writer. Maps
/// each parsed request onto a session operation and turns the outcome into
/// a reply. The reply policy:
///
/// - executed command → `200 OK`
/// - SETUP source missing → `404 Not Found`
/// - command outside its required state → `455`, nothing changed
/// - missing/unusable required header → `400`, nothing changed
/// - unknown method → `501`, nothing changed
///
/// Every reply echoes `CSeq`; the session id is attached whenever one has
/// been assigned.
pub struct CommandHandler {
    session: Session,
    peer_addr: SocketAddr,
}

impl CommandHandler {
    pub fn new(peer_addr: SocketAddr, registry: SessionRegistry, config: Arc<StreamConfig>) -> Self {
        CommandHandler {
            session: Session::new(peer_addr, registry, config),
            peer_addr,
        }
    }

    /// True once TEARDOWN (or cleanup) has run; the control loop then
    /// closes the connection.
    pub fn finished(&self) -> bool {
        self.session.state() == SessionState::Terminated
    }

    /// Disconnect cleanup, equivalent to TEARDOWN. Safe to call twice.
    pub fn cleanup(&mut self) {
        if !self.finished() {
            tracing::debug!(peer = %self.peer_addr, "cleaning up session on disconnect");
            self.session.teardown();
        }
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        let cseq = match request.cseq() {
            Ok(n) => {
                self.session.note_cseq(n);
                n
            }
            Err(e) => {
                tracing::warn!(peer = %self.peer_addr, error = %e, "request without usable CSeq");
                return Response::bad_request().with_cseq(0);
            }
        };

        match request.method.as_str() {
            "SETUP" => self.handle_setup(cseq, request),
            "PLAY" => self.handle_play(cseq, request),
            "PAUSE" => self.handle_pause(cseq, request),
            "TEARDOWN" => self.handle_teardown(cseq, request),
            _ => {
                tracing::warn!(peer = %self.peer_addr, method = %request.method, cseq, "unknown method");
                self.attach_session(Response::not_implemented().with_cseq(cseq))
            }
        }
    }

    fn handle_setup(&mut self, cseq: u32, request: &Request) -> Response {
        let transport = match request.get_header("Transport") {
            Some(t) => t,
            None => {
                tracing::warn!(peer = %self.peer_addr, cseq, "SETUP missing Transport header");
                return self.attach_session(Response::bad_request().with_cseq(cseq));
            }
        };

        let header = match TransportHeader::parse(transport) {
            Some(h) => h,
            None => {
                tracing::warn!(peer = %self.peer_addr, cseq, transport, "SETUP with unusable Transport header");
                return self.attach_session(Response::bad_request().with_cseq(cseq));
            }
        };

        match self.session.setup(&request.resource, header.client_port) {
            Ok(Outcome::Completed) => self.attach_session(Response::ok().with_cseq(cseq)),
            Ok(Outcome::Ignored) => self.attach_session(Response::method_not_valid().with_cseq(cseq)),
            Err(StreamError::SourceUnavailable { path, .. }) => {
                tracing::warn!(peer = %self.peer_addr, cseq, path, "SETUP for unavailable source");
                Response::not_found().with_cseq(cseq)
            }
            Err(e) => {
                tracing::error!(peer = %self.peer_addr, cseq, error = %e, "SETUP failed");
                Response::internal_error().with_cseq(cseq)
            }
        }
    }

    fn handle_play(&mut self, cseq: u32, request: &Request) -> Response {
        if let Some(resp) = self.require_session_header(cseq, request, "PLAY") {
            return resp;
        }

        match self.session.play() {
            Outcome::Completed => self.attach_session(Response::ok().with_cseq(cseq)),
            Outcome::Ignored => self.attach_session(Response::method_not_valid().with_cseq(cseq)),
        }
    }

    fn handle_pause(&mut self, cseq: u32, request: &Request) -> Response {
        if let Some(resp) = self.require_session_header(cseq, request, "PAUSE") {
            return resp;
        }

        // pause() joins the pacing thread, so by the time the reply goes
        // out the stream is confirmed silent.
        match self.session.pause() {
            Ok(Outcome::Completed) => self.attach_session(Response::ok().with_cseq(cseq)),
            Ok(Outcome::Ignored) => self.attach_session(Response::method_not_valid().with_cseq(cseq)),
            Err(e) => {
                tracing::error!(peer = %self.peer_addr, cseq, error = %e, "PAUSE failed");
                self.attach_session(Response::internal_error().with_cseq(cseq))
            }
        }
    }

    fn handle_teardown(&mut self, cseq: u32, request: &Request) -> Response {
        if let Some(resp) = self.require_session_header(cseq, request, "TEARDOWN") {
            return resp;
        }

        let id = self.session.id();
        self.session.teardown();

        let resp = Response::ok().with_cseq(cseq);
        match id {
            Some(id) => resp.with_session(id),
            None => resp,
        }
    }

    /// PLAY/PAUSE/TEARDOWN must carry a `Session` header. The id it names
    /// is not verified against the issued one — this connection's session
    /// is the only one the command could address — but a mismatch is
    /// logged.
    fn require_session_header(
        &self,
        cseq: u32,
        request: &Request,
        method: &str,
    ) -> Option<Response> {
        let Some(claimed) = request.get_header("Session") else {
            tracing::warn!(peer = %self.peer_addr, cseq, method, "missing Session header");
            return Some(self.attach_session(Response::bad_request().with_cseq(cseq)));
        };

        if let (Ok(claimed), Some(issued)) = (claimed.trim().parse::<u32>(), self.session.id())
            && claimed != issued
        {
            tracing::warn!(peer = %self.peer_addr, cseq, method, claimed, issued, "session id mismatch");
        }

        None
    }

    fn attach_session(&self, resp: Response) -> Response {
        match self.session.id() {
            Some(id) => resp.with_session(id),
            None => resp,
        }
    }
}
