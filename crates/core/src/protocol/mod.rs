//! Control-channel protocol: parsing requests, building replies, and
//! mapping commands onto session operations.
//!
//! The dialect is RTSP/1.0-shaped but deliberately compact: text lines
//! separated by a single line feed, no blank-line terminator, and a fixed
//! request shape of a request line plus exactly two headers:
//!
//! ```text
//! SETUP movie.dat RTSP/1.0
//! CSeq: 1
//! Transport: RTP/AVP;unicast;client_port=25000
//! ```
//!
//! Replies echo the client's `CSeq` and, once a session exists, carry its
//! `Session` id:
//!
//! ```text
//! RTSP/1.0 200 OK
//! CSeq: 1
//! Session: 1824073558
//! ```
//!
//! ## Supported methods
//!
//! | Method | Required state | Purpose |
//! |--------|----------------|---------|
//! | SETUP | Init | Open the frame source, negotiate the media port |
//! | PLAY | Ready | Start media delivery |
//! | PAUSE | Playing | Suspend media delivery |
//! | TEARDOWN | any | Destroy the session, close the connection |
//!
//! A command received outside its required state is ignored and answered
//! with `455 Method Not Valid in This State`; an unknown method gets `501`.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::CommandHandler;
pub use request::Request;
pub use response::Response;
