//! Error types for the streaming server library.

use std::fmt;

/// Errors that can occur in the streaming server library.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Media codec**: [`MalformedPacket`](Self::MalformedPacket) — datagram
///   shorter than the fixed header.
/// - **Frame source**: [`SourceUnavailable`](Self::SourceUnavailable) — the
///   named frame container could not be opened.
/// - **Control protocol**: [`Protocol`](Self::Protocol) — malformed request
///   text or a missing required header.
/// - **Transport**: [`Io`](Self::Io) — socket or file I/O failures.
/// - **Server**: [`AlreadyRunning`](Self::AlreadyRunning).
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A media datagram shorter than the 12-byte fixed header.
    #[error("malformed media packet: {len} bytes is shorter than the fixed header")]
    MalformedPacket { len: usize },

    /// The named frame container is missing or unreadable.
    #[error("frame source unavailable: {path}")]
    SourceUnavailable {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    /// A control request violated the protocol (bad framing, missing header).
    #[error("protocol violation: {kind}")]
    Protocol { kind: ProtocolViolationKind },

    /// [`Server::start`](crate::Server::start) was called while already running.
    #[error("server already running")]
    AlreadyRunning,
}

/// Specific kind of control-protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolationKind {
    /// Input was empty (no request line).
    EmptyRequest,
    /// Request line did not have the expected `Method Resource Version` format.
    InvalidRequestLine,
    /// A header line did not contain a colon separator.
    InvalidHeader,
    /// The required `CSeq` header was missing or not an integer.
    InvalidCSeq,
}

impl fmt::Display for ProtocolViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRequest => write!(f, "empty request"),
            Self::InvalidRequestLine => write!(f, "invalid request line"),
            Self::InvalidHeader => write!(f, "invalid header"),
            Self::InvalidCSeq => write!(f, "missing or invalid CSeq header"),
        }
    }
}

/// Convenience alias for `Result<T, StreamError>`.
pub type Result<T> = std::result::Result<T, StreamError>;
