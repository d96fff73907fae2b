//! Media packet codec.
//!
//! The data channel carries one encoded video frame per UDP datagram,
//! prefixed with the 12-byte RTP fixed header (RFC 3550 §5.1). Loss and
//! reordering are accepted; nothing here retransmits or reorders.
//!
//! [`RtpPacket`] is the single unit of the data channel: [`RtpPacket::encode`]
//! produces the wire bytes, [`RtpPacket::decode`] is its inverse. Receivers
//! (viewer, relay bridge) consume the decoded payload directly.

pub mod packet;

pub use packet::RtpPacket;
