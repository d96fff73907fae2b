//! Network transport layer: control signaling and media delivery.
//!
//! The protocol uses a split transport model:
//!
//! - **TCP** ([`tcp`]): carries control request/reply signaling. One TCP
//!   connection per client, with a thread per connection that owns that
//!   connection's session.
//!
//! - **UDP** ([`udp`]): carries media packets. Each session binds its own
//!   outbound socket at SETUP; datagrams are at-most-once, unordered, and
//!   never retransmitted.

pub mod tcp;
pub mod udp;

pub use udp::MediaSocket;
