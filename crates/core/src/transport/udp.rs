use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::error::Result;

/// Outbound datagram socket for one session's media packets.
///
/// Bound to an ephemeral port (`0.0.0.0:0`) during SETUP and owned by the
/// session for its lifetime. Cloning is cheap (shared socket) so the pacing
/// thread can hold its own handle while the session keeps the original.
///
/// This layer is deliberately address-only — it does not know about
/// sessions or frames. The caller resolves the destination before calling
/// [`send_to`](Self::send_to).
#[derive(Clone)]
pub struct MediaSocket {
    socket: Arc<UdpSocket>,
}

impl MediaSocket {
    /// Bind an ephemeral UDP socket for outbound media.
    pub fn bind() -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        Ok(Self {
            socket: Arc::new(socket),
        })
    }

    /// Send one datagram to a specific socket address.
    pub fn send_to(&self, payload: &[u8], addr: SocketAddr) -> Result<usize> {
        Ok(self.socket.send_to(payload, addr)?)
    }
}
