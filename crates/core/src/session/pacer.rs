//! Data-plane pacing loop.
//!
//! One pacer thread runs per session while it is playing. The loop reads a
//! frame, wraps it in one media packet, sends it as one datagram, and
//! sleeps a fixed inter-frame interval — no adaptive pacing, no catch-up
//! when processing falls behind. An exhausted source is rewound, so the
//! stream loops until it is told to stop.
//!
//! Cancellation is cooperative: the control thread sets the stop flag and
//! joins. The flag is checked once per iteration, so worst-case stop
//! latency is one inter-frame interval. The thread hands the
//! [`VideoSource`] back on exit, preserving the playback position for a
//! later resume.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::media::RtpPacket;
use crate::source::VideoSource;
use crate::transport::MediaSocket;

/// Media clock rate for the packet timestamp field (RFC 3551 §4 video rate).
pub const MEDIA_CLOCK_HZ: u32 = 90_000;

/// Handle to a running pacing thread: stop flag plus join handle.
///
/// Present on a session only while it is playing or being stopped.
pub struct Pacer {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<VideoSource>,
}

impl Pacer {
    /// Spawn the pacing thread.
    ///
    /// Everything the loop needs is captured here; the thread never reads
    /// session state afterwards, so the control thread stays the session's
    /// only writer.
    pub fn spawn(
        source: VideoSource,
        socket: MediaSocket,
        dest: SocketAddr,
        session_id: u32,
        payload_type: u8,
        interval: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();

        let handle = thread::spawn(move || {
            run_loop(source, socket, dest, session_id, payload_type, interval, flag)
        });

        Self { stop, handle }
    }

    /// Signal the loop to stop and block until it exits.
    ///
    /// Returns the reclaimed frame source, or `None` if the thread
    /// panicked and the source was lost with it. Callers must not reply to
    /// the client before this returns — once it does, no further datagrams
    /// will be sent for the session.
    pub fn stop(self) -> Option<VideoSource> {
        self.stop.store(true, Ordering::SeqCst);
        match self.handle.join() {
            Ok(source) => Some(source),
            Err(_) => {
                tracing::error!("pacing thread panicked");
                None
            }
        }
    }
}

fn run_loop(
    mut source: VideoSource,
    socket: MediaSocket,
    dest: SocketAddr,
    session_id: u32,
    payload_type: u8,
    interval: Duration,
    stop: Arc<AtomicBool>,
) -> VideoSource {
    tracing::info!(session_id, %dest, "media stream started");

    while !stop.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                // Exhausted: rewind and keep going. The stream never ends
                // on its own.
                if let Err(e) = source.reset() {
                    tracing::error!(session_id, error = %e, "failed to rewind frame source");
                    thread::sleep(interval);
                }
                continue;
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "frame read failed");
                thread::sleep(interval);
                continue;
            }
        };

        let packet = RtpPacket::new(
            payload_type,
            source.frame_index() as u16,
            media_timestamp(),
            session_id,
            frame,
        );

        // Media loss is tolerated; a failed send never stops the stream.
        if let Err(e) = socket.send_to(&packet.encode(), dest) {
            tracing::warn!(session_id, %dest, error = %e, "media send failed");
        }

        thread::sleep(interval);
    }

    tracing::info!(session_id, %dest, "media stream stopped");
    source
}

/// Wall-clock-derived media timestamp on the 90 kHz reference clock.
///
/// The wrap at u32 is the same wrap every media receiver already handles.
fn media_timestamp() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_millis() as u64).wrapping_mul(u64::from(MEDIA_CLOCK_HZ / 1000)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::UdpSocket;

    fn write_container(frames: &[&[u8]]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for frame in frames {
            write!(file, "{:05}", frame.len()).unwrap();
            file.write_all(frame).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn paces_packets_and_stops_on_signal() {
        let frames: Vec<Vec<u8>> = (0..100)
            .map(|i| format!("frame-{i:04}").into_bytes())
            .collect();
        let refs: Vec<&[u8]> = frames.iter().map(|f| f.as_slice()).collect();
        let container = write_container(&refs);
        let source = VideoSource::open(container.path()).unwrap();

        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let dest = receiver.local_addr().unwrap();

        let pacer = Pacer::spawn(
            source,
            MediaSocket::bind().unwrap(),
            dest,
            77,
            26,
            Duration::from_millis(10),
        );

        let mut buf = [0u8; 2048];
        let len = receiver.recv(&mut buf).unwrap();
        let packet = RtpPacket::decode(&buf[..len]).unwrap();
        assert_eq!(packet.version, 2);
        assert_eq!(packet.payload_type, 26);
        assert_eq!(packet.ssrc, 77);
        assert_eq!(packet.sequence, 1);
        assert_eq!(packet.payload, b"frame-0000");

        // Position survives the round trip through the thread.
        let source = pacer.stop().expect("source reclaimed");
        assert!(source.frame_index() >= 1);
    }

    #[test]
    fn loops_when_source_is_exhausted() {
        let container = write_container(&[b"only"]);
        let source = VideoSource::open(container.path()).unwrap();

        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let dest = receiver.local_addr().unwrap();

        let pacer = Pacer::spawn(
            source,
            MediaSocket::bind().unwrap(),
            dest,
            1,
            26,
            Duration::from_millis(5),
        );

        // The single-frame container must be delivered more than once.
        let mut buf = [0u8; 2048];
        for _ in 0..3 {
            let len = receiver.recv(&mut buf).unwrap();
            let packet = RtpPacket::decode(&buf[..len]).unwrap();
            assert_eq!(packet.payload, b"only");
            assert_eq!(packet.sequence, 1);
        }

        pacer.stop();
    }
}
