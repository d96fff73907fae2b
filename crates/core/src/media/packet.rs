use crate::error::{Result, StreamError};

/// Size of the fixed RTP header in bytes.
pub const HEADER_LEN: usize = 12;

/// RTP protocol version written by [`RtpPacket::new`].
pub const RTP_VERSION: u8 = 2;

/// One media packet: 12-byte fixed header plus opaque payload (RFC 3550 §5.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                             SSRC                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            payload                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// All integers are big-endian on the wire. The payload length is never
/// encoded — it is whatever follows the header in the datagram.
///
/// Each packet is built fresh for one frame and is immutable once encoded;
/// sequence/timestamp state lives with the sender, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpPacket {
    /// Protocol version (2 bits). Senders write 2; [`decode`](Self::decode)
    /// does not reject other values.
    pub version: u8,
    /// Padding flag (1 bit).
    pub padding: bool,
    /// Extension flag (1 bit).
    pub extension: bool,
    /// Contributing-source count (4 bits).
    pub csrc_count: u8,
    /// Marker bit.
    pub marker: bool,
    /// Payload type (7 bits, RFC 3551). MJPEG is 26.
    pub payload_type: u8,
    /// Sequence number (16 bits, wrapping).
    pub sequence: u16,
    /// Media clock timestamp (32 bits, 90 kHz reference for video).
    pub timestamp: u32,
    /// Synchronization source identifier.
    pub ssrc: u32,
    /// Opaque encoded frame data. Bounded only by the datagram size limit.
    pub payload: Vec<u8>,
}

impl RtpPacket {
    /// Build a version-2 packet with all flag bits clear.
    pub fn new(payload_type: u8, sequence: u16, timestamp: u32, ssrc: u32, payload: Vec<u8>) -> Self {
        Self {
            version: RTP_VERSION,
            padding: false,
            extension: false,
            csrc_count: 0,
            marker: false,
            payload_type,
            sequence,
            timestamp,
            ssrc,
            payload,
        }
    }

    /// Serialize to wire bytes: 12-byte header followed by the payload.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());

        buf.push(
            (self.version << 6)
                | ((self.padding as u8) << 5)
                | ((self.extension as u8) << 4)
                | (self.csrc_count & 0x0F),
        );
        buf.push(((self.marker as u8) << 7) | (self.payload_type & 0x7F));
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.ssrc.to_be_bytes());
        buf.extend_from_slice(&self.payload);

        buf
    }

    /// Parse wire bytes back into a packet.
    ///
    /// Fails with [`StreamError::MalformedPacket`] when fewer than
    /// [`HEADER_LEN`] bytes are supplied. A zero-length payload is valid.
    /// No other validation happens here — unknown payload types and
    /// non-2 version values pass through so that non-conforming senders
    /// can still be inspected by the caller.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(StreamError::MalformedPacket { len: data.len() });
        }

        Ok(Self {
            version: data[0] >> 6,
            padding: data[0] & 0x20 != 0,
            extension: data[0] & 0x10 != 0,
            csrc_count: data[0] & 0x0F,
            marker: data[1] & 0x80 != 0,
            payload_type: data[1] & 0x7F,
            sequence: u16::from_be_bytes([data[2], data[3]]),
            timestamp: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            ssrc: u32::from_be_bytes([data[8], data[9], data[10], data[11]]),
            payload: data[HEADER_LEN..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_packet() -> RtpPacket {
        RtpPacket::new(26, 7, 0x01020304, 0xAABBCCDD, vec![1, 2, 3, 4, 5])
    }

    #[test]
    fn version_is_2() {
        let buf = make_packet().encode();
        assert_eq!(buf[0] >> 6, 2);
    }

    #[test]
    fn payload_type_written() {
        let buf = make_packet().encode();
        assert_eq!(buf[1] & 0x7F, 26);
    }

    #[test]
    fn marker_bit() {
        let mut p = make_packet();
        assert_eq!(p.encode()[1] & 0x80, 0);

        p.marker = true;
        assert_eq!(p.encode()[1] & 0x80, 0x80);
    }

    #[test]
    fn big_endian_fields() {
        let buf = make_packet().encode();
        assert_eq!(u16::from_be_bytes([buf[2], buf[3]]), 7);
        assert_eq!(&buf[4..8], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&buf[8..12], &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn payload_follows_header() {
        let buf = make_packet().encode();
        assert_eq!(buf.len(), HEADER_LEN + 5);
        assert_eq!(&buf[HEADER_LEN..], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn round_trip() {
        let original = make_packet();
        let decoded = RtpPacket::decode(&original.encode()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn round_trip_all_flags() {
        let mut p = make_packet();
        p.padding = true;
        p.extension = true;
        p.csrc_count = 0x0F;
        p.marker = true;
        p.payload_type = 0x7F;
        p.sequence = u16::MAX;
        p.timestamp = u32::MAX;
        p.ssrc = u32::MAX;

        let decoded = RtpPacket::decode(&p.encode()).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn empty_payload_round_trips() {
        let p = RtpPacket::new(26, 0, 0, 0, Vec::new());
        let buf = p.encode();
        assert_eq!(buf.len(), HEADER_LEN);

        let decoded = RtpPacket::decode(&buf).unwrap();
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded, p);
    }

    #[test]
    fn short_buffer_rejected() {
        let err = RtpPacket::decode(&[0u8; HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(err, StreamError::MalformedPacket { len: 11 }));
    }

    #[test]
    fn foreign_version_tolerated() {
        let mut buf = make_packet().encode();
        buf[0] = (buf[0] & 0x3F) | (1 << 6);
        let decoded = RtpPacket::decode(&buf).unwrap();
        assert_eq!(decoded.version, 1);
    }
}
