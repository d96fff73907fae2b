use crate::error::{ProtocolViolationKind, Result, StreamError};

/// A parsed control request.
///
/// ```text
/// Method SP Resource SP Version LF
/// *(Header: Value LF)
/// ```
///
/// The resource names the frame container to stream (e.g. `movie.dat`).
/// Header lookup is case-insensitive.
#[derive(Debug)]
pub struct Request {
    /// Method (SETUP, PLAY, PAUSE, TEARDOWN).
    pub method: String,
    /// Resource name from the request line.
    pub resource: String,
    /// Protocol version token (expected: `RTSP/1.0`).
    pub version: String,
    /// Headers as ordered (name, value) pairs. Names are stored as-received;
    /// lookups via [`get_header`](Self::get_header) are case-insensitive.
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Parse a control request from its text representation.
    ///
    /// Expects the request line and any header lines, each terminated by a
    /// line feed. Returns [`StreamError::Protocol`] on malformed input.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut lines = raw.lines().filter(|line| !line.trim().is_empty());

        let request_line = lines.next().ok_or(StreamError::Protocol {
            kind: ProtocolViolationKind::EmptyRequest,
        })?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();

        if parts.len() != 3 {
            return Err(StreamError::Protocol {
                kind: ProtocolViolationKind::InvalidRequestLine,
            });
        }

        let method = parts[0].to_string();
        let resource = parts[1].to_string();
        let version = parts[2].to_string();

        if version != "RTSP/1.0" {
            tracing::warn!(version, "client sent unexpected protocol version");
        }

        let mut headers = Vec::new();

        for line in lines {
            let colon_pos = line.find(':').ok_or(StreamError::Protocol {
                kind: ProtocolViolationKind::InvalidHeader,
            })?;

            let name = line[..colon_pos].trim().to_string();
            let value = line[colon_pos + 1..].trim().to_string();

            headers.push((name, value));
        }

        Ok(Request {
            method,
            resource,
            version,
            headers,
        })
    }

    /// Look up a header value by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The client-assigned sequence number, echoed verbatim in every reply.
    ///
    /// The client is expected to increase it monotonically, but the server
    /// only records and echoes it.
    pub fn cseq(&self) -> Result<u32> {
        self.get_header("CSeq")
            .and_then(|value| value.parse().ok())
            .ok_or(StreamError::Protocol {
                kind: ProtocolViolationKind::InvalidCSeq,
            })
    }
}
