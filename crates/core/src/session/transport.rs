/// Parsed client-side transport info from the `Transport` header.
///
/// SETUP declares where media datagrams should be sent:
///
/// ```text
/// Transport: RTP/AVP;unicast;client_port=25000
/// Transport: RTP/AVP;unicast;client_port=25000-25001
/// ```
///
/// Only the first port matters — it is the destination for media
/// datagrams. The second, when present, would be the RTCP port; it is
/// parsed and retained but nothing is ever sent to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHeader {
    /// Destination port for media datagrams.
    pub client_port: u16,
    /// Companion control port, unused.
    pub client_rtcp_port: Option<u16>,
}

impl TransportHeader {
    /// Parse the `Transport` header value.
    ///
    /// Looks for `client_port=PORT[-RTCP]` among semicolon-separated
    /// parameters. Returns `None` when the parameter is absent or the
    /// port does not parse.
    ///
    /// ## Examples
    ///
    /// ```
    /// use vstream::session::transport::TransportHeader;
    ///
    /// let th = TransportHeader::parse("RTP/AVP;unicast;client_port=25000").unwrap();
    /// assert_eq!(th.client_port, 25000);
    /// assert_eq!(th.client_rtcp_port, None);
    ///
    /// assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    /// ```
    pub fn parse(header: &str) -> Option<Self> {
        for part in header.split(';') {
            let part = part.trim();
            if let Some(ports) = part.strip_prefix("client_port=") {
                let mut port_parts = ports.split('-');

                let client_port: u16 = port_parts.next()?.parse().ok()?;
                let client_rtcp_port = port_parts.next().and_then(|p| p.parse().ok());

                return Some(TransportHeader {
                    client_port,
                    client_rtcp_port,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_port() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=25000").unwrap();
        assert_eq!(th.client_port, 25000);
        assert_eq!(th.client_rtcp_port, None);
    }

    #[test]
    fn parse_port_pair() {
        let th = TransportHeader::parse("RTP/AVP;unicast;client_port=25000-25001").unwrap();
        assert_eq!(th.client_port, 25000);
        assert_eq!(th.client_rtcp_port, Some(25001));
    }

    #[test]
    fn parse_no_client_port() {
        assert!(TransportHeader::parse("RTP/AVP;unicast").is_none());
    }

    #[test]
    fn parse_bad_port_value() {
        assert!(TransportHeader::parse("RTP/AVP;unicast;client_port=banana").is_none());
    }
}
