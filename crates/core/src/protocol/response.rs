/// A control reply.
///
/// Serializes to the compact line-feed format the data-channel clients
/// parse:
///
/// ```text
/// RTSP/1.0 200 OK\n
/// CSeq: 1\n
/// Session: 1824073558\n
/// ```
///
/// Uses a builder pattern — chain [`add_header`](Self::add_header), then
/// call [`serialize`](Self::serialize). There is no body and no blank-line
/// terminator; a reply is exactly its status line plus headers.
#[must_use]
pub struct Response {
    pub status_code: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
}

impl Response {
    pub fn new(status_code: u16, status_text: &str) -> Self {
        Response {
            status_code,
            status_text: status_text.to_string(),
            headers: Vec::new(),
        }
    }

    /// 200 OK — the command was executed.
    pub fn ok() -> Self {
        Self::new(200, "OK")
    }

    /// 404 Not Found — the named frame source could not be opened.
    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    /// 400 Bad Request — malformed request or missing required header.
    pub fn bad_request() -> Self {
        Self::new(400, "Bad Request")
    }

    /// 455 — the command is valid but not in the session's current state.
    /// The session is left untouched.
    pub fn method_not_valid() -> Self {
        Self::new(455, "Method Not Valid in This State")
    }

    /// 501 Not Implemented — unknown method.
    pub fn not_implemented() -> Self {
        Self::new(501, "Not Implemented")
    }

    /// 500 Internal Server Error.
    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    pub fn add_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Echo the client's sequence number.
    pub fn with_cseq(self, cseq: u32) -> Self {
        self.add_header("CSeq", &cseq.to_string())
    }

    /// Attach the server-assigned session id.
    pub fn with_session(self, id: u32) -> Self {
        self.add_header("Session", &id.to_string())
    }

    /// Serialize to the text wire format, one line feed after each line.
    pub fn serialize(&self) -> String {
        let mut response = format!("RTSP/1.0 {} {}\n", self.status_code, self.status_text);

        for (name, value) in &self.headers {
            response.push_str(&format!("{}: {}\n", name, value));
        }

        response
    }
}
