/// Minimal STOMP 1.2 frame codec
///
/// Only the subset the broker dialogue needs: CONNECT/CONNECTED for the
/// authenticated handshake, SUBSCRIBE/UNSUBSCRIBE for the per-identity topic,
/// MESSAGE for inbound deliveries, ERROR and DISCONNECT for teardown. Frames
/// travel as WebSocket text messages; a frame is the command line, header
/// lines, a blank line, then the body terminated by NUL.
use std::fmt;

pub const CMD_CONNECT: &str = "CONNECT";
pub const CMD_CONNECTED: &str = "CONNECTED";
pub const CMD_SUBSCRIBE: &str = "SUBSCRIBE";
pub const CMD_UNSUBSCRIBE: &str = "UNSUBSCRIBE";
pub const CMD_MESSAGE: &str = "MESSAGE";
pub const CMD_ERROR: &str = "ERROR";
pub const CMD_DISCONNECT: &str = "DISCONNECT";

/// One STOMP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// First header with the given name, if any
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT frame carrying the bearer credential
    pub fn connect(token: &str) -> Self {
        Self::new(CMD_CONNECT)
            .header("accept-version", "1.2")
            .header("heart-beat", "0,0")
            .header("Authorization", &format!("Bearer {}", token))
    }

    pub fn connected() -> Self {
        Self::new(CMD_CONNECTED).header("version", "1.2")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(CMD_SUBSCRIBE)
            .header("id", id)
            .header("destination", destination)
    }

    pub fn unsubscribe(id: &str) -> Self {
        Self::new(CMD_UNSUBSCRIBE).header("id", id)
    }

    pub fn message(destination: &str, subscription: &str, message_id: &str, body: &str) -> Self {
        Self::new(CMD_MESSAGE)
            .header("destination", destination)
            .header("subscription", subscription)
            .header("message-id", message_id)
            .header("content-type", "application/json")
            .body(body)
    }

    pub fn disconnect() -> Self {
        Self::new(CMD_DISCONNECT)
    }

    /// Serialize to the wire text (NUL-terminated)
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.command.len() + self.body.len() + 64);
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse a frame from wire text. Returns None on anything malformed;
    /// heartbeat frames (bare EOL) also parse to None and are skipped upstream.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim_end_matches('\0');
        // The blank line separating headers from body may use either EOL style
        let (head, body) = match raw
            .split_once("\r\n\r\n")
            .or_else(|| raw.split_once("\n\n"))
        {
            Some((head, body)) => (head, body),
            None => (raw, ""),
        };

        let mut lines = head.lines();
        let command = lines.next()?.trim_end_matches('\r').to_string();
        if command.is_empty() || !command.chars().all(|c| c.is_ascii_uppercase()) {
            return None;
        }

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':')?;
            headers.push((name.to_string(), value.to_string()));
        }

        Some(Self {
            command,
            headers,
            body: body.to_string(),
        })
    }
}

impl fmt::Display for StompFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StompFrame({})", self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let frame = StompFrame::message("/topic/messages/3", "sub-0", "7", r#"{"id":1}"#);
        let wire = frame.serialize();
        let parsed = StompFrame::parse(&wire).unwrap();
        assert_eq!(frame, parsed);
        assert_eq!(parsed.body, r#"{"id":1}"#);
        assert_eq!(parsed.get_header("destination"), Some("/topic/messages/3"));
    }

    #[test]
    fn test_connect_carries_credential() {
        let wire = StompFrame::connect("jwt-abc").serialize();
        let parsed = StompFrame::parse(&wire).unwrap();
        assert_eq!(parsed.command, CMD_CONNECT);
        assert_eq!(parsed.get_header("Authorization"), Some("Bearer jwt-abc"));
        assert_eq!(parsed.get_header("accept-version"), Some("1.2"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(StompFrame::parse("").is_none());
        assert!(StompFrame::parse("\n").is_none());
        assert!(StompFrame::parse("not a command\nfoo:bar\n\n").is_none());
        // header line without a colon
        assert!(StompFrame::parse("SEND\nbroken header\n\nbody\0").is_none());
    }

    #[test]
    fn test_parse_crlf_frame() {
        let wire = "MESSAGE\r\ndestination:/topic/messages/3\r\n\r\n{\"id\":1}\0";
        let parsed = StompFrame::parse(wire).unwrap();
        assert_eq!(parsed.command, CMD_MESSAGE);
        assert_eq!(parsed.get_header("destination"), Some("/topic/messages/3"));
        assert_eq!(parsed.body, r#"{"id":1}"#);
    }

    #[test]
    fn test_parse_without_body() {
        let parsed = StompFrame::parse("DISCONNECT\n\n\0").unwrap();
        assert_eq!(parsed.command, CMD_DISCONNECT);
        assert!(parsed.body.is_empty());
    }
}
