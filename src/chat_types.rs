/// Shared types for the support-chat layer
use serde::{Deserialize, Serialize};

/// One chat message between two identities. Server-assigned and immutable from
/// the client's perspective; `id` is unique and monotonic by creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub sender_id: u64,
    pub receiver_id: u64,
    pub content: String,
    /// Server timestamp, RFC3339-ish string passed through as-is
    pub created_at: String,
    /// Part of the payload contract, not used by reconciliation
    #[serde(default)]
    pub read: bool,
}

impl ChatMessage {
    /// A message belongs to conversation (a, b) iff {sender, receiver} = {a, b};
    /// this checks membership of one side.
    pub fn involves(&self, user_id: u64) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// Roster entry: a user who has exchanged at least one message with the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: u64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
}

impl ChatUser {
    /// Display label: full name, else email, else "User #id"
    pub fn display_name(&self) -> String {
        if !self.full_name.is_empty() {
            self.full_name.clone()
        } else if !self.email.is_empty() {
            self.email.clone()
        } else {
            format!("User #{}", self.id)
        }
    }
}

/// Response envelope used by every REST endpoint of the backend.
/// `data` stays a raw JSON value so a misshapen payload degrades to the
/// documented defaults instead of failing the whole response.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Body of POST /api/messages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_user_id: u64,
    pub content: String,
}

/// Connection state of the realtime transport, observable by the views for
/// display purposes only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Render a server timestamp as "dd/mm/yyyy hh:mm:ss"; unparseable input is
/// returned unchanged.
pub fn format_timestamp(iso: &str) -> String {
    let parsed = chrono::DateTime::parse_from_rfc3339(iso)
        .map(|dt| dt.naive_local())
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f"));
    match parsed {
        Ok(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        Err(_) => iso.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let json = r#"{"id":101,"senderId":3,"receiverId":6,"content":"hello","createdAt":"2024-05-01T10:00:00","read":false}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, 101);
        assert_eq!(msg.sender_id, 3);
        assert_eq!(msg.receiver_id, 6);
        assert!(msg.involves(6));
        assert!(msg.involves(3));
        assert!(!msg.involves(7));

        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["senderId"], 3);
        assert_eq!(back["createdAt"], "2024-05-01T10:00:00");
    }

    #[test]
    fn test_message_read_defaults_false() {
        let json = r#"{"id":1,"senderId":1,"receiverId":2,"content":"x","createdAt":"t"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(!msg.read);
    }

    #[test]
    fn test_send_request_wire_shape() {
        let req = SendMessageRequest {
            receiver_user_id: 6,
            content: "hi".to_string(),
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["receiverUserId"], 6);
        assert_eq!(v["content"], "hi");
    }

    #[test]
    fn test_user_display_name() {
        let named = ChatUser {
            id: 1,
            full_name: "An Nguyen".to_string(),
            email: "an@example.com".to_string(),
        };
        assert_eq!(named.display_name(), "An Nguyen");

        let anonymous = ChatUser {
            id: 9,
            full_name: String::new(),
            email: String::new(),
        };
        assert_eq!(anonymous.display_name(), "User #9");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2024-05-01T10:02:03"),
            "01/05/2024 10:02:03"
        );
        assert_eq!(format_timestamp("not a date"), "not a date");
    }
}
