/// REST endpoints of the chat backend
///
/// History loader, roster loader and outbound dispatcher. Every response uses
/// the `{success, message, data}` envelope; a non-2xx status or a false
/// success flag surfaces the server-supplied message when present and a
/// generic fallback otherwise. A misshapen `data` field degrades to the
/// documented default instead of failing the call.
use crate::chat_types::{ApiEnvelope, ChatMessage, ChatUser, SendMessageRequest};
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};
use crate::session::{bearer_token, CredentialStore};
use std::sync::Arc;
use tracing::debug;

/// Generic fallback when the server gives no message for a history failure
pub const FALLBACK_HISTORY: &str = "Không thể tải lịch sử tin nhắn.";
/// Generic fallback for roster failures
pub const FALLBACK_ROSTER: &str = "Không thể tải danh sách người dùng đã chat.";
/// Generic fallback for send failures
pub const FALLBACK_SEND: &str = "Gửi tin nhắn thất bại.";

/// Client over the message endpoints, authenticated per request from the
/// injected credential store.
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl RestClient {
    pub fn new(config: &ChatConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            store,
        }
    }

    fn token(&self) -> Result<String> {
        bearer_token(self.store.as_ref()).ok_or(ChatError::Unauthenticated)
    }

    /// Ordered conversation history with one counterparty
    pub async fn load_history(&self, counterparty_id: u64) -> Result<Vec<ChatMessage>> {
        let token = self.token()?;
        let url = format!(
            "{}/api/messages/conversation/{}",
            self.base_url, counterparty_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ChatError::Connectivity(e.to_string()))?;

        let envelope = read_envelope(response, FALLBACK_HISTORY, ChatError::LoadFailed).await?;
        Ok(list_from(envelope.data))
    }

    /// Roster of counterparties the operator has exchanged messages with
    pub async fn load_roster(&self) -> Result<Vec<ChatUser>> {
        let token = self.token()?;
        let url = format!("{}/api/messages/chat-users", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ChatError::Connectivity(e.to_string()))?;

        let envelope = read_envelope(response, FALLBACK_ROSTER, ChatError::LoadFailed).await?;
        Ok(list_from(envelope.data))
    }

    /// Submit a new message. Whitespace-only content is a no-op (Ok(None)),
    /// not an error. On success returns the server-confirmed record, which the
    /// caller must fold through the reconciler exactly like a pushed message.
    pub async fn send_message(
        &self,
        receiver_id: u64,
        content: &str,
    ) -> Result<Option<ChatMessage>> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        let token = self.token()?;
        let url = format!("{}/api/messages", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .json(&SendMessageRequest {
                receiver_user_id: receiver_id,
                content: content.to_string(),
            })
            .send()
            .await
            .map_err(|e| ChatError::Connectivity(e.to_string()))?;

        let envelope = read_envelope(response, FALLBACK_SEND, ChatError::SendFailed).await?;
        let message = envelope
            .data
            .and_then(|v| serde_json::from_value::<ChatMessage>(v).ok());
        match message {
            Some(message) => Ok(Some(message)),
            // success=true with no usable record still counts as a rejection
            None => Err(ChatError::SendFailed(FALLBACK_SEND.to_string())),
        }
    }
}

/// Decode the envelope and map rejections to the given error constructor
async fn read_envelope(
    response: reqwest::Response,
    fallback: &str,
    reject: fn(String) -> ChatError,
) -> Result<ApiEnvelope> {
    let status = response.status();
    let envelope: ApiEnvelope = match response.json().await {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("unparseable response body ({}): {}", status, e);
            return Err(reject(fallback.to_string()));
        }
    };

    if !status.is_success() || !envelope.success {
        let message = envelope
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        return Err(reject(message));
    }
    Ok(envelope)
}

/// data → Vec<T>, defaulting to empty when absent or not list-shaped
fn list_from<T: serde::de::DeserializeOwned>(data: Option<serde_json::Value>) -> Vec<T> {
    data.and_then(|v| serde_json::from_value::<Vec<T>>(v).ok())
        .unwrap_or_default()
}
