/// Error types for the support-chat client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("not authenticated")]
    Unauthenticated,

    #[error("history load failed: {0}")]
    LoadFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ChatError {
    /// Inline display text, preferring the server-supplied message carried by
    /// load/send failures over the caller's fallback.
    pub fn inline_text(&self, fallback: &str) -> String {
        match self {
            ChatError::LoadFailed(msg) | ChatError::SendFailed(msg) => msg.clone(),
            _ => fallback.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
