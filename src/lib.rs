/// Chatlink - Realtime Support-Chat Client Core
///
/// Client-side core of a two-party support-chat subsystem: REST history and
/// send endpoints, an auto-reconnecting STOMP-over-WebSocket subscription,
/// id-based stream reconciliation, the customer floating-widget lifecycle and
/// the admin multi-conversation inbox.

pub mod chat_types;
pub mod config;
pub mod customer;
pub mod error;
pub mod inbox;
pub mod reconciler;
pub mod rest_client;
pub mod session;
pub mod stomp;
pub mod transport;
pub mod widget;

pub use chat_types::{ChatMessage, ChatUser, ConnectionState};
pub use config::ChatConfig;
pub use customer::SupportChatController;
pub use error::{ChatError, Result};
pub use inbox::InboxController;
pub use reconciler::Conversation;
pub use rest_client::RestClient;
pub use session::{CredentialStore, MemoryCredentialStore};
pub use transport::{RealtimeClient, TransportHandle, TransportOptions};
