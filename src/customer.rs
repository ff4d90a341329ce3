/// Customer-side support conversation controller
///
/// Drives the conversation view behind the floating widget: history load on
/// open, outbound sends, folding of live pushes. The conversation is pinned to
/// the fixed support identity; request failures are recovered into an inline
/// error string and never propagate further.
use crate::chat_types::ChatMessage;
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::reconciler::Conversation;
use crate::rest_client::{RestClient, FALLBACK_HISTORY, FALLBACK_SEND};
use crate::session::CredentialStore;
use crate::transport::TransportOptions;
use std::sync::Arc;
use tracing::debug;

/// Inline prompt when history is requested without a session
pub const LOGIN_PROMPT_CHAT: &str = "Vui lòng đăng nhập để chat hỗ trợ.";
/// Inline prompt when a send is attempted without a session
pub const LOGIN_PROMPT_SEND: &str = "Vui lòng đăng nhập để gửi tin nhắn.";

pub struct SupportChatController {
    api: RestClient,
    config: ChatConfig,
    store: Arc<dyn CredentialStore>,
    conversation: Conversation,
    open: bool,
    error: Option<String>,
    scroll_requested: bool,
}

impl SupportChatController {
    pub fn new(config: ChatConfig, store: Arc<dyn CredentialStore>) -> Self {
        let api = RestClient::new(&config, store.clone());
        let conversation = Conversation::new(config.support_user_id);
        Self {
            api,
            config,
            store,
            conversation,
            open: false,
            error: None,
            scroll_requested: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// One-shot scroll-to-latest request, set on every content change while
    /// the view is open.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Connection parameters for the transport owned by this view, or None
    /// when the session cannot be resolved. Re-reads the credential store on
    /// every call.
    pub fn transport_options(&self) -> Option<TransportOptions> {
        TransportOptions::resolve(&self.config, self.store.as_ref())
    }

    /// Open the conversation view and (re)load history
    pub async fn open(&mut self) {
        self.open = true;
        self.reload().await;
    }

    /// Close the view; the conversation is discarded
    pub fn close(&mut self) {
        self.open = false;
        self.conversation.clear();
        self.error = None;
    }

    /// Fetch the history snapshot for the support conversation. Failures clear
    /// the list and leave an inline error; a retry is the same call again.
    pub async fn reload(&mut self) {
        self.error = None;
        match self.api.load_history(self.config.support_user_id).await {
            Ok(messages) => {
                self.conversation.replace(messages);
                self.scroll_requested = true;
            }
            Err(ChatError::Unauthenticated) => {
                self.conversation.clear();
                self.error = Some(LOGIN_PROMPT_CHAT.to_string());
            }
            Err(e) => {
                debug!("history load failed: {}", e);
                self.conversation.clear();
                self.error = Some(e.inline_text(FALLBACK_HISTORY));
            }
        }
    }

    /// Dispatch a draft. Returns true when the message was accepted (the
    /// embedder clears its input); whitespace-only drafts are a silent no-op.
    pub async fn send(&mut self, draft: &str) -> bool {
        self.error = None;
        match self.api.send_message(self.config.support_user_id, draft).await {
            Ok(None) => false,
            Ok(Some(confirmed)) => {
                // Same dedup path as a pushed message: the broker will echo
                // this record back over our own subscription.
                if self.conversation.ingest(confirmed) && self.open {
                    self.scroll_requested = true;
                }
                true
            }
            Err(ChatError::Unauthenticated) => {
                self.error = Some(LOGIN_PROMPT_SEND.to_string());
                false
            }
            Err(e) => {
                self.error = Some(e.inline_text(FALLBACK_SEND));
                false
            }
        }
    }

    /// Fold one live push into the view. Messages not involving the support
    /// identity are ignored here.
    pub fn handle_push(&mut self, message: ChatMessage) -> bool {
        let added = self.conversation.ingest(message);
        if added && self.open {
            self.scroll_requested = true;
        }
        added
    }
}
