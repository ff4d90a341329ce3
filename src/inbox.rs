/// Admin multi-conversation inbox controller
///
/// Maintains the roster of counterparties who have exchanged messages with the
/// operator, the current selection, and the open conversation. Every inbound
/// live message triggers a roster refetch (conservative full-refetch policy,
/// no incremental diffing); history loads are two-phase so a stale response
/// can never overwrite a newer selection.
use crate::chat_types::{ChatMessage, ChatUser, ConnectionState};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::reconciler::Conversation;
use crate::rest_client::{RestClient, FALLBACK_ROSTER, FALLBACK_SEND};
use crate::session::CredentialStore;
use crate::transport::TransportOptions;
use std::sync::Arc;
use tracing::debug;

/// Generic fallback when a conversation load fails without a server message
pub const FALLBACK_CONVERSATION: &str = "Không thể tải đoạn chat.";
/// Inline prompt when the operator session has no token
pub const LOGIN_PROMPT_ADMIN: &str = "Không tìm thấy token đăng nhập.";
/// Status line while the realtime connection is up
pub const STATUS_REALTIME_UP: &str = "Đang kết nối realtime";
/// Status line while the realtime connection is down
pub const STATUS_REALTIME_DOWN: &str = "Mất kết nối realtime";

/// Guard for one in-flight history load: a commit applies only while the
/// ticket still matches the live selection and sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryTicket {
    seq: u64,
    counterparty: u64,
}

/// What folding one live push implies for the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushEffect {
    /// The message entered the open conversation
    pub ingested: bool,
    /// The roster may have changed; refetch it (always set)
    pub refresh_roster: bool,
}

pub struct InboxController {
    api: RestClient,
    config: ChatConfig,
    store: Arc<dyn CredentialStore>,
    roster: Vec<ChatUser>,
    conversation: Option<Conversation>,
    load_seq: u64,
    error: Option<String>,
    socket_state: ConnectionState,
    scroll_requested: bool,
}

impl InboxController {
    pub fn new(config: ChatConfig, store: Arc<dyn CredentialStore>) -> Self {
        let api = RestClient::new(&config, store.clone());
        Self {
            api,
            config,
            store,
            roster: Vec::new(),
            conversation: None,
            load_seq: 0,
            error: None,
            socket_state: ConnectionState::Disconnected,
            scroll_requested: false,
        }
    }

    pub fn roster(&self) -> &[ChatUser] {
        &self.roster
    }

    pub fn selected_id(&self) -> Option<u64> {
        self.conversation.as_ref().map(|c| c.counterparty())
    }

    pub fn selected_user(&self) -> Option<&ChatUser> {
        let id = self.selected_id()?;
        self.roster.iter().find(|u| u.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation
            .as_ref()
            .map(|c| c.messages())
            .unwrap_or_default()
    }

    pub fn error_text(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Passive one-line connection indicator for the inbox header
    pub fn set_connection_state(&mut self, state: ConnectionState) {
        self.socket_state = state;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.socket_state
    }

    pub fn connection_note(&self) -> &'static str {
        match self.socket_state {
            ConnectionState::Connected => STATUS_REALTIME_UP,
            _ => STATUS_REALTIME_DOWN,
        }
    }

    /// Connection parameters for the transport owned by this inbox session
    pub fn transport_options(&self) -> Option<TransportOptions> {
        TransportOptions::resolve(&self.config, self.store.as_ref())
    }

    /// Install a refreshed roster. Selection keeps the current entry when it
    /// survived the refetch, falls back to the first entry otherwise, and
    /// clears (with the conversation) when the roster is empty. Returns true
    /// when the selection changed, i.e. the caller owes a history load.
    pub fn apply_roster(&mut self, users: Vec<ChatUser>) -> bool {
        self.roster = users;

        let current = self.selected_id();
        let next = match current {
            Some(id) if self.roster.iter().any(|u| u.id == id) => Some(id),
            _ => self.roster.first().map(|u| u.id),
        };

        if next == current {
            return false;
        }
        self.set_selection(next);
        true
    }

    /// Select a roster entry. No-op for ids not on the roster or for the
    /// current selection; the caller owes a history load when this returns
    /// true.
    pub fn select(&mut self, user_id: u64) -> bool {
        if self.selected_id() == Some(user_id) || !self.roster.iter().any(|u| u.id == user_id) {
            return false;
        }
        self.set_selection(Some(user_id));
        true
    }

    fn set_selection(&mut self, user_id: Option<u64>) {
        // The prior conversation is discarded; any in-flight load for it
        // becomes stale (its ticket stops matching).
        self.load_seq += 1;
        self.conversation = user_id.map(Conversation::new);
    }

    /// First phase of a history load: capture the selection it is for.
    pub fn begin_history_load(&mut self) -> Option<HistoryTicket> {
        let counterparty = self.selected_id()?;
        self.load_seq += 1;
        Some(HistoryTicket {
            seq: self.load_seq,
            counterparty,
        })
    }

    /// Second phase: commit a resolved load, unless the selection moved on
    /// while it was in flight.
    pub fn commit_history(&mut self, ticket: HistoryTicket, messages: Vec<ChatMessage>) -> bool {
        if ticket.seq != self.load_seq {
            debug!(
                "discarding stale history load for counterparty {}",
                ticket.counterparty
            );
            return false;
        }
        match self.conversation.as_mut() {
            Some(conv) if conv.counterparty() == ticket.counterparty => {
                conv.replace(messages);
                self.scroll_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Fetch and install the roster, auto-selecting per `apply_roster`; a
    /// selection change also reloads the conversation.
    pub async fn refresh_roster(&mut self) {
        self.error = None;
        match self.api.load_roster().await {
            Ok(users) => {
                if self.apply_roster(users) {
                    self.reload_conversation().await;
                }
            }
            Err(ChatError::Unauthenticated) => {
                self.error = Some(LOGIN_PROMPT_ADMIN.to_string());
            }
            Err(e) => {
                self.error = Some(e.inline_text(FALLBACK_ROSTER));
            }
        }
    }

    /// Reload the open conversation through the two-phase guard
    pub async fn reload_conversation(&mut self) {
        let Some(ticket) = self.begin_history_load() else {
            return;
        };
        self.error = None;
        match self.api.load_history(ticket.counterparty).await {
            Ok(messages) => {
                self.commit_history(ticket, messages);
            }
            Err(ChatError::Unauthenticated) => {
                self.error = Some(LOGIN_PROMPT_ADMIN.to_string());
            }
            Err(e) => {
                self.error = Some(e.inline_text(FALLBACK_CONVERSATION));
                if let Some(conv) = self.conversation.as_mut() {
                    conv.clear();
                }
            }
        }
    }

    /// Select a counterparty and load their conversation
    pub async fn select_user(&mut self, user_id: u64) {
        if self.select(user_id) {
            self.reload_conversation().await;
        }
    }

    /// Fold one live push. The conversation only takes messages relevant to
    /// the current selection, but every push requests a roster refetch so new
    /// counterparties appear without a manual reload.
    pub fn handle_push(&mut self, message: ChatMessage) -> PushEffect {
        let ingested = match self.conversation.as_mut() {
            Some(conv) => conv.ingest(message),
            None => false,
        };
        if ingested {
            self.scroll_requested = true;
        }
        PushEffect {
            ingested,
            refresh_roster: true,
        }
    }

    /// Convenience: fold the push, then run the implied roster refetch
    pub async fn on_push(&mut self, message: ChatMessage) -> PushEffect {
        let effect = self.handle_push(message);
        self.refresh_roster().await;
        effect
    }

    /// Dispatch a draft to the selected counterparty. Returns true when
    /// accepted; a send also implies a roster refetch (the counterparty may
    /// be new to the roster).
    pub async fn send(&mut self, draft: &str) -> bool {
        let Some(counterparty) = self.selected_id() else {
            return false;
        };
        self.error = None;
        match self.api.send_message(counterparty, draft).await {
            Ok(None) => false,
            Ok(Some(confirmed)) => {
                if let Some(conv) = self.conversation.as_mut() {
                    if conv.ingest(confirmed) {
                        self.scroll_requested = true;
                    }
                }
                self.refresh_roster().await;
                true
            }
            Err(ChatError::Unauthenticated) => {
                self.error = Some(LOGIN_PROMPT_ADMIN.to_string());
                false
            }
            Err(e) => {
                self.error = Some(e.inline_text(FALLBACK_SEND));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryCredentialStore;

    fn controller() -> InboxController {
        InboxController::new(ChatConfig::default(), Arc::new(MemoryCredentialStore::new()))
    }

    fn user(id: u64) -> ChatUser {
        ChatUser {
            id,
            full_name: format!("User {}", id),
            email: format!("u{}@example.com", id),
        }
    }

    fn msg(id: u64, sender: u64, receiver: u64) -> ChatMessage {
        ChatMessage {
            id,
            sender_id: sender,
            receiver_id: receiver,
            content: "hi".to_string(),
            created_at: "t".to_string(),
            read: false,
        }
    }

    #[test]
    fn test_auto_selects_first_roster_entry() {
        let mut inbox = controller();
        assert!(inbox.apply_roster(vec![user(3), user(4)]));
        assert_eq!(inbox.selected_id(), Some(3));
        // a refetch with the same roster keeps the selection, no reload owed
        assert!(!inbox.apply_roster(vec![user(3), user(4)]));
    }

    #[test]
    fn test_selection_survives_roster_refresh() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3)]);
        assert_eq!(inbox.selected_id(), Some(3));

        // push from a new counterparty triggers a refetch; selection stays
        let effect = inbox.handle_push(msg(1, 9, 1));
        assert!(effect.refresh_roster);
        assert!(!effect.ingested);

        assert!(!inbox.apply_roster(vec![user(3), user(9)]));
        assert_eq!(inbox.selected_id(), Some(3));
    }

    #[test]
    fn test_selection_falls_back_when_entry_disappears() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3), user(4)]);
        inbox.select(4);
        assert_eq!(inbox.selected_id(), Some(4));

        assert!(inbox.apply_roster(vec![user(3)]));
        assert_eq!(inbox.selected_id(), Some(3));

        assert!(inbox.apply_roster(Vec::new()));
        assert_eq!(inbox.selected_id(), None);
        assert!(inbox.messages().is_empty());
    }

    #[test]
    fn test_stale_history_load_is_discarded() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3), user(4)]);

        // load for counterparty 3 goes in flight...
        let stale = inbox.begin_history_load().unwrap();

        // ...the operator switches to 4 before it resolves
        assert!(inbox.select(4));
        let fresh = inbox.begin_history_load().unwrap();
        assert!(inbox.commit_history(fresh, vec![msg(10, 4, 1)]));

        // the stale result must not touch the now-selected conversation
        assert!(!inbox.commit_history(stale, vec![msg(99, 3, 1)]));
        let ids: Vec<u64> = inbox.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[test]
    fn test_newer_begin_invalidates_older_ticket() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3)]);

        let first = inbox.begin_history_load().unwrap();
        let second = inbox.begin_history_load().unwrap();
        assert!(!inbox.commit_history(first, vec![msg(1, 3, 1)]));
        assert!(inbox.commit_history(second, vec![msg(2, 3, 1)]));
    }

    #[test]
    fn test_push_folds_only_into_selected_conversation() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3), user(4)]);
        assert_eq!(inbox.selected_id(), Some(3));

        let effect = inbox.handle_push(msg(1, 3, 1));
        assert!(effect.ingested);
        let effect = inbox.handle_push(msg(2, 4, 1));
        assert!(!effect.ingested);
        assert!(effect.refresh_roster);

        assert_eq!(inbox.messages().len(), 1);
    }

    #[test]
    fn test_switching_selection_discards_prior_conversation() {
        let mut inbox = controller();
        inbox.apply_roster(vec![user(3), user(4)]);
        let ticket = inbox.begin_history_load().unwrap();
        inbox.commit_history(ticket, vec![msg(1, 3, 1), msg(2, 1, 3)]);
        assert_eq!(inbox.messages().len(), 2);

        inbox.select(4);
        assert!(inbox.messages().is_empty());
    }

    #[test]
    fn test_connection_note() {
        let mut inbox = controller();
        assert_eq!(inbox.connection_note(), STATUS_REALTIME_DOWN);
        inbox.set_connection_state(ConnectionState::Connected);
        assert_eq!(inbox.connection_note(), STATUS_REALTIME_UP);
        inbox.set_connection_state(ConnectionState::Connecting);
        assert_eq!(inbox.connection_note(), STATUS_REALTIME_DOWN);
    }

    #[tokio::test]
    async fn test_refresh_without_session_sets_prompt() {
        let mut inbox = controller();
        inbox.refresh_roster().await;
        assert_eq!(inbox.error_text(), Some(LOGIN_PROMPT_ADMIN));
        assert!(inbox.roster().is_empty());
    }

    #[tokio::test]
    async fn test_send_without_selection_is_a_noop() {
        let mut inbox = controller();
        assert!(!inbox.send("hello").await);
        assert_eq!(inbox.error_text(), None);
    }
}
