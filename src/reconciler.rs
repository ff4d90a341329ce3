/// Message stream reconciliation
///
/// A conversation receives messages from two racing sources: the point-in-time
/// history snapshot and the live broker push (plus the echo of our own sends,
/// which arrive once via the send confirmation and again over our own topic
/// subscription). Dedup by server-assigned id is the single rule that collapses
/// all of these into one logical entry.
use crate::chat_types::ChatMessage;

/// Ordered message list between the current identity and one counterparty.
///
/// Order is append-only: the history snapshot is authoritative for everything
/// up to the fetch, live messages are appended in arrival order and never
/// re-sorted. Assumes a push is never observed before the snapshot that should
/// contain it; a push that races a slower snapshot fetch would be overwritten
/// by the later `replace`.
#[derive(Debug)]
pub struct Conversation {
    counterparty: u64,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Empty conversation pinned to one counterparty; the relevance filter of
    /// `ingest` is fixed for the lifetime of the value.
    pub fn new(counterparty: u64) -> Self {
        Self {
            counterparty,
            messages: Vec::new(),
        }
    }

    pub fn counterparty(&self) -> u64 {
        self.counterparty
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Install a history snapshot wholesale, discarding prior contents.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Fold one candidate into the conversation. Accepted and appended iff it
    /// names the counterparty as sender or receiver and no element with the
    /// same id is already present. Returns whether it was newly added.
    ///
    /// Linear scan: fine at chat-widget scale (tens to low hundreds of
    /// messages per conversation).
    pub fn ingest(&mut self, candidate: ChatMessage) -> bool {
        if !candidate.involves(self.counterparty) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == candidate.id) {
            return false;
        }
        self.messages.push(candidate);
        true
    }
}
