/// Session identity resolution from persisted client state
///
/// The surrounding app persists a bearer token and a JSON identity record in a
/// key/value credential store. Everything here is best-effort: absent keys,
/// unparseable records, or a missing/non-numeric id all resolve to None —
/// never an error.
use std::collections::HashMap;
use std::sync::RwLock;

/// Storage key of the bearer token
pub const TOKEN_KEY: &str = "token";
/// Storage key of the JSON identity record
pub const USER_KEY: &str = "user";

/// Capability over the persisted key/value client state. Components depend on
/// this trait, not on a concrete storage mechanism.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory credential store (tests, embedders without platform storage)
#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

/// Bearer token of the current session, if any
pub fn bearer_token(store: &dyn CredentialStore) -> Option<String> {
    store.get(TOKEN_KEY).filter(|t| !t.is_empty())
}

/// Numeric id of the current identity, parsed from the persisted record.
/// The id field may arrive as a JSON number or a numeric string.
pub fn current_user_id(store: &dyn CredentialStore) -> Option<u64> {
    let raw = store.get(USER_KEY)?;
    let record: serde_json::Value = serde_json::from_str(&raw).ok()?;
    match record.get("id")? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse::<u64>().ok(),
        _ => None,
    }
}
