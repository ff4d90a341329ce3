/// Configuration management
use std::time::Duration;

/// Identity of the support operator every customer conversation is pinned to.
pub const DEFAULT_SUPPORT_USER_ID: u64 = 6;

/// Fixed delay between reconnect attempts of the realtime transport.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Client configuration
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the REST backend (no trailing slash)
    pub api_base_url: String,

    /// WebSocket URL of the STOMP broker endpoint
    pub ws_url: String,

    /// Numeric id of the support operator account
    pub support_user_id: u64,

    /// Delay between reconnect attempts after a dropped connection
    pub reconnect_delay: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let api_base_url = "http://localhost:8080".to_string();
        let ws_url = ws_url_from_api(&api_base_url);
        Self {
            api_base_url,
            ws_url,
            support_user_id: DEFAULT_SUPPORT_USER_ID,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ChatConfig {
    /// Defaults with env overrides (nice for scripts):
    /// CHATLINK_API_URL, CHATLINK_WS_URL, CHATLINK_SUPPORT_ID, CHATLINK_RECONNECT_MS
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CHATLINK_API_URL") {
            config.ws_url = ws_url_from_api(&url);
            config.api_base_url = url;
        }
        if let Ok(url) = std::env::var("CHATLINK_WS_URL") {
            config.ws_url = url;
        }
        if let Some(id) = std::env::var("CHATLINK_SUPPORT_ID")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.support_user_id = id;
        }
        if let Some(ms) = std::env::var("CHATLINK_RECONNECT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.reconnect_delay = Duration::from_millis(ms);
        }

        config
    }
}

/// Derive the broker URL from the API base URL the way the web client does:
/// rewrite the scheme http→ws and append the native WebSocket path.
pub fn ws_url_from_api(api_base_url: &str) -> String {
    format!("{}/ws-native", api_base_url.replacen("http", "ws", 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_derivation() {
        assert_eq!(
            ws_url_from_api("http://localhost:8080"),
            "ws://localhost:8080/ws-native"
        );
        assert_eq!(
            ws_url_from_api("https://shop.example.com"),
            "wss://shop.example.com/ws-native"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.support_user_id, DEFAULT_SUPPORT_USER_ID);
        assert_eq!(config.reconnect_delay, Duration::from_secs(2));
        assert_eq!(config.ws_url, "ws://localhost:8080/ws-native");
    }
}
