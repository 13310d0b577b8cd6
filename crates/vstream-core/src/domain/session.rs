//! Session identity and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which direction a session streams in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Send locally captured segments to the server.
    Publish,
    /// Receive segments from the server and reassemble them.
    Watch,
}

impl Role {
    /// Path suffix that selects this role on the streaming endpoint.
    pub fn path_suffix(self) -> &'static str {
        match self {
            Role::Publish => "publish",
            Role::Watch => "receive",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Publish => f.write_str("publish"),
            Role::Watch => f.write_str("watch"),
        }
    }
}

/// Lifecycle state of a transport session.
///
/// ```text
/// CONNECTING ──handshake ok──▶ OPEN ──close / error / device ended──▶ CLOSED
///      │                                                                ▲
///      └──────────────handshake failed / error / close──────────────────┘
/// ```
///
/// There is no reconnecting state: CLOSED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => f.write_str("CONNECTING"),
            SessionState::Open => f.write_str("OPEN"),
            SessionState::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Identifies a session by channel, access key, and role.
///
/// The key is a credential.  `Debug` and `Display` redact it so session
/// identifiers can be logged freely.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId {
    pub channel: String,
    pub key: String,
    pub role: Role,
}

impl SessionId {
    pub fn new(channel: impl Into<String>, key: impl Into<String>, role: Role) -> Self {
        Self {
            channel: channel.into(),
            key: key.into(),
            role,
        }
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionId")
            .field("channel", &self.channel)
            .field("key", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.channel)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_path_suffixes() {
        assert_eq!(Role::Publish.path_suffix(), "publish");
        assert_eq!(Role::Watch.path_suffix(), "receive");
    }

    #[test]
    fn test_session_id_display_omits_key() {
        let id = SessionId::new("news", "s3cret", Role::Watch);
        let shown = id.to_string();
        assert_eq!(shown, "watch:news");
        assert!(!shown.contains("s3cret"));
    }

    #[test]
    fn test_session_id_debug_redacts_key() {
        let id = SessionId::new("news", "s3cret", Role::Publish);
        let debug = format!("{id:?}");
        assert!(debug.contains("news"));
        assert!(!debug.contains("s3cret"), "key must not appear in Debug output");
    }

    #[test]
    fn test_state_display_is_uppercase() {
        assert_eq!(SessionState::Connecting.to_string(), "CONNECTING");
        assert_eq!(SessionState::Open.to_string(), "OPEN");
        assert_eq!(SessionState::Closed.to_string(), "CLOSED");
    }
}
