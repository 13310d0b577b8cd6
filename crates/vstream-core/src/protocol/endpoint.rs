//! URL layout of the streaming endpoints.
//!
//! ```text
//! {base}/{channel}/{key}/publish    publish role
//! {base}/{channel}/{key}/receive    watch role
//! ```
//!
//! The role is selected entirely by the path suffix.  Channel identifiers and
//! keys are percent-encoded as single path segments using the same character
//! set as the browser's `encodeURIComponent`, so URLs built here match the
//! ones the web client produces.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::domain::session::Role;

/// Characters escaped in a path component: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors produced while building an endpoint URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The base URL does not use the `ws` or `wss` scheme.
    #[error("streaming base URL must start with ws:// or wss://, got '{0}'")]
    InvalidBase(String),

    /// The channel identifier is empty.
    #[error("channel identifier must not be empty")]
    EmptyChannel,

    /// The streaming key is empty.
    #[error("streaming key must not be empty")]
    EmptyKey,
}

/// Percent-encodes `value` for use as one URL path segment.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Builds the WebSocket URL for a session.
///
/// A trailing `/` on `base` is ignored.
///
/// # Errors
///
/// Returns [`EndpointError`] if the base is not a WebSocket URL or if the
/// channel or key is empty.
///
/// # Examples
///
/// ```rust
/// use vstream_core::{session_url, Role};
///
/// let url = session_url("wss://live.example.com/", "my channel", "k3y", Role::Publish).unwrap();
/// assert_eq!(url, "wss://live.example.com/my%20channel/k3y/publish");
/// ```
pub fn session_url(base: &str, channel: &str, key: &str, role: Role) -> Result<String, EndpointError> {
    if !(base.starts_with("ws://") || base.starts_with("wss://")) {
        return Err(EndpointError::InvalidBase(base.to_string()));
    }
    if channel.is_empty() {
        return Err(EndpointError::EmptyChannel);
    }
    if key.is_empty() {
        return Err(EndpointError::EmptyKey);
    }

    Ok(format!(
        "{}/{}/{}/{}",
        base.trim_end_matches('/'),
        encode_component(channel),
        encode_component(key),
        role.path_suffix()
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_url_uses_publish_suffix() {
        let url = session_url("ws://127.0.0.1:8080", "ch1", "key1", Role::Publish).unwrap();
        assert_eq!(url, "ws://127.0.0.1:8080/ch1/key1/publish");
    }

    #[test]
    fn test_watch_url_uses_receive_suffix() {
        let url = session_url("ws://127.0.0.1:8080", "ch1", "key1", Role::Watch).unwrap();
        assert_eq!(url, "ws://127.0.0.1:8080/ch1/key1/receive");
    }

    #[test]
    fn test_trailing_slash_on_base_is_ignored() {
        let url = session_url("wss://example.com///", "c", "k", Role::Watch).unwrap();
        assert_eq!(url, "wss://example.com/c/k/receive");
    }

    #[test]
    fn test_components_are_percent_encoded() {
        let url = session_url("ws://h", "a/b c", "k?&=#", Role::Publish).unwrap();
        assert_eq!(url, "ws://h/a%2Fb%20c/k%3F%26%3D%23/publish");
    }

    #[test]
    fn test_encode_component_keeps_unreserved_marks() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
    }

    #[test]
    fn test_encode_component_encodes_utf8() {
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn test_http_base_is_rejected() {
        let result = session_url("http://example.com", "c", "k", Role::Publish);
        assert_eq!(
            result,
            Err(EndpointError::InvalidBase("http://example.com".to_string()))
        );
    }

    #[test]
    fn test_empty_channel_is_rejected() {
        assert_eq!(
            session_url("ws://h", "", "k", Role::Publish),
            Err(EndpointError::EmptyChannel)
        );
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert_eq!(
            session_url("ws://h", "c", "", Role::Watch),
            Err(EndpointError::EmptyKey)
        );
    }
}
