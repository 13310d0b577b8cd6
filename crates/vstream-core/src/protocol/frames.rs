//! Frame model for the streaming connection and the control-signal decoder.
//!
//! The streaming WebSocket multiplexes two channels over one connection:
//!
//! ```text
//! binary frame:  [encoded media segment .....]      (no header, no sequence)
//! text frame:    "h"                                 heartbeat
//! text frame:    "ERROR:" <free text>                error report
//! ```
//!
//! Media segments carry no sequence number.  Their order is exactly the order
//! in which the connection delivers them, so a receiver must never reorder or
//! deduplicate binary frames.
//!
//! # Frame-type discrimination
//!
//! Text frames are classified by comparing the *whole* frame against the
//! heartbeat literal first and only then testing for the error marker.  The
//! two rules cannot overlap: the heartbeat is a complete one-byte frame, while
//! every error report starts with the six-byte marker.  An error whose message
//! happens to be `"h"` is sent as `"ERROR:h"` and still decodes as an error.
//!
//! Anything else is an unknown frame and is ignored by the receiver.

use bytes::Bytes;

/// Text payload of a keep-alive frame.
pub const HEARTBEAT: &str = "h";

/// Prefix that marks a text frame as an error report.
pub const ERROR_MARKER: &str = "ERROR:";

/// One message travelling over the streaming connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An opaque encoded media segment.
    Binary(Bytes),
    /// A textual control signal.
    Text(String),
}

impl Frame {
    /// Builds the text frame carrying `message`.
    pub fn control(message: &ControlMessage) -> Self {
        Frame::Text(message.encode())
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Frame::Binary(data) => data.len(),
            Frame::Text(text) => text.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded text-channel signal.
///
/// The channel is advisory: error reports carry free text only, never a
/// structured code, so callers must not branch on the message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Keep-alive sent by either side; requires no action.
    Heartbeat,
    /// Human-readable error reported by the server.
    Error(String),
}

impl ControlMessage {
    /// Classifies a text frame.
    ///
    /// Returns `None` for frames that are neither a heartbeat nor an error
    /// report.  The marker is stripped from error reports together with any
    /// whitespace that follows it, so both `"ERROR:disk full"` and
    /// `"ERROR: disk full"` yield `"disk full"`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vstream_core::ControlMessage;
    ///
    /// assert_eq!(ControlMessage::decode("h"), Some(ControlMessage::Heartbeat));
    /// assert_eq!(
    ///     ControlMessage::decode("ERROR:disk full"),
    ///     Some(ControlMessage::Error("disk full".to_string()))
    /// );
    /// assert_eq!(ControlMessage::decode("hello"), None);
    /// ```
    pub fn decode(text: &str) -> Option<Self> {
        if text == HEARTBEAT {
            return Some(ControlMessage::Heartbeat);
        }

        text.strip_prefix(ERROR_MARKER)
            .map(|rest| ControlMessage::Error(rest.trim_start().to_string()))
    }

    /// Encodes the message as the text frame payload.
    pub fn encode(&self) -> String {
        match self {
            ControlMessage::Heartbeat => HEARTBEAT.to_string(),
            ControlMessage::Error(message) => format!("{ERROR_MARKER}{message}"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_heartbeat_exact_match() {
        assert_eq!(ControlMessage::decode("h"), Some(ControlMessage::Heartbeat));
    }

    #[test]
    fn test_decode_heartbeat_requires_whole_frame() {
        // "hh" and "h " are not heartbeats, and they are not errors either.
        assert_eq!(ControlMessage::decode("hh"), None);
        assert_eq!(ControlMessage::decode("h "), None);
        assert_eq!(ControlMessage::decode("H"), None);
    }

    #[test]
    fn test_decode_error_strips_marker() {
        assert_eq!(
            ControlMessage::decode("ERROR:disk full"),
            Some(ControlMessage::Error("disk full".to_string()))
        );
    }

    #[test]
    fn test_decode_error_strips_space_after_marker() {
        // Servers send "ERROR: Invalid streaming key" with a space.
        assert_eq!(
            ControlMessage::decode("ERROR: Invalid streaming key"),
            Some(ControlMessage::Error("Invalid streaming key".to_string()))
        );
    }

    #[test]
    fn test_decode_error_with_heartbeat_literal_as_message() {
        assert_eq!(
            ControlMessage::decode("ERROR:h"),
            Some(ControlMessage::Error("h".to_string()))
        );
    }

    #[test]
    fn test_decode_error_with_empty_message() {
        assert_eq!(
            ControlMessage::decode("ERROR:"),
            Some(ControlMessage::Error(String::new()))
        );
    }

    #[test]
    fn test_decode_unknown_frames_are_ignored() {
        for text in ["", "hello", "error:lowercase", " ERROR:leading space", "{\"a\":1}"] {
            assert_eq!(ControlMessage::decode(text), None, "frame {text:?}");
        }
    }

    #[test]
    fn test_encode_heartbeat() {
        assert_eq!(ControlMessage::Heartbeat.encode(), "h");
    }

    #[test]
    fn test_encode_error() {
        let msg = ControlMessage::Error("stream not found".to_string());
        assert_eq!(msg.encode(), "ERROR:stream not found");
    }

    #[test]
    fn test_frame_control_builds_text_frame() {
        assert_eq!(
            Frame::control(&ControlMessage::Heartbeat),
            Frame::Text("h".to_string())
        );
    }

    #[test]
    fn test_frame_len_and_is_empty() {
        assert_eq!(Frame::Binary(Bytes::from_static(&[1, 2, 3])).len(), 3);
        assert!(Frame::Binary(Bytes::new()).is_empty());
        assert_eq!(Frame::Text("h".to_string()).len(), 1);
    }
}
