//! Preview-thumbnail configuration codec.
//!
//! The server stores a channel's preview settings as `WIDTHxHEIGHT,DELAY`
//! (for example `256x144,5`: one 256×144 thumbnail every 5 seconds) or as
//! `False` when previews are turned off.  Decoding is case-insensitive and
//! lenient: anything that does not describe positive dimensions and a
//! positive delay decodes to the disabled configuration.
//!
//! The fields are private: an enabled config always has positive values, and
//! serde uses the stored string form, so every value survives an encode →
//! decode round trip.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Preview-thumbnail settings of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PreviewsConfig {
    enabled: bool,
    width: u32,
    height: u32,
    delay_seconds: u32,
}

impl PreviewsConfig {
    /// Previews turned off.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Previews turned on.  Any zero argument yields the disabled config.
    pub fn enabled(width: u32, height: u32, delay_seconds: u32) -> Self {
        if width == 0 || height == 0 || delay_seconds == 0 {
            return Self::disabled();
        }
        Self {
            enabled: true,
            width,
            height,
            delay_seconds,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Thumbnail width; zero when disabled.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Seconds between thumbnails; zero when disabled.
    pub fn delay_seconds(&self) -> u32 {
        self.delay_seconds
    }

    /// Encodes the config the way the server stores it.
    pub fn encode(&self) -> String {
        if self.enabled {
            format!("{}x{},{}", self.width, self.height, self.delay_seconds)
        } else {
            "False".to_string()
        }
    }

    /// Decodes a stored config string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vstream_core::PreviewsConfig;
    ///
    /// assert_eq!(PreviewsConfig::decode("256x144,5"), PreviewsConfig::enabled(256, 144, 5));
    /// assert!(!PreviewsConfig::decode("false").is_enabled());
    /// ```
    pub fn decode(text: &str) -> Self {
        let text = text.trim().to_ascii_lowercase();
        if text.is_empty() || text == "false" {
            return Self::disabled();
        }

        let positive = |part: Option<&str>| -> u32 {
            part.and_then(|p| p.trim().parse::<i64>().ok())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };

        let (size, delay) = match text.split_once(',') {
            Some((size, delay)) => (size, Some(delay)),
            None => (text.as_str(), None),
        };
        let mut dims = size.trim().splitn(2, 'x');
        let width = positive(dims.next());
        let height = positive(dims.next());

        Self::enabled(width, height, positive(delay))
    }
}

impl From<String> for PreviewsConfig {
    fn from(text: String) -> Self {
        Self::decode(&text)
    }
}

impl From<PreviewsConfig> for String {
    fn from(config: PreviewsConfig) -> Self {
        config.encode()
    }
}

impl fmt::Display for PreviewsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_enabled() {
        assert_eq!(PreviewsConfig::enabled(256, 144, 5).encode(), "256x144,5");
    }

    #[test]
    fn test_encode_disabled_is_capitalised_false() {
        assert_eq!(PreviewsConfig::disabled().encode(), "False");
    }

    #[test]
    fn test_decode_enabled_with_whitespace_and_case() {
        let config = PreviewsConfig::decode("  640X360 , 10 ");
        assert_eq!(config, PreviewsConfig::enabled(640, 360, 10));
    }

    #[test]
    fn test_decode_disabled_spellings() {
        for text in ["", "   ", "false", "False", "FALSE"] {
            assert_eq!(PreviewsConfig::decode(text), PreviewsConfig::disabled(), "input {text:?}");
        }
    }

    #[test]
    fn test_decode_non_positive_values_disable() {
        assert!(!PreviewsConfig::decode("0x144,5").is_enabled());
        assert!(!PreviewsConfig::decode("256x144,0").is_enabled());
        assert!(!PreviewsConfig::decode("256x-1,5").is_enabled());
        assert!(!PreviewsConfig::decode("256x144").is_enabled());
        assert!(!PreviewsConfig::decode("garbage").is_enabled());
    }

    #[test]
    fn test_enabled_constructor_rejects_zero() {
        assert_eq!(PreviewsConfig::enabled(0, 144, 5), PreviewsConfig::disabled());
    }

    #[test]
    fn test_accessors_of_enabled_config() {
        let config = PreviewsConfig::enabled(256, 144, 5);
        assert!(config.is_enabled());
        assert_eq!((config.width(), config.height(), config.delay_seconds()), (256, 144, 5));
    }

    #[test]
    fn test_serde_cannot_build_enabled_config_with_zero_size() {
        let config: PreviewsConfig = serde_json::from_str("\"0x144,5\"").unwrap();
        assert_eq!(config, PreviewsConfig::disabled());

        let json = serde_json::to_string(&PreviewsConfig::enabled(256, 144, 5)).unwrap();
        assert_eq!(json, "\"256x144,5\"");
    }

    #[test]
    fn test_decode_of_encode_is_identity() {
        for config in [PreviewsConfig::disabled(), PreviewsConfig::enabled(320, 180, 3)] {
            assert_eq!(PreviewsConfig::decode(&config.encode()), config);
        }
    }
}
