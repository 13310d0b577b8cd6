//! Resolution-list codec.
//!
//! A channel's transcoding targets are stored on the server as one string:
//!
//! ```text
//! ORIGINAL,1920x1080-30,1280x720-30~3000,640x360
//! │        │         │            │
//! │        │         │            └─ bitrate limit in kbit/s (optional)
//! │        │         └─ frames per second (optional)
//! │        └─ WIDTHxHEIGHT
//! └─ keep the original stream as well (optional, case-insensitive)
//! ```
//!
//! Decoding is lenient the same way the server is: entries whose size does
//! not parse, or that have a non-positive width or height, are skipped.  FPS
//! and bitrate are read from their leading digits (`30fps` is 30); a value
//! that is missing, unreadable, zero or negative means "not set" and is
//! omitted when encoding.
//!
//! The fields of [`Resolution`] are private so that "not set" has exactly one
//! representation, and serde goes through the same string form.
//!
//! # The empty string
//!
//! The server treats an empty list as "original only".  [`ResolutionList`]
//! keeps that meaning in its constructor: a list without entries always has
//! the original flag set.  Because of this normalisation every list that can
//! be constructed survives an encode → decode round trip unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token that stands for the untranscoded input stream.
pub const ORIGINAL_TOKEN: &str = "ORIGINAL";

/// Errors returned when a single resolution entry cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("resolution '{0}' must have the form WIDTHxHEIGHT[-FPS][~BITRATE]")]
    Format(String),
    #[error("resolution '{0}' contains a number that is not a valid integer")]
    Number(String),
    #[error("resolution '{0}' must have a positive width and height")]
    NonPositive(String),
}

/// One transcoding target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    width: u32,
    height: u32,
    fps: Option<u32>,
    bitrate: Option<u32>,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fps: None,
            bitrate: None,
        }
    }

    /// Sets the frame rate.  Zero clears it.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = (fps > 0).then_some(fps);
        self
    }

    /// Sets the bitrate limit.  Zero clears it.
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = (bitrate > 0).then_some(bitrate);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frames per second; `None` keeps the input frame rate.
    pub fn fps(&self) -> Option<u32> {
        self.fps
    }

    /// Bitrate limit in kbit/s; `None` means unlimited.
    pub fn bitrate(&self) -> Option<u32> {
        self.bitrate
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if let Some(fps) = self.fps {
            write!(f, "-{fps}")?;
        }
        if let Some(bitrate) = self.bitrate {
            write!(f, "~{bitrate}")?;
        }
        Ok(())
    }
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let entry = s.trim();
        let number = |text: &str| -> Result<i64, ResolutionError> {
            text.trim()
                .parse::<i64>()
                .map_err(|_| ResolutionError::Number(entry.to_string()))
        };

        let (rest, bitrate) = match entry.split_once('~') {
            Some((rest, bitrate)) => (rest, leading_int(bitrate)),
            None => (entry, None),
        };
        let (size, fps) = match rest.split_once('-') {
            Some((size, fps)) => (size, leading_int(fps)),
            None => (rest, None),
        };
        let (width, height) = size
            .split_once(['x', 'X'])
            .ok_or_else(|| ResolutionError::Format(entry.to_string()))?;
        let (width, height) = (number(width)?, number(height)?);

        let positive = |value: i64| u32::try_from(value).ok().filter(|v| *v > 0);
        match (positive(width), positive(height)) {
            (Some(width), Some(height)) => Ok(Resolution {
                width,
                height,
                fps: fps.and_then(positive),
                bitrate: bitrate.and_then(positive),
            }),
            _ => Err(ResolutionError::NonPositive(entry.to_string())),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        text.parse()
    }
}

impl From<Resolution> for String {
    fn from(resolution: Resolution) -> Self {
        resolution.to_string()
    }
}

/// Reads the optionally signed integer at the start of `text` and ignores
/// whatever follows it.  `None` when there are no digits.
fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let sign = usize::from(text.starts_with(['+', '-']));
    let end = text[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |i| sign + i);
    text[..end].parse().ok()
}

/// The full set of transcoding targets of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ResolutionList {
    has_original: bool,
    resolutions: Vec<Resolution>,
}

impl ResolutionList {
    /// Creates a list.  A list with no entries always keeps the original.
    pub fn new(has_original: bool, resolutions: Vec<Resolution>) -> Self {
        Self {
            has_original: has_original || resolutions.is_empty(),
            resolutions,
        }
    }

    /// The "original only" list, which is also what an empty string means.
    pub fn original_only() -> Self {
        Self::new(true, Vec::new())
    }

    pub fn has_original(&self) -> bool {
        self.has_original
    }

    pub fn resolutions(&self) -> &[Resolution] {
        &self.resolutions
    }

    /// Encodes the list, `ORIGINAL` first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vstream_core::{Resolution, ResolutionList};
    ///
    /// let list = ResolutionList::new(true, vec![Resolution::new(1920, 1080).with_fps(30)]);
    /// assert_eq!(list.encode(), "ORIGINAL,1920x1080-30");
    /// ```
    pub fn encode(&self) -> String {
        let original = self.has_original.then(|| ORIGINAL_TOKEN.to_string());
        original
            .into_iter()
            .chain(self.resolutions.iter().map(Resolution::to_string))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decodes a list, skipping entries that do not parse.
    pub fn decode(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::original_only();
        }

        let mut has_original = false;
        let mut resolutions = Vec::new();

        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.eq_ignore_ascii_case(ORIGINAL_TOKEN) {
                has_original = true;
                continue;
            }
            match part.parse::<Resolution>() {
                Ok(resolution) => resolutions.push(resolution),
                Err(e) => tracing::debug!("skipping resolution entry: {e}"),
            }
        }

        Self::new(has_original, resolutions)
    }
}

impl Default for ResolutionList {
    fn default() -> Self {
        Self::original_only()
    }
}

impl From<String> for ResolutionList {
    fn from(text: String) -> Self {
        Self::decode(&text)
    }
}

impl From<ResolutionList> for String {
    fn from(list: ResolutionList) -> Self {
        list.encode()
    }
}

impl fmt::Display for ResolutionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_original_with_one_entry() {
        let list = ResolutionList::new(true, vec![Resolution::new(1920, 1080).with_fps(30)]);
        assert_eq!(list.encode(), "ORIGINAL,1920x1080-30");
    }

    #[test]
    fn test_decode_original_with_one_entry() {
        let list = ResolutionList::decode("ORIGINAL,1920x1080-30");
        assert!(list.has_original());
        assert_eq!(list.resolutions(), &[Resolution::new(1920, 1080).with_fps(30)]);
    }

    #[test]
    fn test_encode_full_entry() {
        let r = Resolution::new(1280, 720).with_fps(60).with_bitrate(4500);
        assert_eq!(r.to_string(), "1280x720-60~4500");
    }

    #[test]
    fn test_encode_without_original() {
        let list = ResolutionList::new(
            false,
            vec![Resolution::new(1280, 720), Resolution::new(640, 360).with_bitrate(800)],
        );
        assert_eq!(list.encode(), "1280x720,640x360~800");
    }

    #[test]
    fn test_empty_string_means_original_only() {
        assert_eq!(ResolutionList::decode(""), ResolutionList::original_only());
        assert_eq!(ResolutionList::decode("   "), ResolutionList::original_only());
    }

    #[test]
    fn test_empty_list_is_normalised_to_original() {
        let list = ResolutionList::new(false, Vec::new());
        assert!(list.has_original());
        assert_eq!(list.encode(), "ORIGINAL");
    }

    #[test]
    fn test_decode_is_case_insensitive_and_trims() {
        let list = ResolutionList::decode(" original , 1920X1080 - 30 ");
        assert!(list.has_original());
        assert_eq!(list.resolutions(), &[Resolution::new(1920, 1080).with_fps(30)]);
    }

    #[test]
    fn test_decode_skips_invalid_entries() {
        let list = ResolutionList::decode("0x720,abc,1280x720,-5x10,1920x,ax360-30");
        assert!(!list.has_original());
        assert_eq!(list.resolutions(), &[Resolution::new(1280, 720)]);
    }

    #[test]
    fn test_non_positive_fps_and_bitrate_mean_unset() {
        let r: Resolution = "1280x720-0~-1".parse().unwrap();
        assert_eq!(r, Resolution::new(1280, 720));
        assert_eq!(r.to_string(), "1280x720");
    }

    #[test]
    fn test_unreadable_fps_or_bitrate_is_unset() {
        let r: Resolution = "1280x720~abc".parse().unwrap();
        assert_eq!(r, Resolution::new(1280, 720));

        let r: Resolution = "640x360-x".parse().unwrap();
        assert_eq!(r, Resolution::new(640, 360));
    }

    #[test]
    fn test_fps_and_bitrate_read_leading_digits() {
        let r: Resolution = "1920x1080-30fps".parse().unwrap();
        assert_eq!(r, Resolution::new(1920, 1080).with_fps(30));

        let r: Resolution = "1280x720- 60 ~ 3000kbps".parse().unwrap();
        assert_eq!(r.fps(), Some(60));
        assert_eq!(r.bitrate(), Some(3000));
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("30fps"), Some(30));
        assert_eq!(leading_int("  -4"), Some(-4));
        assert_eq!(leading_int("+7x"), Some(7));
        assert_eq!(leading_int("fps30"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn test_serde_uses_the_wire_form() {
        let list = ResolutionList::new(true, vec![Resolution::new(1280, 720).with_fps(30)]);

        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, "\"ORIGINAL,1280x720-30\"");

        // A bypass of the constructors through serde still normalises.
        let decoded: ResolutionList = serde_json::from_str("\"1280x720-0\"").unwrap();
        assert_eq!(decoded.resolutions(), &[Resolution::new(1280, 720)]);
        assert!(serde_json::from_str::<Resolution>("\"0x720\"").is_err());
    }

    #[test]
    fn test_parse_errors_are_classified() {
        assert!(matches!("1280".parse::<Resolution>(), Err(ResolutionError::Format(_))));
        assert!(matches!("ax720".parse::<Resolution>(), Err(ResolutionError::Number(_))));
        assert!(matches!("0x720".parse::<Resolution>(), Err(ResolutionError::NonPositive(_))));
    }

    #[test]
    fn test_decode_only_separators_yields_original_only() {
        // Nothing parseable and no ORIGINAL token: normalised to original only.
        assert_eq!(ResolutionList::decode(",,"), ResolutionList::original_only());
    }
}
