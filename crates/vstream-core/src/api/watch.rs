//! Status, VOD, and account endpoints (`/api/watch`, `/api/admin`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{api_url, RequestParams};
use crate::domain::previews::PreviewsConfig;
use crate::domain::resolutions::ResolutionList;
use crate::protocol::endpoint::encode_component;

/// One transcoded rendition of a live stream or VOD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStream {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub index_file: String,
}

/// Public state of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatus {
    pub id: String,
    pub record: bool,
    pub resolutions: String,
    pub previews: String,
    pub live: bool,
    pub stream_id: String,
    pub live_start_timestamp: i64,
    #[serde(default)]
    pub live_sub_streams: Vec<SubStream>,
}

impl ChannelStatus {
    pub fn resolution_list(&self) -> ResolutionList {
        ResolutionList::decode(&self.resolutions)
    }

    pub fn previews_config(&self) -> PreviewsConfig {
        PreviewsConfig::decode(&self.previews)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodItem {
    pub stream_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VodItemList {
    #[serde(default)]
    pub vod_list: Vec<VodItem>,
}

/// Playback details of one recorded stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VodStreaming {
    pub stream_id: String,
    pub timestamp: i64,
    #[serde(default)]
    pub sub_streams: Vec<SubStream>,
    pub has_previews: bool,
    pub previews_index: String,
}

/// Builds watch and account requests against one API base URL.
#[derive(Debug, Clone)]
pub struct WatchApi {
    base: String,
}

impl WatchApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn channel_status(&self, channel: &str) -> RequestParams {
        RequestParams::get(api_url(
            &self.base,
            &format!("/api/watch/{}", encode_component(channel)),
        ))
    }

    pub fn channel_vod_list(&self, channel: &str) -> RequestParams {
        RequestParams::get(api_url(
            &self.base,
            &format!("/api/watch/{}/vod", encode_component(channel)),
        ))
    }

    pub fn channel_vod(&self, channel: &str, stream_id: &str) -> RequestParams {
        RequestParams::get(api_url(
            &self.base,
            &format!(
                "/api/watch/{}/vod/{}",
                encode_component(channel),
                encode_component(stream_id)
            ),
        ))
    }

    pub fn create_account(&self, username: &str, password: &str, write: bool) -> RequestParams {
        RequestParams::post(
            api_url(&self.base, "/api/admin/accounts"),
            json!({ "username": username, "password": password, "write": write }),
        )
    }

    pub fn delete_account(&self, username: &str) -> RequestParams {
        RequestParams::post(
            api_url(&self.base, "/api/admin/accounts/delete"),
            json!({ "username": username }),
        )
    }
}

/// Extracts the fragment number from an HLS file URL.
///
/// `.../hls/720p/index-12.m3u8` yields `12`.  A file name without a
/// `-NUMBER` part yields `0`.
pub fn vod_fragment_index(url: &str) -> u64 {
    let file_name = url.rsplit('/').next().unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    let Some(suffix) = stem.split('-').nth(1) else {
        return 0;
    };
    let digits: String = suffix.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;

    #[test]
    fn test_watch_urls() {
        let api = WatchApi::new("http://h:80");
        assert_eq!(api.channel_status("a b").url, "http://h:80/api/watch/a%20b");
        assert_eq!(api.channel_vod_list("c").url, "http://h:80/api/watch/c/vod");
        assert_eq!(api.channel_vod("c", "x#1").url, "http://h:80/api/watch/c/vod/x%231");
        assert_eq!(api.channel_vod("c", "1").method, Method::Get);
    }

    #[test]
    fn test_account_requests_carry_json() {
        let api = WatchApi::new("http://h");
        let req = api.create_account("alice", "pw", true);
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.url, "http://h/api/admin/accounts");
        assert_eq!(
            req.json,
            Some(json!({ "username": "alice", "password": "pw", "write": true }))
        );
        assert_eq!(
            api.delete_account("alice").json,
            Some(json!({ "username": "alice" }))
        );
    }

    #[test]
    fn test_channel_status_deserialises_camel_case() {
        // Arrange
        let raw = r#"{
            "id": "news", "record": true, "resolutions": "ORIGINAL,640x360",
            "previews": "256x144,5", "live": true, "streamId": "s1",
            "liveStartTimestamp": 1700000000000,
            "liveSubStreams": [{"width":640,"height":360,"fps":30,"indexFile":"a.m3u8"}]
        }"#;

        // Act
        let status: ChannelStatus = serde_json::from_str(raw).unwrap();

        // Assert
        assert!(status.live);
        assert_eq!(status.live_sub_streams[0].index_file, "a.m3u8");
        assert!(status.resolution_list().has_original());
        assert_eq!(status.previews_config(), PreviewsConfig::enabled(256, 144, 5));
    }

    #[test]
    fn test_vod_list_tolerates_missing_field() {
        let list: VodItemList = serde_json::from_str("{}").unwrap();
        assert!(list.vod_list.is_empty());
    }

    #[test]
    fn test_vod_fragment_index() {
        assert_eq!(vod_fragment_index("https://h/vod/720p/index-12.m3u8"), 12);
        assert_eq!(vod_fragment_index("fragment-7.ts"), 7);
        assert_eq!(vod_fragment_index("https://h/vod/index.m3u8"), 0);
        assert_eq!(vod_fragment_index("index-abc.m3u8"), 0);
        assert_eq!(vod_fragment_index(""), 0);
    }
}
