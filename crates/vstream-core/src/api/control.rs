//! Channel administration endpoints (`/api/control`).

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{api_url, RequestParams};
use crate::domain::previews::PreviewsConfig;
use crate::domain::resolutions::ResolutionList;
use crate::protocol::endpoint::encode_component;

/// Where encoders should publish to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishingDetails {
    pub rtmp_base_url: String,
    pub wss_base_url: String,
}

/// Body of `POST /api/control/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChannelBody {
    pub id: String,
    pub record: bool,
    pub resolutions: String,
    pub previews: String,
}

impl CreateChannelBody {
    pub fn new(
        id: impl Into<String>,
        record: bool,
        resolutions: &ResolutionList,
        previews: &PreviewsConfig,
    ) -> Self {
        Self {
            id: id.into(),
            record,
            resolutions: resolutions.encode(),
            previews: previews.encode(),
        }
    }
}

/// Body of `POST /api/control/chan/{channel}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateChannelBody {
    pub key: String,
    pub record: bool,
    pub resolutions: String,
    pub previews: String,
}

/// Server reply to channel creation, update, and key rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelChangedResponse {
    pub id: String,
    pub key: String,
    pub record: bool,
    pub resolutions: String,
    pub previews: String,
}

/// Builds control requests against one API base URL.
#[derive(Debug, Clone)]
pub struct ControlApi {
    base: String,
}

impl ControlApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    fn channel_url(&self, channel: &str, suffix: &str) -> String {
        api_url(
            &self.base,
            &format!("/api/control/chan/{}{}", encode_component(channel), suffix),
        )
    }

    pub fn publishing_details(&self) -> RequestParams {
        RequestParams::get(api_url(&self.base, "/api/control"))
    }

    pub fn create_channel(&self, body: &CreateChannelBody) -> RequestParams {
        RequestParams::post(api_url(&self.base, "/api/control/create"), json!(body))
    }

    pub fn update_channel(&self, channel: &str, body: &UpdateChannelBody) -> RequestParams {
        RequestParams::post(self.channel_url(channel, ""), json!(body))
    }

    /// Rotates the channel key.  `key` is the current key.
    pub fn refresh_channel_key(&self, channel: &str, key: &str) -> RequestParams {
        RequestParams::post(self.channel_url(channel, "/key"), json!({ "key": key }))
    }

    /// Ends the live stream currently being published on the channel.
    pub fn close_channel_stream(&self, channel: &str, key: &str) -> RequestParams {
        RequestParams::post(self.channel_url(channel, "/close"), json!({ "key": key }))
    }

    pub fn delete_vod(&self, channel: &str, stream_id: &str, key: &str) -> RequestParams {
        let suffix = format!("/vod/{}/delete", encode_component(stream_id));
        RequestParams::post(self.channel_url(channel, &suffix), json!({ "key": key }))
    }

    pub fn delete_channel(&self, channel: &str, key: &str) -> RequestParams {
        RequestParams::post(self.channel_url(channel, "/delete"), json!({ "key": key }))
    }

    pub fn check_key(&self, channel: &str, key: &str) -> RequestParams {
        RequestParams::post(self.channel_url(channel, "/check"), json!({ "key": key }))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
