//! Request builders for the REST side of a VStream server.
//!
//! The builders only *describe* requests: each returns a [`RequestParams`]
//! with the method, the absolute URL, and an optional JSON body.  Sending
//! them is left to whatever HTTP client the caller already uses, so this
//! crate stays free of networking dependencies.
//!
//! Path components taken from user input (channel ids, stream ids) are
//! percent-encoded with the same rules as the streaming endpoint URLs.
//!
//! - [`control`] – channel administration (create, update, rotate key,
//!   close the live stream, delete VODs and channels, check a key).
//! - [`watch`] – channel status, VOD listing, and account administration.

pub mod control;
pub mod watch;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use control::{
    ChannelChangedResponse, ControlApi, CreateChannelBody, PublishingDetails, UpdateChannelBody,
};
pub use watch::{vod_fragment_index, ChannelStatus, SubStream, VodItem, VodItemList, VodStreaming, WatchApi};

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A fully described API request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParams {
    pub method: Method,
    pub url: String,
    pub json: Option<serde_json::Value>,
}

impl RequestParams {
    pub(crate) fn get(url: String) -> Self {
        Self {
            method: Method::Get,
            url,
            json: None,
        }
    }

    pub(crate) fn post(url: String, json: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url,
            json: Some(json),
        }
    }
}

/// Joins an API base URL (e.g. `https://host:8080`) and an absolute path.
pub(crate) fn api_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
