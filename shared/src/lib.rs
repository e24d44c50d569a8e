use serde::{Serialize, Deserialize};

// ===== MESSAGE TYPES =====

/// Messages delivered to the content script by the popup or the background worker.
///
/// The wire form is `{ "type": "SETTINGS_CHANGED", ... }`, so an unknown
/// `type` fails to decode instead of falling through a string match.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMsg {
    SettingsChanged { settings: Settings },
    Reinitialize,
    GetStatus,
    TogglePip,
    StartPipManager,
    StopPipManager,
    PageReady { url: String },
}

/// Messages sent by the content script to the background worker.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentMsg {
    ShowNotification { title: String, message: String },
}

/// Deferred replies to a [`ControlMsg`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ControlReply {
    Status(PipStatus),
}

// ===== SETTINGS =====

/// Storage key the settings record lives under.
pub const SETTINGS_STORAGE_KEY: &str = "pipSettings";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub enabled: bool,
    pub auto_start: bool,
    pub show_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start: false,
            show_notifications: true,
        }
    }
}

// ===== STATUS =====

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipStatus {
    pub is_initialized: bool,
    pub is_pip_active: bool,
    pub settings: Settings,
    pub is_video_page: bool,
}

// ===== PAGE ADDRESS =====

/// Snapshot of the page location, split the way `window.location` splits it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAddress {
    pub href: String,
    pub host: String,
    pub path: String,
    /// Query string including the leading `?`, or empty.
    pub search: String,
}

impl PageAddress {
    pub fn has_query_param(&self, name: &str) -> bool {
        self.search
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .any(|pair| pair.split('=').next() == Some(name))
    }
}

// ===== ELIGIBILITY =====

pub const VIDEO_PAGE_HOST: &str = "www.youtube.com";
pub const VIDEO_PAGE_PATH: &str = "/watch";
pub const VIDEO_PAGE_PARAM: &str = "v";

/// Pure eligibility predicate over a page address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PageMatcher {
    pub host: String,
    pub path: String,
    pub required_param: String,
}

impl Default for PageMatcher {
    fn default() -> Self {
        Self {
            host: VIDEO_PAGE_HOST.to_string(),
            path: VIDEO_PAGE_PATH.to_string(),
            required_param: VIDEO_PAGE_PARAM.to_string(),
        }
    }
}

impl PageMatcher {
    pub fn matches(&self, address: &PageAddress) -> bool {
        address.host == self.host
            && address.path == self.path
            && address.has_query_param(&self.required_param)
    }
}
