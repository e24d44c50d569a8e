use crate::error::{PipError, Result};
use crate::icons::IconPalette;
use serde::{Deserialize, Serialize};
use shared::PageMatcher;

pub const PIP_BUTTON_SELECTOR: &str = "#movie_player > div.ytp-chrome-bottom > div.ytp-chrome-controls > div.ytp-right-controls > button.ytp-pip-button.ytp-button";
pub const PLAYER_SELECTOR: &str = "#movie_player";
pub const MEDIA_SELECTOR: &str = "video";

pub const DEFAULT_LOCATE_TIMEOUT_MS: u32 = 10_000;
pub const NAVIGATION_POLL_INTERVAL_MS: u32 = 1_000;
pub const HISTORY_RECHECK_DELAY_MS: u32 = 100;
pub const INIT_DEBOUNCE_MS: u32 = 1_000;
pub const PAGE_CHECK_DEBOUNCE_MS: u32 = 500;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Selectors {
    /// The host control the content script takes over
    pub button: String,
    pub player: String,
    pub media: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            button: PIP_BUTTON_SELECTOR.to_string(),
            player: PLAYER_SELECTOR.to_string(),
            media: MEDIA_SELECTOR.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Timing {
    pub locate_timeout_ms: u32,
    pub poll_interval_ms: u32,
    pub history_recheck_ms: u32,
    pub init_debounce_ms: u32,
    pub page_check_debounce_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            locate_timeout_ms: DEFAULT_LOCATE_TIMEOUT_MS,
            poll_interval_ms: NAVIGATION_POLL_INTERVAL_MS,
            history_recheck_ms: HISTORY_RECHECK_DELAY_MS,
            init_debounce_ms: INIT_DEBOUNCE_MS,
            page_check_debounce_ms: PAGE_CHECK_DEBOUNCE_MS,
        }
    }
}

/// Static configuration of the content script.
///
/// Every field has a default, so an override only needs the keys it changes:
///
/// ```
/// let config = pip_frontend::config::ContentConfig::from_json(
///     r#"{ "timing": { "locateTimeoutMs": 5000 } }"#,
/// ).unwrap();
/// assert_eq!(config.timing.locate_timeout_ms, 5000);
/// assert_eq!(config.timing.init_debounce_ms, 1000);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentConfig {
    pub selectors: Selectors,
    pub timing: Timing,
    pub palette: IconPalette,
    pub page: PageMatcher,
}

impl ContentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|error| PipError::Config(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let timing = &self.timing;
        if timing.poll_interval_ms == 0 {
            return Err(PipError::Config("pollIntervalMs must be greater than zero".to_string()));
        }
        if timing.locate_timeout_ms == 0 {
            return Err(PipError::Config("locateTimeoutMs must be greater than zero".to_string()));
        }
        for (name, selector) in [
            ("button", &self.selectors.button),
            ("player", &self.selectors.player),
            ("media", &self.selectors.media),
        ] {
            if selector.trim().is_empty() {
                return Err(PipError::Config(format!("{name} selector is empty")));
            }
        }
        Ok(())
    }
}
