//! Inline SVG for the picture-in-picture control

use serde::{Deserialize, Serialize};

pub const ENTER_PATH: &str = "M21 3a1 1 0 0 1 1 1v7h-2V5H4v14h6v2H3a1 1 0 0 1-1-1V4a1 1 0 0 1 1-1h18zm0 10a1 1 0 0 1 1 1v6a1 1 0 0 1-1 1h-8a1 1 0 0 1-1-1v-6a1 1 0 0 1 1-1h8zm-1 2h-6v4h6v-4zM6.707 6.293l2.25 2.25L11 6.5V12H5.5l2.043-2.043-2.25-2.25 1.414-1.414z";
pub const EXIT_PATH: &str = "M21 3a1 1 0 0 1 1 1v7h-2V5H4v14h6v2H3a1 1 0 0 1-1-1V4a1 1 0 0 1 1-1h18zm0 10a1 1 0 0 1 1 1v6a1 1 0 0 1-1 1h-8a1 1 0 0 1-1-1v-6a1 1 0 0 1 1-1h8zm-1 2h-6v4h6v-4zm-8.5-8L9.457 9.043l2.25 2.25-1.414 1.414-2.25-2.25L6 12.5V7h5.5z";

pub const ACTIVE_TINT: &str = "#ff0000";
pub const INACTIVE_TINT: &str = "#fff";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconVariant {
    /// Shown while the video plays inline
    Enter,
    /// Shown while the video is in picture-in-picture
    Exit,
}

impl IconVariant {
    pub fn for_mode(is_active: bool) -> Self {
        if is_active { Self::Exit } else { Self::Enter }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Enter => ENTER_PATH,
            Self::Exit => EXIT_PATH,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IconPalette {
    pub active: String,
    pub inactive: String,
}

impl Default for IconPalette {
    fn default() -> Self {
        Self {
            active: ACTIVE_TINT.to_string(),
            inactive: INACTIVE_TINT.to_string(),
        }
    }
}

impl IconPalette {
    pub fn tint(&self, is_active: bool) -> &str {
        if is_active { &self.active } else { &self.inactive }
    }
}

/// Markup for the control in the given mode.
pub fn render_icon(is_active: bool, palette: &IconPalette) -> String {
    let path = IconVariant::for_mode(is_active).path();
    let fill = palette.tint(is_active);

    format!(
        r#"<svg width="100%" height="100%" fill="{fill}" viewBox="0 0 24 24" xmlns="http://www.w3.org/2000/svg" transform="matrix(1, 0, 0, -1, 0, 0)" style="transform: scale(0.62, -0.62); transition: all 0.7s"><g><path fill="none" d="M0 0h24v24H0z"></path><path fill-rule="nonzero" d="{path}"></path></g></svg>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_icon_uses_enter_path_and_inactive_tint() {
        let svg = render_icon(false, &IconPalette::default());
        assert!(svg.contains(ENTER_PATH));
        assert!(!svg.contains(EXIT_PATH));
        assert!(svg.contains(r##"fill="#fff""##));
    }

    #[test]
    fn test_active_icon_uses_exit_path_and_active_tint() {
        let svg = render_icon(true, &IconPalette::default());
        assert!(svg.contains(EXIT_PATH));
        assert!(svg.contains(r##"fill="#ff0000""##));
    }

    #[test]
    fn test_custom_palette() {
        let palette = IconPalette {
            active: "#00ff00".to_string(),
            inactive: "#333".to_string(),
        };
        assert!(render_icon(true, &palette).contains(r##"fill="#00ff00""##));
        assert!(render_icon(false, &palette).contains(r##"fill="#333""##));
    }
}
