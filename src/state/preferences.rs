//! Display preferences stored next to the timer

use serde::{Deserialize, Serialize};

pub const MIN_FONT_SIZE_PERCENT: u32 = 20;
pub const MAX_FONT_SIZE_PERCENT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

/// Theme and font choices. The timer never reads these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub theme: Theme,
    pub font_index: u32,
    pub font_size_percent: u32,
}

impl Preferences {
    /// Bring the font size back into the supported range
    pub fn clamped(mut self) -> Self {
        self.font_size_percent = self
            .font_size_percent
            .clamp(MIN_FONT_SIZE_PERCENT, MAX_FONT_SIZE_PERCENT);
        self
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_index: 0,
            font_size_percent: 50,
        }
    }
}

/// Partial update sent by a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub theme: Option<Theme>,
    pub font_index: Option<u32>,
    pub font_size_percent: Option<u32>,
}

impl PreferencesUpdate {
    pub fn apply(self, current: Preferences) -> Preferences {
        Preferences {
            theme: self.theme.unwrap_or(current.theme),
            font_index: self.font_index.unwrap_or(current.font_index),
            font_size_percent: self.font_size_percent.unwrap_or(current.font_size_percent),
        }
        .clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_keeps_other_fields() {
        let update = PreferencesUpdate {
            theme: Some(Theme::Light),
            ..Default::default()
        };
        let updated = update.apply(Preferences::default());
        assert_eq!(updated.theme, Theme::Light);
        assert_eq!(updated.font_index, 0);
        assert_eq!(updated.font_size_percent, 50);
    }

    #[test]
    fn font_size_is_clamped() {
        let update = PreferencesUpdate {
            font_size_percent: Some(250),
            ..Default::default()
        };
        assert_eq!(update.apply(Preferences::default()).font_size_percent, 100);
    }

    #[test]
    fn theme_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        let theme: Theme = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(theme, Theme::Light);
    }
}
