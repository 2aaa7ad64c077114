//! User-facing text, per language.

use tunepick_core::config::PickerConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedStrings {
    /// Shown at the top of the picker.
    pub prompt: String,
    /// Message of the `no_permission` error.
    pub access_denied: String,
    /// Message of the `no_ui_host` error.
    pub no_ui_host: String,
}

impl LocalizedStrings {
    /// Strings for a locale such as `vi`, `vi_VN.UTF-8` or `en-US`.
    /// Unknown languages get English.
    pub fn for_locale(locale: &str) -> Self {
        match language_code(locale).as_str() {
            "vi" => Self {
                prompt: "Chọn nhạc từ Apple Music".into(),
                access_denied: "Không có quyền truy cập Apple Music".into(),
                no_ui_host: "Không có giao diện để hiển thị trình chọn nhạc".into(),
            },
            _ => Self::english(),
        }
    }

    pub fn english() -> Self {
        Self {
            prompt: "Choose music from Apple Music".into(),
            access_denied: "Apple Music access denied".into(),
            no_ui_host: "No UI is available to present the music picker".into(),
        }
    }

    /// Localized strings with the config's explicit overrides applied.
    pub fn from_config(config: &PickerConfig) -> Self {
        let mut strings = config
            .locale
            .as_deref()
            .map(Self::for_locale)
            .unwrap_or_else(Self::english);
        if let Some(prompt) = &config.prompt {
            strings.prompt = prompt.clone();
        }
        if let Some(message) = &config.denied_message {
            strings.access_denied = message.clone();
        }
        strings
    }
}

impl Default for LocalizedStrings {
    fn default() -> Self {
        Self::english()
    }
}

fn language_code(locale: &str) -> String {
    locale
        .split(['_', '-', '.', '@'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}
