//! Store for the `GRUB_KEY=VALUE` settings file that controls boot menu generation.

use edera_bootsync_menu::Menu;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt::Write;

/// quoting: Shell-compatible quoting of setting values.
pub mod quoting;

/// The prefix every recognized settings line starts with.
pub const KEY_PREFIX: &str = "GRUB_";

/// The setting that selects the default boot entry.
pub const KEY_DEFAULT: &str = "GRUB_DEFAULT";

/// The setting that controls the boot menu timeout.
pub const KEY_TIMEOUT: &str = "GRUB_TIMEOUT";

/// Legacy hidden timeout setting, which conflicts with [KEY_TIMEOUT].
pub const KEY_HIDDEN_TIMEOUT: &str = "GRUB_HIDDEN_TIMEOUT";

/// Legacy hidden timeout setting, which conflicts with [KEY_TIMEOUT].
pub const KEY_HIDDEN_TIMEOUT_QUIET: &str = "GRUB_HIDDEN_TIMEOUT_QUIET";

/// The setting that selects the graphics mode of the boot menu.
pub const KEY_GFXMODE: &str = "GRUB_GFXMODE";

/// The setting that selects the boot menu theme.
pub const KEY_THEME: &str = "GRUB_THEME";

/// The timeout value that represents a disabled timeout.
pub const TIMEOUT_DISABLED: i32 = -2;

/// The graphics mode used when none is configured.
pub const GFXMODE_AUTO: &str = "auto";

/// A single setting as read from the settings file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Setting {
    /// The unquoted value.
    value: String,
    /// The right-hand side exactly as read, kept until the value is changed.
    raw: Option<String>,
}

/// A mapping of setting keys to their unquoted values.
///
/// Keys with an empty value are treated as absent when reading and are not written out.
/// Settings that were never changed are written back exactly as they were read, so shell
/// expansions in values bootsync does not manage keep working.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, Setting>,
}

impl Settings {
    /// Parses the settings file `input` without applying any normalization.
    /// Lines that do not start with [KEY_PREFIX] are dropped.
    pub fn parse(input: &str) -> Self {
        let mut values = BTreeMap::new();

        for line in input.lines() {
            let line = line.trim();

            // Comments and shell statements are not settings.
            if !line.starts_with(KEY_PREFIX) {
                continue;
            }

            // Settings are assignments, anything else is ignored.
            let Some((key, raw)) = line.split_once('=') else {
                debug!("ignoring settings line without assignment: {}", line);
                continue;
            };

            debug!("found setting: {}={}", key, raw);
            values.insert(
                key.to_string(),
                Setting {
                    value: quoting::unquote(raw),
                    raw: Some(raw.to_string()),
                },
            );
        }

        Self { values }
    }

    /// Fetches the unquoted value of `key`. Absent keys read as an empty string.
    pub fn get(&self, key: &str) -> &str {
        self.values
            .get(key)
            .map(|setting| setting.value.as_str())
            .unwrap_or("")
    }

    /// Sets the value of `key`. An empty `value` removes the key from the output.
    /// Setting the value a key already has keeps its original text.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if self.values.get(key).is_some_and(|setting| setting.value == value) {
            return;
        }
        self.values
            .insert(key.to_string(), Setting { value, raw: None });
    }

    /// All settings with their unquoted values, including keys whose value is empty.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, setting)| (key.as_str(), setting.value.as_str()))
    }

    /// Serializes the settings to file text, one `KEY=VALUE` line per non-empty value.
    /// Unchanged settings keep the text they were read with, changed ones are double-quoted.
    pub fn serialize(&self) -> String {
        let mut output = String::new();
        for (key, setting) in &self.values {
            if setting.value.is_empty() {
                continue;
            }
            // Writing to a String cannot fail.
            let _ = match &setting.raw {
                Some(raw) => writeln!(output, "{}={}", key, raw),
                None => writeln!(output, "{}={}", key, quoting::quote(&setting.value)),
            };
        }
        output
    }

    /// Resolves the title of the default entry from the default setting and the `menu`.
    ///
    /// Only top-level entries can be addressed. A title that names an entry inside a
    /// submenu resolves to the first top-level entry, as does anything unrecognized.
    pub fn default_entry(&self, menu: &Menu) -> String {
        let simple_titles = menu.simple_entry_titles();
        let first = simple_titles.first().cloned().unwrap_or_default();
        let value = self.get(KEY_DEFAULT);

        // An unset default means the first entry.
        if value.is_empty() {
            return first;
        }

        // The default already names a top-level entry.
        if simple_titles.iter().any(|title| title == value) {
            return value.to_string();
        }

        // Entries inside submenus are not addressable by title.
        if menu.entry_titles().iter().any(|title| title == value) {
            return first;
        }

        // The default may be a position among the top-level entries.
        match value.parse::<i64>() {
            Ok(index) => usize::try_from(index)
                .ok()
                .and_then(|index| simple_titles.get(index).cloned())
                .unwrap_or(first),
            Err(_) => {
                warn!("invalid number, {}={}", KEY_DEFAULT, value);
                first
            }
        }
    }

    /// Resolves the timeout in seconds, or [TIMEOUT_DISABLED] if unset or invalid.
    pub fn timeout(&self) -> i32 {
        let value = self.get(KEY_TIMEOUT);
        if value.is_empty() {
            return TIMEOUT_DISABLED;
        }

        match value.parse::<i32>() {
            Ok(timeout) => timeout,
            Err(_) => {
                warn!("invalid timeout, {}={}", KEY_TIMEOUT, value);
                TIMEOUT_DISABLED
            }
        }
    }

    /// Fetches the graphics mode, or [GFXMODE_AUTO] if unset.
    pub fn gfxmode(&self) -> String {
        let value = self.get(KEY_GFXMODE);
        if value.is_empty() {
            GFXMODE_AUTO.to_string()
        } else {
            value.to_string()
        }
    }

    /// Fetches the theme file, if any.
    pub fn theme(&self) -> Option<&str> {
        Some(self.get(KEY_THEME)).filter(|theme| !theme.is_empty())
    }

    /// Sets the default entry to `title`.
    pub fn set_default_entry(&mut self, title: &str) {
        self.set(KEY_DEFAULT, title);
    }

    /// Sets the timeout. [TIMEOUT_DISABLED] clears the setting.
    pub fn set_timeout(&mut self, timeout: i32) {
        if timeout == TIMEOUT_DISABLED {
            self.set(KEY_TIMEOUT, "");
        } else {
            self.set(KEY_TIMEOUT, timeout.to_string());
        }
    }

    /// Sets the graphics mode.
    pub fn set_gfxmode(&mut self, gfxmode: &str) {
        self.set(KEY_GFXMODE, gfxmode);
    }

    /// Sets the theme file.
    pub fn set_theme(&mut self, theme: &str) {
        self.set(KEY_THEME, theme);
    }

    /// Rewrites the default entry and timeout settings with their resolved values and clears
    /// the hidden timeout settings, which are superseded by [KEY_TIMEOUT].
    ///
    /// Returns true if the hidden timeout settings had to be cleared. The settings file and the
    /// generated boot menu then no longer agree and the menu must be regenerated.
    pub fn normalize(&mut self, menu: &Menu) -> bool {
        let default_entry = self.default_entry(menu);
        let timeout = self.timeout();
        self.set_default_entry(&default_entry);
        self.set_timeout(timeout);

        if self.get(KEY_HIDDEN_TIMEOUT).is_empty() && self.get(KEY_HIDDEN_TIMEOUT_QUIET).is_empty()
        {
            return false;
        }

        self.set(KEY_HIDDEN_TIMEOUT, "");
        self.set(KEY_HIDDEN_TIMEOUT_QUIET, "");
        true
    }
}
