use crate::Resolution;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The persisted state of bootsync.
///
/// `needs_update` is set while a regeneration of the boot menu has been requested
/// but not yet confirmed complete. Finding it set at startup means the previous run
/// stopped mid-regeneration.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CacheConfig {
    /// The width of the display when the boot menu was last configured.
    pub last_screen_width: u16,
    /// The height of the display when the boot menu was last configured.
    pub last_screen_height: u16,
    /// Whether the boot menu must be regenerated.
    pub needs_update: bool,
}

impl Default for CacheConfig {
    /// The record used when no cache exists yet. Regeneration is requested
    /// so that a first run always produces a boot menu from current settings.
    fn default() -> Self {
        Self {
            last_screen_width: Resolution::DEFAULT.width,
            last_screen_height: Resolution::DEFAULT.height,
            needs_update: true,
        }
    }
}

impl CacheConfig {
    /// Parses a cache record from its TOML representation.
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).context("unable to parse cache record")
    }

    /// Serializes the cache record to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("unable to serialize cache record")
    }

    /// The resolution of the display when the boot menu was last configured.
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.last_screen_width, self.last_screen_height)
    }

    /// Records `resolution` as the last known display resolution.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.last_screen_width = resolution.width;
        self.last_screen_height = resolution.height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_update() {
        let cache = CacheConfig::default();
        assert_eq!(cache.resolution(), Resolution::new(1024, 768));
        assert!(cache.needs_update);
    }

    #[test]
    fn toml_round_trip_is_exact() {
        let cache = CacheConfig {
            last_screen_width: u16::MAX,
            last_screen_height: 1080,
            needs_update: false,
        };
        let text = cache.to_toml().expect("cache should serialize");
        assert_eq!(CacheConfig::from_toml(&text).ok(), Some(cache));
    }

    #[test]
    fn reads_kebab_case_fields() {
        let cache = CacheConfig::from_toml(
            "last-screen-width = 1920\nlast-screen-height = 1200\nneeds-update = true\n",
        )
        .expect("cache should parse");
        assert_eq!(cache.resolution(), Resolution::new(1920, 1200));
        assert!(cache.needs_update);
    }

    #[test]
    fn rejects_out_of_range_width() {
        assert!(
            CacheConfig::from_toml(
                "last-screen-width = 70000\nlast-screen-height = 1200\nneeds-update = true\n"
            )
            .is_err()
        );
    }
}
