//! Configuration of bootsync and the persisted cache record.

use serde::{Deserialize, Serialize};

/// cache: The persisted state that survives restarts of bootsync.
pub mod cache;

/// resolution: Display resolutions as stored in configuration and cache.
pub mod resolution;

pub use cache::CacheConfig;
pub use resolution::Resolution;

/// The root configuration of bootsync, loaded from `bootsync.toml`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RootConfiguration {
    /// The version of the configuration. This should always be declared
    /// and be the latest version that is supported.
    #[serde(default = "latest_version")]
    pub version: u32,
    /// Locations of the files bootsync reads and writes.
    #[serde(default)]
    pub paths: PathsConfiguration,
    /// Commands that regenerate the boot configuration.
    #[serde(default)]
    pub generate: GenerateConfiguration,
    /// The boot menu theme.
    #[serde(default)]
    pub theme: ThemeConfiguration,
    /// Display resolution detection.
    #[serde(default)]
    pub display: DisplayConfiguration,
}

impl Default for RootConfiguration {
    fn default() -> Self {
        Self {
            version: latest_version(),
            paths: PathsConfiguration::default(),
            generate: GenerateConfiguration::default(),
            theme: ThemeConfiguration::default(),
            display: DisplayConfiguration::default(),
        }
    }
}

/// Locations of the files bootsync reads and writes.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PathsConfiguration {
    /// The generated boot menu.
    #[serde(default = "default_menu_path")]
    pub menu: String,
    /// The settings file the boot menu is generated from.
    #[serde(default = "default_settings_path")]
    pub settings: String,
    /// The cache record.
    #[serde(default = "default_cache_path")]
    pub cache: String,
}

impl Default for PathsConfiguration {
    fn default() -> Self {
        Self {
            menu: default_menu_path(),
            settings: default_settings_path(),
            cache: default_cache_path(),
        }
    }
}

/// Commands that regenerate the boot configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct GenerateConfiguration {
    /// The command line that regenerates the boot menu from the settings file.
    #[serde(default = "default_generate_command")]
    pub command: String,
    /// The command line that renders the theme background.
    /// `$width` and `$height` are replaced with the display resolution.
    #[serde(default)]
    pub theme_background: Option<String>,
}

impl Default for GenerateConfiguration {
    fn default() -> Self {
        Self {
            command: default_generate_command(),
            theme_background: None,
        }
    }
}

/// The boot menu theme.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct ThemeConfiguration {
    /// The theme file to enable whenever the settings are written.
    #[serde(default)]
    pub main_file: Option<String>,
}

/// Display resolution detection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DisplayConfiguration {
    /// A fixed resolution that replaces detection entirely.
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// The resolution to assume when no display could be detected.
    #[serde(default = "default_fallback_resolution")]
    pub fallback: Resolution,
}

impl Default for DisplayConfiguration {
    fn default() -> Self {
        Self {
            resolution: None,
            fallback: default_fallback_resolution(),
        }
    }
}

/// The latest version of the configuration format.
pub fn latest_version() -> u32 {
    1
}

fn default_menu_path() -> String {
    "/boot/grub/grub.cfg".to_string()
}

fn default_settings_path() -> String {
    "/etc/default/grub".to_string()
}

fn default_cache_path() -> String {
    "/var/cache/bootsync/grub2.toml".to_string()
}

fn default_generate_command() -> String {
    "grub-mkconfig -o /boot/grub/grub.cfg".to_string()
}

fn default_fallback_resolution() -> Resolution {
    Resolution::DEFAULT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: RootConfiguration = toml::from_str("").expect("config should parse");
        assert_eq!(config.version, latest_version());
        assert_eq!(config.paths.menu, "/boot/grub/grub.cfg");
        assert_eq!(config.paths.settings, "/etc/default/grub");
        assert_eq!(config.generate.command, "grub-mkconfig -o /boot/grub/grub.cfg");
        assert!(config.generate.theme_background.is_none());
        assert!(config.theme.main_file.is_none());
        assert_eq!(config.display.fallback, Resolution::DEFAULT);
    }

    #[test]
    fn sections_override_defaults() {
        let config: RootConfiguration = toml::from_str(
            r#"
version = 1

[paths]
cache = "/tmp/grub2.toml"

[generate]
command = "update-grub"
theme-background = "grub-theme-bg --width $width --height $height"

[theme]
main-file = "/boot/grub/themes/deepin/theme.txt"

[display]
resolution = "1920x1080"
"#,
        )
        .expect("config should parse");
        assert_eq!(config.paths.cache, "/tmp/grub2.toml");
        assert_eq!(config.paths.menu, "/boot/grub/grub.cfg");
        assert_eq!(config.generate.command, "update-grub");
        assert_eq!(
            config.generate.theme_background.as_deref(),
            Some("grub-theme-bg --width $width --height $height")
        );
        assert_eq!(
            config.theme.main_file.as_deref(),
            Some("/boot/grub/themes/deepin/theme.txt")
        );
        assert_eq!(config.display.resolution, Some(Resolution::new(1920, 1080)));
    }

    #[test]
    fn invalid_resolution_is_rejected() {
        let result = toml::from_str::<RootConfiguration>("[display]\nresolution = \"wide\"\n");
        assert!(result.is_err());
    }
}
