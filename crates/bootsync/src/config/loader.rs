use anyhow::{Context, Result, bail};
use edera_bootsync_config::{RootConfiguration, latest_version};
use log::info;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use toml::Value;

/// Parses the configuration `content` into a [RootConfiguration].
pub fn parse(content: &str) -> Result<RootConfiguration> {
    // Parse the raw configuration into a toml::Value which can represent any TOML file.
    let value: Value = toml::from_str(content).context("unable to parse bootsync config file")?;

    // Check the version of the configuration without parsing the full configuration.
    let version = value
        .get("version")
        .cloned()
        .unwrap_or_else(|| Value::Integer(latest_version() as i64));

    // Parse the version into an u32.
    let version: u32 = version
        .try_into()
        .context("unable to get configuration version")?;

    // Check if the version is supported.
    if version != latest_version() {
        bail!("unsupported configuration version: {}", version);
    }

    // If the version is supported, parse the full configuration.
    let config: RootConfiguration = value
        .try_into()
        .context("unable to parse bootsync.toml file")?;
    Ok(config)
}

/// Loads the [RootConfiguration] from `path`. A missing file yields the defaults.
pub fn load(path: &Path) -> Result<RootConfiguration> {
    info!("configuration file: {}", path.display());

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!("configuration file not found, using defaults");
            return Ok(RootConfiguration::default());
        }
        Err(error) => {
            return Err(error).context("unable to read bootsync config file");
        }
    };

    parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_version_means_latest() {
        let config = parse("[paths]\nmenu = \"/tmp/grub.cfg\"\n").expect("config should parse");
        assert_eq!(config.version, latest_version());
        assert_eq!(config.paths.menu, "/tmp/grub.cfg");
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let error = parse("version = 2\n").expect_err("version 2 is unsupported");
        assert!(error.to_string().contains("unsupported configuration version"));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        let config = load(&directory.path().join("bootsync.toml")).expect("defaults load");
        assert_eq!(config.paths.settings, "/etc/default/grub");
    }

    #[test]
    fn invalid_document_is_rejected() {
        assert!(parse("[paths\n").is_err());
    }
}
