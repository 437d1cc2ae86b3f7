use crate::probe::ResolutionProbe;
use edera_bootsync_config::Resolution;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// The directory the kernel exposes DRM connectors in.
const DRM_CLASS_PATH: &str = "/sys/class/drm";

/// Detects the resolution of the primary display from the DRM connectors in sysfs.
///
/// The primary display is the first connected connector, ordered by name, that reports
/// at least one mode. The first mode of a connector is its preferred mode.
#[derive(Debug, Clone)]
pub struct DrmProbe {
    /// The sysfs directory holding the connectors.
    root: PathBuf,
    /// The resolution reported when no display is detected.
    fallback: Resolution,
}

impl DrmProbe {
    /// Creates a probe reading the system DRM class directory.
    pub fn new(fallback: Resolution) -> Self {
        Self::with_root(DRM_CLASS_PATH, fallback)
    }

    /// Creates a probe reading connectors from `root`.
    pub fn with_root(root: impl Into<PathBuf>, fallback: Resolution) -> Self {
        Self {
            root: root.into(),
            fallback,
        }
    }

    /// Reads the preferred resolution of the connector at `connector`, if it is connected.
    fn connector_resolution(connector: &Path) -> Option<Resolution> {
        let status = fs::read_to_string(connector.join("status")).ok()?;
        if status.trim() != "connected" {
            return None;
        }

        let modes = fs::read_to_string(connector.join("modes")).ok()?;
        let mode = modes.lines().map(str::trim).find(|line| !line.is_empty())?;

        // Interlaced modes carry a trailing marker, such as 1920x1080i.
        let mode = mode.trim_end_matches(|c: char| !c.is_ascii_digit());
        match mode.parse::<Resolution>() {
            Ok(resolution) => Some(resolution),
            Err(error) => {
                warn!("ignoring mode of {}: {:#}", connector.display(), error);
                None
            }
        }
    }

    /// Detects the resolution of the primary display, if any.
    fn detect(&self) -> Option<Resolution> {
        let mut connectors = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        connectors.sort();

        connectors.iter().find_map(|connector| {
            let resolution = Self::connector_resolution(connector)?;
            debug!("display {} has resolution {}", connector.display(), resolution);
            Some(resolution)
        })
    }
}

impl ResolutionProbe for DrmProbe {
    fn best_resolution(&self) -> Resolution {
        self.detect().unwrap_or_else(|| {
            debug!("no connected display detected, assuming {}", self.fallback);
            self.fallback
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(root: &Path, name: &str, status: &str, modes: &str) {
        let path = root.join(name);
        fs::create_dir_all(&path).expect("connector directory should be created");
        fs::write(path.join("status"), status).expect("status should be written");
        fs::write(path.join("modes"), modes).expect("modes should be written");
    }

    #[test]
    fn picks_first_connected_connector() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        connector(directory.path(), "card0-DP-1", "disconnected\n", "");
        connector(directory.path(), "card0-HDMI-A-1", "connected\n", "2560x1440\n1920x1080\n");
        connector(directory.path(), "card0-eDP-1", "connected\n", "1920x1200\n");

        let probe = DrmProbe::with_root(directory.path(), Resolution::DEFAULT);
        assert_eq!(probe.best_resolution(), Resolution::new(2560, 1440));
    }

    #[test]
    fn skips_connected_connector_without_modes() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        connector(directory.path(), "card0-DP-1", "connected\n", "\n");
        connector(directory.path(), "card0-DP-2", "connected\n", "1280x1024i\n");

        let probe = DrmProbe::with_root(directory.path(), Resolution::DEFAULT);
        assert_eq!(probe.best_resolution(), Resolution::new(1280, 1024));
    }

    #[test]
    fn falls_back_without_displays() {
        let directory = tempfile::tempdir().expect("tempdir should be created");
        let probe = DrmProbe::with_root(directory.path().join("missing"), Resolution::new(800, 600));
        assert_eq!(probe.best_resolution(), Resolution::new(800, 600));
    }
}
