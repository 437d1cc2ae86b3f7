use edera_bootsync_config::{DisplayConfiguration, Resolution};

/// drm: Detection of the display resolution through the kernel DRM subsystem.
pub mod drm;

/// Provides the best known resolution of the primary display.
pub trait ResolutionProbe {
    /// Fetches the best resolution of the primary display. This must always
    /// produce a value, falling back to a default if nothing can be detected.
    fn best_resolution(&self) -> Resolution;
}

/// A probe that always reports the same resolution.
#[derive(Debug, Clone, Copy)]
pub struct FixedProbe(pub Resolution);

impl ResolutionProbe for FixedProbe {
    fn best_resolution(&self) -> Resolution {
        self.0
    }
}

/// Creates the probe described by the display `config`. A configured resolution
/// replaces detection entirely.
pub fn from_config(config: &DisplayConfiguration) -> Box<dyn ResolutionProbe> {
    match config.resolution {
        Some(resolution) => Box::new(FixedProbe(resolution)),
        None => Box::new(drm::DrmProbe::new(config.fallback)),
    }
}
