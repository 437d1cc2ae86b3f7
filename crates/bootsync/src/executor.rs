use anyhow::Result;
use edera_bootsync_config::Resolution;

/// local: Executor that writes files and runs commands on this machine.
pub mod local;

/// The external collaborator that persists state and regenerates the boot configuration.
///
/// Every call is a single-shot request. The result is only used to decide whether the
/// request has to be retried or reported.
pub trait Executor: Send + Sync {
    /// Replaces the settings file with `content`.
    fn write_settings(&self, content: &str) -> Result<()>;

    /// Replaces the cache record with `content`.
    fn write_cache(&self, content: &str) -> Result<()>;

    /// Regenerates the boot menu from the currently persisted settings.
    fn generate_boot_config(&self) -> Result<()>;

    /// Renders the boot theme background for a display of `resolution`.
    fn generate_theme_background(&self, resolution: Resolution) -> Result<()>;
}
