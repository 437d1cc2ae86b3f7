//! bootsync keeps the GRUB settings file, the generated boot menu and the display
//! resolution in agreement, regenerating the boot configuration in the background.

/// config: bootsync configuration mechanism.
pub mod config;

/// error: Errors reported by the synchronizer.
pub mod error;

/// executor: The collaborator that persists state and regenerates the boot configuration.
pub mod executor;

/// logger: Logging to standard error.
pub mod logger;

/// options: Parse the options of the bootsync executable.
pub mod options;

/// probe: Detection of the primary display resolution.
pub mod probe;

/// scheduler: Debounced regeneration of the boot configuration on a background worker.
pub mod scheduler;

/// service: The property and method surface exposed to remote callers.
pub mod service;

/// synchronizer: Loads and reconciles the boot menu, settings and cache record.
pub mod synchronizer;

pub use error::SyncError;
pub use service::{BootService, Property, PropertyNotifier};
pub use synchronizer::{Sources, Synchronizer};
