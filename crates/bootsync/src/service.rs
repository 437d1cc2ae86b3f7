use crate::error::SyncError;
use crate::synchronizer::Synchronizer;
use anyhow::Result;
use log::info;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// A public property of the boot service, carrying its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// The title of the default boot entry.
    DefaultEntry(String),
    /// The boot menu timeout in seconds, -2 when disabled.
    Timeout(i32),
}

impl Property {
    /// The name the property is published under.
    pub fn name(&self) -> &'static str {
        match self {
            Property::DefaultEntry(_) => "DefaultEntry",
            Property::Timeout(_) => "Timeout",
        }
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::DefaultEntry(title) => write!(f, "{}={:?}", self.name(), title),
            Property::Timeout(timeout) => write!(f, "{}={}", self.name(), timeout),
        }
    }
}

/// Receives property change notifications, usually to forward them to remote callers.
pub trait PropertyNotifier: Send + Sync {
    /// Called after `property` changed to the value it carries.
    fn property_changed(&self, property: &Property);
}

/// A notifier that logs every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl PropertyNotifier for LogNotifier {
    fn property_changed(&self, property: &Property) {
        info!("property changed: {}", property);
    }
}

/// The surface exposed to remote callers: typed properties and methods over a [Synchronizer].
pub struct BootService {
    synchronizer: Synchronizer,
    notifier: Arc<dyn PropertyNotifier>,
}

impl BootService {
    /// Creates the service and publishes the initial value of every property.
    pub fn new(synchronizer: Synchronizer, notifier: Arc<dyn PropertyNotifier>) -> Self {
        let service = Self {
            synchronizer,
            notifier,
        };
        service.publish(Property::DefaultEntry(service.default_entry()));
        service.publish(Property::Timeout(service.timeout()));
        service
    }

    fn publish(&self, property: Property) {
        self.notifier.property_changed(&property);
    }

    /// The title of the default boot entry.
    pub fn default_entry(&self) -> String {
        self.synchronizer.default_entry()
    }

    /// Sets the default boot entry to the top-level entry `title`.
    pub fn set_default_entry(&self, title: &str) -> Result<(), SyncError> {
        if self.synchronizer.set_default_entry(title)? {
            self.publish(Property::DefaultEntry(self.default_entry()));
        }
        Ok(())
    }

    /// The boot menu timeout in seconds, -2 when disabled.
    pub fn timeout(&self) -> i32 {
        self.synchronizer.timeout()
    }

    /// Sets the boot menu timeout in seconds. -2 disables the timeout.
    pub fn set_timeout(&self, timeout: i32) -> Result<(), SyncError> {
        if self.synchronizer.set_timeout(timeout)? {
            self.publish(Property::Timeout(self.timeout()));
        }
        Ok(())
    }

    /// The graphics mode of the boot menu. It follows the display resolution and
    /// cannot be set directly.
    pub fn gfxmode(&self) -> String {
        self.synchronizer.gfxmode()
    }

    /// The full titles of all selectable entries, with submenu titles joined by `>`.
    pub fn entry_titles(&self) -> Result<Vec<String>, SyncError> {
        self.synchronizer.entry_titles()
    }

    /// The titles of the selectable entries outside of any submenu.
    pub fn simple_entry_titles(&self) -> Result<Vec<String>, SyncError> {
        self.synchronizer.simple_entry_titles()
    }

    /// Stops the service, waiting for pending regenerations to finish.
    pub fn shutdown(self) -> Result<()> {
        self.synchronizer.shutdown()
    }
}
