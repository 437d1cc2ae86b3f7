use crate::error::SyncError;
use crate::executor::Executor;
use crate::probe::ResolutionProbe;
use crate::scheduler::{self, UpdateSignal, UpdateWorker};
use anyhow::{Context, Result, bail};
use edera_bootsync_config::{CacheConfig, PathsConfiguration};
use edera_bootsync_menu::Menu;
use edera_bootsync_settings::{Settings, TIMEOUT_DISABLED};
use log::{error, info};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// The files the [Synchronizer] loads its state from.
#[derive(Debug, Clone)]
pub struct Sources {
    /// The generated boot menu.
    pub menu: PathBuf,
    /// The settings file.
    pub settings: PathBuf,
    /// The cache record.
    pub cache: PathBuf,
}

impl From<&PathsConfiguration> for Sources {
    fn from(paths: &PathsConfiguration) -> Self {
        Self {
            menu: PathBuf::from(&paths.menu),
            settings: PathBuf::from(&paths.settings),
            cache: PathBuf::from(&paths.cache),
        }
    }
}

/// The boot menu and settings, rebuilt wholesale whenever they are loaded.
struct SyncState {
    menu: Menu,
    settings: Settings,
}

/// Keeps the bootloader settings, the generated boot menu and the cache record in sync.
///
/// Setters persist the settings immediately and request a regeneration of the boot menu,
/// which runs on a background worker without blocking the caller.
pub struct Synchronizer {
    /// The menu and settings, shared between callers.
    state: Mutex<SyncState>,
    /// Requests regenerations from the worker.
    signal: UpdateSignal,
    /// The regeneration worker.
    worker: JoinHandle<()>,
    /// Persists settings and renders the theme background.
    executor: Arc<dyn Executor>,
    /// The theme file forced into the settings on every write, if any.
    theme: Option<String>,
}

/// Reads the source file at `path`.
fn read_source(path: &Path) -> Result<String, SyncError> {
    fs::read_to_string(path).map_err(|source| SyncError::MissingResource {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the cache record at `path`. A missing record is created with defaults.
fn load_cache(path: &Path, executor: &dyn Executor) -> Result<CacheConfig, SyncError> {
    match fs::read_to_string(path) {
        Ok(content) => {
            CacheConfig::from_toml(&content).map_err(|source| SyncError::MalformedInput {
                path: path.to_path_buf(),
                source,
            })
        }

        Err(error) if error.kind() == ErrorKind::NotFound => {
            info!("no cache record at {}, creating one", path.display());
            let cache = CacheConfig::default();
            let written = cache
                .to_toml()
                .and_then(|content| executor.write_cache(&content));
            if let Err(error) = written {
                error!("unable to create cache record: {:#}", error);
            }
            Ok(cache)
        }

        Err(source) => Err(SyncError::MissingResource {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl Synchronizer {
    /// Loads the boot menu, settings and cache record from `sources`, reconciles them with the
    /// display resolution reported by `probe`, and starts the regeneration worker.
    ///
    /// A regeneration is requested right away if the cache record shows an unfinished one,
    /// if the display resolution changed, or if normalizing the settings changed them.
    pub fn load(
        sources: &Sources,
        theme: Option<String>,
        executor: Arc<dyn Executor>,
        probe: &dyn ResolutionProbe,
    ) -> Result<Self, SyncError> {
        info!("loading boot menu {}", sources.menu.display());
        let menu = Menu::parse(&read_source(&sources.menu)?).map_err(|source| {
            SyncError::MalformedInput {
                path: sources.menu.clone(),
                source: source.into(),
            }
        })?;

        info!("loading settings {}", sources.settings.display());
        let mut settings = Settings::parse(&read_source(&sources.settings)?);
        let hidden_timeout_cleared = settings.normalize(&menu);

        let mut cache = load_cache(&sources.cache, executor.as_ref())?;
        let (signal, requests) = scheduler::channel();

        if hidden_timeout_cleared {
            info!("hidden timeout settings conflict with the timeout, clearing them");
            if let Err(error) = write_settings(executor.as_ref(), theme.as_deref(), &mut settings) {
                log_failure(error);
            }
            signal.notify();
        }

        if cache.needs_update {
            info!("previous regeneration did not complete, requesting another");
            signal.notify();
        }

        reconcile_resolution(
            probe,
            &mut cache,
            &mut settings,
            executor.as_ref(),
            theme.as_deref(),
            &signal,
        );

        // The worker takes ownership of the reconciled cache record.
        let worker = UpdateWorker::new(requests, cache, executor.clone())
            .spawn()
            .map_err(SyncError::Worker)?;

        Ok(Self {
            state: Mutex::new(SyncState { menu, settings }),
            signal,
            worker,
            executor,
            theme,
        })
    }

    /// The title of the default boot entry.
    pub fn default_entry(&self) -> String {
        let state = self.lock_state();
        state.settings.default_entry(&state.menu)
    }

    /// The boot menu timeout in seconds, or [TIMEOUT_DISABLED].
    pub fn timeout(&self) -> i32 {
        self.lock_state().settings.timeout()
    }

    /// The graphics mode of the boot menu.
    pub fn gfxmode(&self) -> String {
        self.lock_state().settings.gfxmode()
    }

    /// The full titles of all selectable entries, including their submenu ancestry.
    pub fn entry_titles(&self) -> Result<Vec<String>, SyncError> {
        let titles = self.lock_state().menu.entry_titles();
        if titles.is_empty() {
            return Err(SyncError::NoEntries);
        }
        Ok(titles)
    }

    /// The titles of the selectable entries outside of any submenu.
    pub fn simple_entry_titles(&self) -> Result<Vec<String>, SyncError> {
        let titles = self.lock_state().menu.simple_entry_titles();
        if titles.is_empty() {
            return Err(SyncError::NoEntries);
        }
        Ok(titles)
    }

    /// Checks whether a regeneration has been requested but not yet started.
    pub fn is_update_pending(&self) -> bool {
        self.signal.is_pending()
    }

    /// Sets the default entry to the top-level entry `title`.
    /// Returns whether the setting changed.
    pub fn set_default_entry(&self, title: &str) -> Result<bool, SyncError> {
        let mut state = self.lock_state();
        if !state.menu.simple_entry_titles().iter().any(|entry| entry == title) {
            return Err(SyncError::UnknownEntry(title.to_string()));
        }

        if state.settings.default_entry(&state.menu) == title {
            return Ok(false);
        }

        self.update_settings(&mut state, |settings| settings.set_default_entry(title))?;
        drop(state);

        info!("default entry set to {}", title);
        self.signal.notify();
        Ok(true)
    }

    /// Sets the boot menu timeout in seconds. [TIMEOUT_DISABLED] disables the timeout.
    /// Returns whether the setting changed.
    pub fn set_timeout(&self, timeout: i32) -> Result<bool, SyncError> {
        if timeout < TIMEOUT_DISABLED {
            return Err(SyncError::InvalidTimeout(timeout));
        }

        let mut state = self.lock_state();
        if state.settings.timeout() == timeout {
            return Ok(false);
        }

        self.update_settings(&mut state, |settings| settings.set_timeout(timeout))?;
        drop(state);

        info!("timeout set to {}", timeout);
        self.signal.notify();
        Ok(true)
    }

    /// Stops accepting requests and waits for the worker to finish any queued regeneration.
    pub fn shutdown(self) -> Result<()> {
        let Self { signal, worker, .. } = self;

        // Closing the channel lets the worker exit once it is drained.
        drop(signal);
        if worker.join().is_err() {
            bail!("regeneration worker panicked");
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `change` to the settings and persists them, rolling back on failure.
    fn update_settings(
        &self,
        state: &mut SyncState,
        change: impl FnOnce(&mut Settings),
    ) -> Result<(), SyncError> {
        let previous = state.settings.clone();
        change(&mut state.settings);

        let written = write_settings(
            self.executor.as_ref(),
            self.theme.as_deref(),
            &mut state.settings,
        );
        if let Err(error) = written {
            state.settings = previous;
            return Err(error);
        }
        Ok(())
    }
}

/// Persists `settings` through the `executor`, enabling `theme` first if one is configured.
fn write_settings(
    executor: &dyn Executor,
    theme: Option<&str>,
    settings: &mut Settings,
) -> Result<(), SyncError> {
    if let Some(theme) = theme {
        settings.set_theme(theme);
    }

    executor
        .write_settings(&settings.serialize())
        .context("settings write was rejected")
        .map_err(|source| SyncError::PersistenceFailure {
            target: "settings",
            source,
        })
}

/// Updates the graphics mode and the cached resolution when the resolution reported by
/// `probe` differs from the one the boot menu was last configured for.
///
/// A change requests a regeneration of the boot menu and renders a new theme background.
fn reconcile_resolution(
    probe: &dyn ResolutionProbe,
    cache: &mut CacheConfig,
    settings: &mut Settings,
    executor: &dyn Executor,
    theme: Option<&str>,
    signal: &UpdateSignal,
) {
    let resolution = probe.best_resolution();
    let gfxmode = resolution.gfxmode();
    if gfxmode == settings.gfxmode() && resolution == cache.resolution() {
        return;
    }

    info!(
        "display resolution changed from {} to {}",
        cache.resolution(),
        resolution
    );
    settings.set_gfxmode(&gfxmode);
    if let Err(error) = write_settings(executor, theme, settings) {
        log_failure(error);
    }

    cache.set_resolution(resolution);
    signal.notify();

    // The theme background is rendered by a different collaborator, outside of the queue.
    if let Err(error) = executor.generate_theme_background(resolution) {
        error!("unable to generate theme background: {:#}", error);
    }
}

/// Logs a failure that does not stop loading, including its causes.
fn log_failure(error: SyncError) {
    error!("{:#}", anyhow::Error::new(error));
}
