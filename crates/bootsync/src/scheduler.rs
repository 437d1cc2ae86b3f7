use crate::executor::Executor;
use anyhow::Result;
use edera_bootsync_config::CacheConfig;
use log::{debug, error, info, warn};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// The name of the regeneration worker thread.
const WORKER_THREAD_NAME: &str = "bootsync-update";

/// The number of wake-ups that can be queued. Requests beyond this are merged, as
/// the worker always consults the pending flag rather than the queued wake-ups.
const SIGNAL_CAPACITY: usize = 1;

/// The flag recording that a regeneration has been requested but not yet started.
#[derive(Debug, Default, Clone)]
struct PendingFlag(Arc<Mutex<bool>>);

impl PendingFlag {
    /// Locks the flag. A poisoned lock still holds a valid boolean.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks a regeneration as pending.
    fn set(&self) {
        *self.lock() = true;
    }

    /// Clears the flag, returning whether a regeneration was pending.
    fn take(&self) -> bool {
        std::mem::take(&mut *self.lock())
    }

    /// Checks whether a regeneration is pending.
    fn get(&self) -> bool {
        *self.lock()
    }
}

/// Requests regenerations from the [UpdateWorker]. Requesting never blocks.
///
/// Dropping the signal closes the request channel, which stops the worker once it
/// has handled any request already queued.
#[derive(Debug)]
pub struct UpdateSignal {
    /// The pending flag shared with the worker.
    pending: PendingFlag,
    /// Wakes up the worker.
    sender: SyncSender<()>,
}

impl UpdateSignal {
    /// Requests a regeneration of the boot configuration.
    pub fn notify(&self) {
        // The flag is released before waking the worker, so the worker can always take it.
        self.pending.set();

        match self.sender.try_send(()) {
            // A queued wake-up will observe the flag set above.
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                warn!("regeneration worker is not running, request stays pending");
            }
        }
    }

    /// Checks whether a regeneration has been requested but not yet started.
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }
}

/// Creates a connected [UpdateSignal] and the receiving half used to build an [UpdateWorker].
pub fn channel() -> (UpdateSignal, UpdateReceiver) {
    let (sender, receiver) = std::sync::mpsc::sync_channel(SIGNAL_CAPACITY);
    let pending = PendingFlag::default();
    (
        UpdateSignal {
            pending: pending.clone(),
            sender,
        },
        UpdateReceiver { pending, receiver },
    )
}

/// The receiving half of the request channel.
#[derive(Debug)]
pub struct UpdateReceiver {
    /// The pending flag shared with the signal.
    pending: PendingFlag,
    /// Receives wake-ups.
    receiver: Receiver<()>,
}

/// The single consumer of regeneration requests.
///
/// The worker owns the cache record and is the only caller of
/// [Executor::generate_boot_config], so at most one regeneration is ever in flight.
pub struct UpdateWorker {
    /// Where requests come from.
    requests: UpdateReceiver,
    /// The in-memory cache record.
    cache: CacheConfig,
    /// Persists the cache and regenerates the boot configuration.
    executor: Arc<dyn Executor>,
}

impl UpdateWorker {
    /// Creates a worker consuming `requests`, taking ownership of the `cache` record.
    pub fn new(requests: UpdateReceiver, cache: CacheConfig, executor: Arc<dyn Executor>) -> Self {
        Self {
            requests,
            cache,
            executor,
        }
    }

    /// Starts the worker on its own thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Handles wake-ups until the request channel is closed.
    pub fn run(mut self) {
        while self.requests.receiver.recv().is_ok() {
            self.cycle();
        }
        debug!("request channel closed, regeneration worker stopping");
    }

    /// Persists the cache record through the executor.
    fn persist(&self) -> Result<()> {
        let content = self.cache.to_toml()?;
        self.executor.write_cache(&content)
    }

    /// Runs one regeneration if one is pending.
    ///
    /// The cache is persisted with `needs_update` set before the executor runs and cleared
    /// after it succeeds. A crash in between leaves the flag set for the next start.
    fn cycle(&mut self) {
        self.cache.needs_update = self.requests.pending.take();
        if !self.cache.needs_update {
            return;
        }

        if let Err(error) = self.persist() {
            error!("unable to persist cache before regeneration: {:#}", error);
            // Retried on the next request.
            self.requests.pending.set();
            return;
        }

        info!("generating a new boot configuration");
        if let Err(error) = self.executor.generate_boot_config() {
            error!("unable to generate boot configuration: {:#}", error);
            self.requests.pending.set();
            return;
        }
        info!("boot configuration generated");

        self.cache.needs_update = false;
        if let Err(error) = self.persist() {
            // The persisted record still requests an update, which is repeated on next start.
            error!("unable to persist cache after regeneration: {:#}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edera_bootsync_config::Resolution;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Records the cache writes and generations it is asked to perform.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail_generate: AtomicBool,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    impl Executor for Recorder {
        fn write_settings(&self, _content: &str) -> Result<()> {
            self.calls.lock().expect("calls lock").push("settings".to_string());
            Ok(())
        }

        fn write_cache(&self, content: &str) -> Result<()> {
            let cache = CacheConfig::from_toml(content)?;
            self.calls
                .lock()
                .expect("calls lock")
                .push(format!("cache needs-update={}", cache.needs_update));
            Ok(())
        }

        fn generate_boot_config(&self) -> Result<()> {
            self.calls.lock().expect("calls lock").push("generate".to_string());
            if self.fail_generate.load(Ordering::SeqCst) {
                anyhow::bail!("generation failed");
            }
            Ok(())
        }

        fn generate_theme_background(&self, _resolution: Resolution) -> Result<()> {
            Ok(())
        }
    }

    fn clean_cache() -> CacheConfig {
        CacheConfig {
            needs_update: false,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn coalesces_requests_into_one_regeneration() {
        let recorder = Arc::new(Recorder::default());
        let (signal, requests) = channel();
        signal.notify();
        signal.notify();
        signal.notify();
        assert!(signal.is_pending());
        drop(signal);

        UpdateWorker::new(requests, clean_cache(), recorder.clone()).run();
        assert_eq!(
            recorder.calls(),
            vec!["cache needs-update=true", "generate", "cache needs-update=false"]
        );
    }

    #[test]
    fn wake_up_without_pending_flag_does_nothing() {
        let recorder = Arc::new(Recorder::default());
        let (signal, requests) = channel();
        signal.sender.try_send(()).expect("slot should be free");
        drop(signal);

        UpdateWorker::new(requests, clean_cache(), recorder.clone()).run();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn failed_generation_stays_pending() {
        let recorder = Arc::new(Recorder::default());
        recorder.fail_generate.store(true, Ordering::SeqCst);
        let (signal, requests) = channel();
        signal.notify();
        let pending = signal.pending.clone();
        drop(signal);

        UpdateWorker::new(requests, clean_cache(), recorder.clone()).run();
        assert_eq!(recorder.calls(), vec!["cache needs-update=true", "generate"]);
        assert!(pending.get());
    }

    #[test]
    fn spawned_worker_drains_before_exit() {
        let recorder = Arc::new(Recorder::default());
        let (signal, requests) = channel();
        let handle = UpdateWorker::new(requests, clean_cache(), recorder.clone())
            .spawn()
            .expect("worker should spawn");
        signal.notify();
        drop(signal);
        handle.join().expect("worker should not panic");

        assert_eq!(recorder.calls().last().map(String::as_str), Some("cache needs-update=false"));
        assert_eq!(
            recorder.calls().iter().filter(|call| *call == "generate").count(),
            1
        );
    }
}
