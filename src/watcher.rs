//! Log file watching for automatic re-estimation.
//!
//! Editors tend to save in bursts (truncate, write, rename), so events are
//! debounced before the callback runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

/// Interval at which a pending (debounced) change is re-checked.
const PENDING_POLL: Duration = Duration::from_millis(250);

/// Configuration for log watching.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Minimum time between callbacks (default: 1 second).
    pub debounce_duration: Duration,
    /// Number of attempts for a re-estimation (default: 3).
    pub retry_attempts: u32,
    /// Delay between attempts (default: 300ms).
    pub retry_delay: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_secs(1),
            retry_attempts: 3,
            retry_delay: Duration::from_millis(300),
        }
    }
}

/// Errors that can occur while watching the log.
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("failed to create watcher: {0}")]
    Notify(#[from] notify::Error),

    #[error("watch path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("event channel closed unexpectedly")]
    ChannelClosed,
}

/// Collapses rapid events into a single trigger.
struct Debouncer {
    last_triggered: Option<Instant>,
    duration: Duration,
}

impl Debouncer {
    fn new(duration: Duration) -> Self {
        Self {
            last_triggered: None,
            duration,
        }
    }

    /// Returns true if enough time has passed since the last trigger.
    fn should_trigger(&mut self) -> bool {
        let now = Instant::now();
        let ready = self
            .last_triggered
            .is_none_or(|last| now.duration_since(last) >= self.duration);
        if ready {
            self.last_triggered = Some(now);
        }
        ready
    }

    /// Restarts the quiet period without triggering.
    fn reset(&mut self) {
        self.last_triggered = Some(Instant::now());
    }
}

/// Returns true if the event touches `file_name` in a way that may change its contents.
fn is_relevant(event: &Event, file_name: &std::ffi::OsStr) -> bool {
    let touches_file = event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name));

    touches_file
        && matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
}

/// Watches the log file and calls `on_change` after each debounced modification.
///
/// Runs until the event channel closes.
pub async fn watch_log<F>(
    path: impl AsRef<Path>,
    config: WatcherConfig,
    on_change: F,
) -> Result<(), WatcherError>
where
    F: Fn() + Send + Sync + 'static,
{
    let path = path.as_ref();
    let canonical_path = path
        .canonicalize()
        .map_err(|_| WatcherError::PathNotFound(path.to_path_buf()))?;
    let file_name = canonical_path
        .file_name()
        .map(|s| s.to_owned())
        .ok_or_else(|| WatcherError::PathNotFound(canonical_path.clone()))?;
    // The parent directory is watched so that atomic replace-on-save is seen.
    let watch_dir = canonical_path.parent().unwrap_or(&canonical_path);

    log::info!("watching log file: {}", canonical_path.display());

    let (tx, mut rx) = mpsc::channel::<Event>(100);
    let mut watcher = RecommendedWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                // Dropping events is fine when the channel is full; one is enough to trigger.
                let _ = tx.try_send(event);
            }
            Err(e) => log::warn!("watch error: {}", e),
        },
        notify::Config::default(),
    )?;
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let on_change = Arc::new(on_change);
    let debouncer = Arc::new(Mutex::new(Debouncer::new(config.debounce_duration)));
    let pending = Arc::new(Mutex::new(false));

    // Fires changes that arrived during a quiet period once it has elapsed.
    let pending_task = {
        let debouncer = debouncer.clone();
        let on_change = on_change.clone();
        let pending = pending.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(PENDING_POLL).await;
                let mut pending = pending.lock().await;
                if *pending && debouncer.lock().await.should_trigger() {
                    *pending = false;
                    drop(pending);
                    log::debug!("debounced change released");
                    on_change();
                }
            }
        })
    };

    while let Some(event) = rx.recv().await {
        if !is_relevant(&event, &file_name) {
            continue;
        }
        log::debug!("log file event: {:?}", event.kind);

        let mut db = debouncer.lock().await;
        if db.should_trigger() {
            drop(db);
            log::info!("log file changed, re-estimating");
            on_change();
        } else {
            db.reset();
            drop(db);
            *pending.lock().await = true;
        }
    }

    pending_task.abort();
    Err(WatcherError::ChannelClosed)
}
