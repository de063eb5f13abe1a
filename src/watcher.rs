use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::CommandSpec;
use crate::paths::relative_to;

const CHANNEL_CAPACITY: usize = 256;

/// Upper bound on one batch, so a steady stream of matching writes still
/// starts runs.
const MAX_BATCH_WINDOW: Duration = Duration::from_secs(2);

/// Recursive watcher on the project root that yields changed paths in
/// debounced batches.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<PathBuf>,
    root: PathBuf,
}

impl FileWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        // Backends report canonical paths; match against the same form.
        let root = root
            .canonicalize()
            .with_context(|| format!("watch root {} does not exist", root.display()))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_change(&event.kind) {
                    return;
                }
                for path in event.paths {
                    trace!(path = %path.display(), kind = ?event.kind, "fs event");
                    if tx.blocking_send(path).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        })
        .context("failed to create file watcher")?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;

        debug!(root = %root.display(), "watching");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Waits for a change some spec watches, then gathers further such
    /// changes until `debounce` passes quietly or the batch has been open for
    /// `MAX_BATCH_WINDOW`. Paths no spec watches are dropped and never hold a
    /// batch open. `None` once the watcher has shut down.
    pub async fn next_batch(
        &mut self,
        debounce: Duration,
        specs: &[CommandSpec],
    ) -> Option<Vec<PathBuf>> {
        let first = loop {
            let path = self.receiver.recv().await?;
            if is_watched(specs, &self.root, &path) {
                break path;
            }
            trace!(path = %path.display(), "ignoring unwatched path");
        };
        let mut paths = BTreeSet::from([first]);
        let deadline = Instant::now() + MAX_BATCH_WINDOW;

        loop {
            let quiet_until = (Instant::now() + debounce).min(deadline);
            match tokio::time::timeout_at(quiet_until, self.next_watched(specs)).await {
                Ok(Some(path)) => {
                    paths.insert(path);
                }
                Ok(None) | Err(_) => break,
            }
        }

        Some(paths.into_iter().collect())
    }

    async fn next_watched(&mut self, specs: &[CommandSpec]) -> Option<PathBuf> {
        loop {
            let path = self.receiver.recv().await?;
            if is_watched(specs, &self.root, &path) {
                return Some(path);
            }
        }
    }
}

/// Whether any spec's glob matches `path` (absolute, under `root`).
pub fn is_watched(specs: &[CommandSpec], root: &Path, path: &Path) -> bool {
    relative_to(root, path).is_some_and(|rel| specs.iter().any(|spec| spec.matches(rel)))
}

fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Specs whose glob matches at least one of `paths`, in config order.
pub fn triggered(specs: &[CommandSpec], root: &Path, paths: &[PathBuf]) -> Vec<CommandSpec> {
    let relative: Vec<&Path> = paths
        .iter()
        .filter_map(|p| relative_to(root, p))
        .collect();

    specs
        .iter()
        .filter(|spec| relative.iter().any(|p| spec.matches(p)))
        .cloned()
        .collect()
}
