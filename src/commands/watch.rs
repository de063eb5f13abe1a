use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ResolvedConfig;
use crate::cycle::{drain, log_join, spawn_cycle};
use crate::report::ReportSink;
use crate::watcher::{triggered, FileWatcher};

/// Runs the test commands once, then every matching command on each batch of
/// changes until `shutdown` resolves. Runs may overlap; in-flight runs are
/// awaited before returning.
pub async fn cmd_watch<F>(
    config: &ResolvedConfig,
    sink: Arc<dyn ReportSink>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut watcher = FileWatcher::new(&config.root)?;
    let mut tasks = JoinSet::new();

    let startup = config.test_commands();
    if startup.is_empty() {
        debug!("no test commands, waiting for changes");
    } else {
        spawn_cycle(&mut tasks, startup, Arc::clone(&sink));
    }

    info!(root = %watcher.root().display(), "watching for changes");

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("stopping");
                break;
            }
            batch = watcher.next_batch(config.debounce, &config.commands) => {
                let Some(paths) = batch else {
                    warn!("file watcher closed");
                    break;
                };

                while let Some(joined) = tasks.try_join_next() {
                    log_join(joined);
                }

                let specs = triggered(&config.commands, watcher.root(), &paths);
                if specs.is_empty() {
                    debug!(changed = paths.len(), "no command watches these paths");
                    continue;
                }

                info!(changed = paths.len(), commands = specs.len(), "change detected");
                spawn_cycle(&mut tasks, specs, Arc::clone(&sink));
            }
        }
    }

    drain(&mut tasks).await;
    Ok(())
}
