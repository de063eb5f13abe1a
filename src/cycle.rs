use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::CommandSpec;
use crate::executor;
use crate::report::{self, ReportSink};

/// Starts one task per spec. Each task reports as soon as its own command
/// finishes; nothing waits for the rest of the cycle.
///
/// Reports carry the command name as a label only when the cycle runs more
/// than one command.
pub fn spawn_cycle(tasks: &mut JoinSet<()>, specs: Vec<CommandSpec>, sink: Arc<dyn ReportSink>) {
    let labelled = specs.len() > 1;

    for spec in specs {
        let sink = Arc::clone(&sink);
        tasks.spawn(async move {
            let result = executor::run(&spec).await;
            info!(
                command = %spec.name,
                success = result.is_success(),
                "run finished"
            );
            let label = labelled.then_some(spec.name.as_str());
            sink.emit(&report::format(&result, label));
        });
    }
}

/// Runs one cycle and waits for every report to be emitted.
pub async fn run_cycle(specs: Vec<CommandSpec>, sink: Arc<dyn ReportSink>) {
    let mut tasks = JoinSet::new();
    spawn_cycle(&mut tasks, specs, sink);
    drain(&mut tasks).await;
}

pub async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
}

pub fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!(error = %e, "command task did not complete");
    }
}
