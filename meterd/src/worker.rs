use std::sync::Arc;

use accounting::UsageAccumulator;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error};

enum WorkerCommand {
    Check,
}

/// Single-worker queue serializing reconciliation runs.
///
/// Triggers are drained one at a time, so at most one reconciliation touches
/// the store at any moment. A failed run is logged and the worker waits for
/// the next trigger; the periodic caller is the retry mechanism.
pub struct UsageWorker;

impl UsageWorker {
    pub fn spawn(accumulator: Arc<UsageAccumulator>) -> (UsageWorkerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WorkerCommand::Check => {
                        if let Err(e) = accumulator.run_once().await {
                            error!("Usage reconciliation failed: {}", e);
                        }
                    }
                }
            }
            debug!("Usage worker channel closed, stopping");
        });

        (UsageWorkerHandle { tx }, task)
    }
}

#[derive(Clone)]
pub struct UsageWorkerHandle {
    tx: UnboundedSender<WorkerCommand>,
}

impl UsageWorkerHandle {
    /// Queues one reconciliation; returns false when the worker is gone.
    pub fn trigger_check(&self) -> bool {
        self.tx.send(WorkerCommand::Check).is_ok()
    }
}
