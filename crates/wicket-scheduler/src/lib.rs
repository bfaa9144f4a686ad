// SPDX-FileCopyrightText: 2026 Wicket Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task runner for the Wicket queue engine.
//!
//! Each [`PeriodicTask`] gets its own tokio task driven by an interval.
//! A run is awaited before the next tick is taken, so a task never
//! overlaps itself; ticks missed while a run was slow are skipped rather
//! than replayed in a burst. Different tasks run independently.

pub mod shutdown;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use wicket_core::PeriodicTask;

pub use shutdown::install_signal_handler;

/// Collects periodic tasks and starts them together.
pub struct Scheduler {
    tasks: Vec<(Arc<dyn PeriodicTask>, Duration)>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            tasks: Vec::new(),
            cancel,
        }
    }

    /// Registers `task` to run every `every`.
    pub fn every(mut self, every: Duration, task: Arc<dyn PeriodicTask>) -> Self {
        self.tasks.push((task, every));
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns one loop per registered task.
    pub fn start(self) -> SchedulerHandle {
        let handles = self
            .tasks
            .into_iter()
            .map(|(task, every)| spawn_periodic(task, every, self.cancel.clone()))
            .collect();
        SchedulerHandle { handles }
    }
}

/// Join handles of the running task loops.
pub struct SchedulerHandle {
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Waits for every loop to exit after cancellation.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "periodic task ended abnormally");
            }
        }
    }
}

/// Runs `task` every `every` until `cancel` fires.
///
/// The first run happens one full period after the call. A failed run is
/// logged and the loop carries on with the next tick.
pub fn spawn_periodic(
    task: Arc<dyn PeriodicTask>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = task.name().to_string();
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Skip the first immediate tick.
        interval.tick().await;
        info!(task = %name, every_secs = every.as_secs_f64(), "periodic task started");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();
                    let result = task.run_once().await;
                    let elapsed = started.elapsed();
                    wicket_prometheus::record_tick_duration(&name, elapsed.as_secs_f64());

                    match result {
                        Ok(()) => debug!(task = %name, elapsed_ms = elapsed.as_millis() as u64, "tick finished"),
                        Err(e) => warn!(task = %name, error = %e, "tick failed (non-fatal)"),
                    }
                }
                _ = cancel.cancelled() => {
                    info!(task = %name, "periodic task shutting down");
                    break;
                }
            }
        }
    })
}
