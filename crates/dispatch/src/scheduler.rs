//! Periodic dispatch.
//!
//! [`DispatchScheduler`] runs as a background task, invoking a dispatch
//! cycle on a fixed interval. A failed cycle is logged and retried on the
//! next tick, never in a tight loop. Manual cycles may run at the same time;
//! the job registry keeps them from double-dispatching.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::DispatchConfig;
use crate::cycle::Dispatcher;

/// Background service that runs dispatch cycles on a fixed interval.
pub struct DispatchScheduler {
    dispatcher: Arc<Dispatcher>,
    config: DispatchConfig,
    interval: Duration,
}

impl DispatchScheduler {
    pub fn new(dispatcher: Arc<Dispatcher>, config: DispatchConfig, interval: Duration) -> Self {
        Self {
            dispatcher,
            config,
            interval,
        }
    }

    /// Run the scheduler loop.
    ///
    /// The first cycle runs immediately. The loop exits when `cancel` fires;
    /// an in-flight cycle is dropped at that point, which leaves the job
    /// registry consistent because each insert is a single statement.
    pub async fn run(&self, cancel: CancellationToken) {
        if self.interval.is_zero() {
            tracing::warn!("Dispatch scheduler interval is zero; scheduler disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            cities = self.config.cities.len(),
            "Dispatch scheduler started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Dispatch scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Dispatch scheduler cancelled mid-cycle");
                            break;
                        }
                        outcome = self.dispatcher.run_cycle(&self.config) => {
                            if let Err(e) = outcome {
                                tracing::error!(error = %e, "Scheduled dispatch cycle failed");
                            }
                        }
                    }
                }
            }
        }
    }
}
