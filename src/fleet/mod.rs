// Fleet module - parallel slot supervision

mod slot;

pub use slot::{run_attempt, supervise, AttemptReport, RunOutcome, SlotSupervisor};

use crate::config::FleetConfig;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::info;

/// A fleet of independent slot supervisors sharing one configuration
pub struct Fleet {
    config: Arc<FleetConfig>,
    slots: usize,
}

impl Fleet {
    /// Create a fleet with `slots` supervisor loops
    pub fn new(config: FleetConfig, slots: usize) -> Self {
        Self {
            config: Arc::new(config),
            slots: slots.max(1),
        }
    }

    /// Number of slots this fleet runs
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Run every slot until the shutdown signal flips, then reap them all.
    ///
    /// Slots are fully independent; the receiver is the only thing they
    /// share besides the read-only configuration.
    pub async fn run_until(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut tasks = JoinSet::new();

        for slot in 1..=self.slots {
            let supervisor =
                SlotSupervisor::new(slot, Arc::clone(&self.config), shutdown.clone());
            tasks.spawn(supervisor.run());
        }

        info!("fleet started: {} slot(s)", self.slots);

        while tasks.join_next().await.is_some() {}

        info!("fleet stopped");

        Ok(())
    }

    /// Run the fleet until Ctrl-C triggers a graceful shutdown
    pub async fn run(&self) -> Result<()> {
        let (tx, rx) = watch::channel(false);

        let fleet = self.run_until(rx);
        tokio::pin!(fleet);

        tokio::select! {
            result = &mut fleet => return result,
            signal = tokio::signal::ctrl_c() => {
                if signal.is_ok() {
                    info!("received Ctrl-C, shutting down fleet");
                }
                let _ = tx.send(true);
            }
        }

        fleet.await
    }
}
