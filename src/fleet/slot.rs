use crate::cli::output;
use crate::config::FleetConfig;
use crate::error::{Result, SimherdError};
use crate::logs::RunLog;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Grace period between SIGTERM and SIGKILL when a run is cut short
const KILL_GRACE: Duration = Duration::from_secs(10);

/// What became of a single run attempt
#[derive(Debug)]
pub enum RunOutcome {
    /// The simulator exited on its own
    Exited(ExitStatus),
    /// The run exceeded the timeout and was killed
    TimedOut,
    /// Fleet shutdown cut the run short
    Interrupted,
}

impl RunOutcome {
    /// The exit-status line appended to the run log
    pub fn status_line(&self, timeout: Duration) -> String {
        match self {
            RunOutcome::Exited(status) => match status.code() {
                Some(code) => format!("exit status: {}", code),
                None => format!("exit status: {}", describe_abnormal_exit(status)),
            },
            RunOutcome::TimedOut => {
                format!("exit status: timed out after {}h", timeout.as_secs() / 3600)
            }
            RunOutcome::Interrupted => "exit status: interrupted by shutdown".to_string(),
        }
    }

    /// Whether the attempt finished with a zero exit code
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Exited(status) if status.success())
    }
}

fn describe_abnormal_exit(status: &ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return format!("signal {}", sig);
        }
    }

    let _ = status;
    "unknown".to_string()
}

/// Report for one completed run attempt
#[derive(Debug)]
pub struct AttemptReport {
    /// Slot that ran the attempt
    pub slot: usize,
    /// 1-based attempt counter within the slot
    pub attempt: u64,
    /// How the run ended
    pub outcome: RunOutcome,
    /// Wall-clock time the attempt took
    pub elapsed: Duration,
    /// Log file the attempt wrote to
    pub log_path: PathBuf,
}

/// Run the simulator once for `slot`, capturing output and enforcing the
/// configured timeout.
///
/// The child is placed in its own process group with stdout and stderr
/// redirected to a fresh run log; after the child is reaped the exit-status
/// line is appended to the log.
pub async fn run_attempt(
    config: &FleetConfig,
    slot: usize,
    attempt: u64,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<AttemptReport> {
    let mut log = RunLog::create(&config.log_dir, slot)?;

    let mut command = Command::new(&config.binary_path);
    command.stdout(log.stdio()?).stderr(log.stdio()?);
    command.kill_on_drop(true);

    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|e| {
        SimherdError::SpawnError(format!("{}: {}", config.binary_path.display(), e))
    })?;

    info!(
        "slot {}: attempt {} started (pid {}, log {})",
        slot,
        attempt,
        child.id().map(|p| p.to_string()).unwrap_or_else(|| "?".to_string()),
        log.path().display()
    );

    let started = Instant::now();
    let outcome = supervise(&mut child, config.run_timeout(), shutdown).await?;
    let elapsed = started.elapsed();

    log.append_status_line(&outcome.status_line(config.run_timeout()))?;

    Ok(AttemptReport {
        slot,
        attempt,
        outcome,
        elapsed,
        log_path: log.into_path(),
    })
}

/// Wait for a spawned child, enforcing `timeout` and honoring shutdown.
///
/// On timeout or shutdown the child's whole process group is terminated
/// (SIGTERM, grace period, then SIGKILL) before the outcome is returned.
pub async fn supervise(
    child: &mut Child,
    timeout: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<RunOutcome> {
    tokio::select! {
        result = tokio::time::timeout(timeout, child.wait()) => match result {
            Ok(wait) => Ok(RunOutcome::Exited(wait?)),
            Err(_) => {
                terminate(child).await;
                Ok(RunOutcome::TimedOut)
            }
        },
        _ = shutdown.changed() => {
            terminate(child).await;
            Ok(RunOutcome::Interrupted)
        }
    }
}

/// Terminate a child and its process group: SIGTERM, grace period, SIGKILL
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            // The child leads its own process group, so the group id is its pid
            let group = Pid::from_raw(pid as i32);

            if signal::killpg(group, Signal::SIGTERM).is_ok() {
                if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_ok() {
                    return;
                }
                warn!("process group {} ignored SIGTERM, sending SIGKILL", pid);
            }

            let _ = signal::killpg(group, Signal::SIGKILL);
            let _ = child.wait().await;
            return;
        }
    }

    let _ = child.start_kill();
    let _ = child.wait().await;
}

/// Supervisor for a single slot: runs the simulator under a timeout and
/// restarts it indefinitely until fleet shutdown.
pub struct SlotSupervisor {
    /// 1-based slot id
    slot: usize,
    /// Shared fleet configuration
    config: Arc<FleetConfig>,
    /// Fleet-wide shutdown signal
    shutdown: watch::Receiver<bool>,
}

impl SlotSupervisor {
    /// Create a supervisor for one slot
    pub fn new(slot: usize, config: Arc<FleetConfig>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            slot,
            config,
            shutdown,
        }
    }

    /// Run the supervise loop until shutdown.
    ///
    /// Every outcome is logged and the loop restarts; subprocess failures
    /// and timeouts never propagate out of the slot.
    pub async fn run(mut self) {
        info!("slot {}: supervisor started", self.slot);

        let mut attempt: u64 = 0;

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            attempt += 1;

            match run_attempt(&self.config, self.slot, attempt, &mut self.shutdown).await {
                Ok(report) => {
                    self.log_report(&report);
                    if matches!(report.outcome, RunOutcome::Interrupted) {
                        break;
                    }
                }
                Err(e) => {
                    error!("slot {}: attempt {} failed: {}", self.slot, attempt, e);
                }
            }

            // Restart delay, cut short by shutdown
            tokio::select! {
                _ = tokio::time::sleep(self.config.restart_delay()) => {}
                _ = self.shutdown.changed() => break,
            }
        }

        info!("slot {}: supervisor stopped", self.slot);
    }

    fn log_report(&self, report: &AttemptReport) {
        let elapsed = output::format_duration(&report.elapsed);

        match &report.outcome {
            RunOutcome::Exited(status) if status.success() => {
                info!(
                    "slot {}: attempt {} completed in {} ({})",
                    report.slot,
                    report.attempt,
                    elapsed,
                    report.log_path.display()
                );
            }
            RunOutcome::Exited(status) => {
                warn!(
                    "slot {}: attempt {} failed after {} ({}) ({})",
                    report.slot,
                    report.attempt,
                    elapsed,
                    describe_exit(status),
                    report.log_path.display()
                );
            }
            RunOutcome::TimedOut => {
                warn!(
                    "slot {}: attempt {} timed out after {}, killed ({})",
                    report.slot,
                    report.attempt,
                    elapsed,
                    report.log_path.display()
                );
            }
            RunOutcome::Interrupted => {
                info!(
                    "slot {}: attempt {} interrupted by shutdown after {}",
                    report.slot, report.attempt, elapsed
                );
            }
        }
    }
}

fn describe_exit(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => describe_abnormal_exit(status),
    }
}
