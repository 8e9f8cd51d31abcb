//! Simulated lifecycle of a local node sandbox
//!
//! Nothing here talks to a real process; start and stop just take a
//! configurable amount of time. The simulated ledger does not depend on the
//! sandbox at all.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::config::SandboxConfig;
use crate::traits::Sandbox;

/// Lifecycle state of a sandbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxState {
    Stopped,
    Starting,
    Running { since: NaiveDateTime },
    Stopping,
}

impl SandboxState {
    pub fn is_running(&self) -> bool {
        matches!(self, SandboxState::Running { .. })
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, SandboxState::Stopped)
    }

    /// Starting or stopping
    pub fn is_transitioning(&self) -> bool {
        matches!(self, SandboxState::Starting | SandboxState::Stopping)
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxState::Stopped => write!(f, "stopped"),
            SandboxState::Starting => write!(f, "starting"),
            SandboxState::Running { since } => write!(f, "running (started at {})", since),
            SandboxState::Stopping => write!(f, "stopping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("Sandbox is not running")]
    NotRunning,
    #[error("Sandbox is already running")]
    AlreadyRunning,
    #[error("Sandbox is {0}; wait for the transition to finish")]
    Busy(SandboxState),
    #[error("Timed out after {0:?} waiting for sandbox to be ready")]
    ReadyTimeout(Duration),
}

fn lock(state: &Mutex<SandboxState>) -> MutexGuard<'_, SandboxState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-flight start or stop.
///
/// Dropping it before [`finish`](Transition::finish) puts back the state the
/// transition started from, so a cancelled `start` or `stop` never leaves the
/// sandbox stuck in `Starting` or `Stopping`.
struct Transition<'a> {
    state: &'a Mutex<SandboxState>,
    previous: SandboxState,
    finished: bool,
}

impl Transition<'_> {
    fn finish(mut self, to: SandboxState) {
        *lock(self.state) = to;
        self.finished = true;
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(restored = %self.previous, "sandbox transition abandoned");
            *lock(self.state) = self.previous;
        }
    }
}

/// Local sandbox simulated in-process
#[derive(Debug)]
pub struct LocalSandbox {
    config: SandboxConfig,
    state: Mutex<SandboxState>,
}

impl LocalSandbox {
    pub fn new() -> Self {
        Self::with_config(SandboxConfig::default())
    }

    pub fn with_config(config: SandboxConfig) -> Self {
        Self {
            config,
            state: Mutex::new(SandboxState::Stopped),
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    fn current(&self) -> SandboxState {
        *lock(&self.state)
    }

    /// Enter the transitional state `to` if the current state satisfies `from`
    fn begin(
        &self,
        from: fn(&SandboxState) -> bool,
        to: SandboxState,
        wrong_state: SandboxError,
    ) -> Result<Transition<'_>, SandboxError> {
        let mut state = lock(&self.state);
        if state.is_transitioning() {
            return Err(SandboxError::Busy(*state));
        }
        if !from(&*state) {
            return Err(wrong_state);
        }
        let previous = std::mem::replace(&mut *state, to);
        Ok(Transition {
            state: &self.state,
            previous,
            finished: false,
        })
    }

    fn require_running(&self) -> Result<(), SandboxError> {
        if self.current().is_running() {
            Ok(())
        } else {
            Err(SandboxError::NotRunning)
        }
    }
}

impl Default for LocalSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sandbox for LocalSandbox {
    async fn state(&self) -> SandboxState {
        self.current()
    }

    async fn algod_url(&self) -> Result<String, SandboxError> {
        self.require_running()?;
        Ok(format!("http://localhost:{}", self.config.algod_port))
    }

    async fn indexer_url(&self) -> Result<String, SandboxError> {
        self.require_running()?;
        Ok(format!("http://localhost:{}", self.config.indexer_port))
    }

    async fn api_token(&self) -> Result<String, SandboxError> {
        self.require_running()?;
        Ok(self.config.api_token.clone())
    }

    async fn start(&self) -> Result<(), SandboxError> {
        let transition = self.begin(
            SandboxState::is_stopped,
            SandboxState::Starting,
            SandboxError::AlreadyRunning,
        )?;
        info!(port = self.config.algod_port, "starting sandbox");

        sleep(self.config.startup_delay()).await;

        let since = chrono::Utc::now().naive_utc();
        transition.finish(SandboxState::Running { since });
        info!(%since, "sandbox running");
        Ok(())
    }

    async fn stop(&self) -> Result<(), SandboxError> {
        let transition = self.begin(
            SandboxState::is_running,
            SandboxState::Stopping,
            SandboxError::NotRunning,
        )?;
        info!("stopping sandbox");

        sleep(self.config.shutdown_delay()).await;

        transition.finish(SandboxState::Stopped);
        info!("sandbox stopped");
        Ok(())
    }

    async fn reset(&self) -> Result<(), SandboxError> {
        let was_running = self.current().is_running();
        if was_running {
            self.stop().await?;
        }

        sleep(self.config.reset_delay()).await;

        if was_running {
            self.start().await?;
        }
        Ok(())
    }

    async fn wait_for_ready(&self, timeout: Duration) -> Result<(), SandboxError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.current().is_running() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SandboxError::ReadyTimeout(timeout));
            }
            sleep(self.config.poll_interval()).await;
        }
    }
}
