use crate::models::SessionPhase;
use crate::ports::{PollingStrategy, ProcessPort};
use anyhow::Result;
use std::time::Duration;
use thiserror::Error;

/// The Steam client binary launched with `-applaunch`.
pub const STEAM_PROGRAM: &str = "steam";

/// The Windows-side client helper whose presence in the process table marks
/// a running Proton session.
pub const CLIENT_HELPER_PROCESS: &str = "steam.exe";

/// Errors from session control
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Gave up waiting for '{process}' after {attempts} polls")]
    PollTimeout {
        process: &'static str,
        attempts: u32,
    },
}

/// Drives the Steam client through one capture session.
///
/// The session lifecycle is strictly sequential:
/// `Idle -> Launching -> AwaitingStart -> Running -> AwaitingExit -> Idle`.
/// Steam and the game run as independent OS processes; this controller only
/// observes them through the process table, sleeping between polls. With an
/// unbounded [`PollingStrategy`] the waits block until the client reaches
/// the expected state, potentially forever.
#[derive(Debug)]
pub struct SessionController<P: ProcessPort> {
    procs: P,
    polling: PollingStrategy,

    /// Wait after spawning Steam. The client transiently spawns a
    /// `steam.exe` helper on launch that would otherwise be mistaken for
    /// the game session.
    launch_settle: Duration,

    /// Wait after a kill so the client's on-disk state settles before the
    /// environment is mutated or the client is reused.
    kill_settle: Duration,

    phase: SessionPhase,
}

impl<P: ProcessPort> SessionController<P> {
    pub fn new(
        procs: P,
        polling: PollingStrategy,
        launch_settle: Duration,
        kill_settle: Duration,
    ) -> Self {
        Self {
            procs,
            polling,
            launch_settle,
            kill_settle,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    fn enter(&mut self, phase: SessionPhase) {
        tracing::debug!("Session phase: {} -> {}", self.phase, phase);
        self.phase = phase;
    }

    /// Launch the client with an applaunch request for `appid`, inheriting
    /// the current (just-configured) process environment.
    pub async fn launch_client(&mut self, appid: &str) -> Result<()> {
        self.enter(SessionPhase::Launching);
        tracing::info!("Launching appid {} through Steam...", appid);
        self.procs.spawn(
            STEAM_PROGRAM,
            &["-applaunch".to_string(), appid.to_string()],
        )?;
        tokio::time::sleep(self.launch_settle).await;
        Ok(())
    }

    /// Block until the client helper process appears.
    pub async fn wait_for_start(&mut self) -> Result<()> {
        self.enter(SessionPhase::AwaitingStart);
        tracing::info!("Waiting for the game session to start...");
        self.poll_until(CLIENT_HELPER_PROCESS, |running| running).await?;
        self.enter(SessionPhase::Running);
        Ok(())
    }

    /// Block until the client helper process disappears.
    pub async fn wait_for_exit(&mut self) -> Result<()> {
        self.enter(SessionPhase::AwaitingExit);
        tracing::info!("Waiting for {} to exit...", CLIENT_HELPER_PROCESS);
        self.poll_until(CLIENT_HELPER_PROCESS, |running| !running).await?;
        self.enter(SessionPhase::Idle);
        Ok(())
    }

    /// Force-kill every client instance by name, then wait out the settle
    /// interval. Used before a relaunch (so the client picks up new shim
    /// and environment state) and after the session (so file locks are
    /// released before uninstall).
    pub async fn terminate_client(&mut self) -> Result<()> {
        tracing::info!("Killing {}...", STEAM_PROGRAM);
        self.procs.kill_by_name(STEAM_PROGRAM)?;
        tokio::time::sleep(self.kill_settle).await;
        self.enter(SessionPhase::Idle);
        Ok(())
    }

    async fn poll_until(
        &mut self,
        name: &'static str,
        done: impl Fn(bool) -> bool,
    ) -> Result<()> {
        let mut attempts: u32 = 0;
        loop {
            if done(self.procs.running(name)?) {
                return Ok(());
            }
            attempts += 1;
            if self.polling.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(SessionError::PollTimeout {
                    process: name,
                    attempts,
                }
                .into());
            }
            tokio::time::sleep(self.polling.interval).await;
        }
    }
}
