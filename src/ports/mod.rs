//! Port traits for the tool's side-effecting collaborators.
//!
//! The capture pipeline mutates process-wide environment variables and
//! drives external OS processes. Both are hidden behind small traits so the
//! services stay deterministic under test: unit tests use mockall mocks,
//! integration tests use scripted fakes.
//!
//! - [`EnvironmentPort`]: get/set/unset of process environment variables
//! - [`ProcessPort`]: spawn, process-table lookup, kill-by-name
//! - [`PollingStrategy`]: interval and optional attempt bound for the
//!   blocking wait loops

use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use std::time::Duration;

/// Access to process environment variables.
///
/// The single seam through which the configurator reads, writes, and
/// removes variables, so cleanup goes through the same primitive as setup.
#[cfg_attr(test, mockall::automock)]
pub trait EnvironmentPort {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str);
    fn unset(&mut self, name: &str);
}

/// Launch, observe, and terminate external processes.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessPort {
    /// Spawn a detached process inheriting the current environment.
    fn spawn(&mut self, program: &str, args: &[String]) -> Result<()>;

    /// Whether a process whose command line contains `name` is running.
    fn running(&self, name: &str) -> Result<bool>;

    /// Force-kill every process matching `name`. A zero match is not an
    /// error; kill-by-name is blunt and unverified.
    fn kill_by_name(&mut self, name: &str) -> Result<()>;
}

/// The real process environment.
#[derive(Debug, Default)]
pub struct ProcessEnvironment;

impl EnvironmentPort for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&mut self, name: &str, value: &str) {
        tracing::info!("env {}={}", name, value);
        // Safety: the pipeline is single-threaded and mutates the
        // environment only between child spawns.
        unsafe { std::env::set_var(name, value) };
    }

    fn unset(&mut self, name: &str) {
        tracing::info!("rm env {}", name);
        // Safety: see set().
        unsafe { std::env::remove_var(name) };
    }
}

/// The real OS process table, driven through `ps` and `killall`.
#[derive(Debug, Default)]
pub struct SystemProcesses;

impl ProcessPort for SystemProcesses {
    fn spawn(&mut self, program: &str, args: &[String]) -> Result<()> {
        tracing::info!("Spawning: {} {}", program, args.join(" "));
        Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", program))?;
        Ok(())
    }

    fn running(&self, name: &str) -> Result<bool> {
        let output = Command::new("ps")
            .arg("-Af")
            .output()
            .context("Failed to list processes with 'ps -Af'")?;
        let listing = String::from_utf8_lossy(&output.stdout);
        Ok(listing.contains(name))
    }

    fn kill_by_name(&mut self, name: &str) -> Result<()> {
        let status = Command::new("killall")
            .arg(name)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("Failed to run 'killall'")?;
        if !status.success() {
            // killall exits non-zero when nothing matched
            tracing::debug!("killall {} exited with {}", name, status);
        }
        Ok(())
    }
}

/// Pacing for the process-table wait loops.
///
/// Production runs with `max_attempts: None`, which polls until the
/// predicate flips and can block forever if the client never reaches the
/// expected state. Tests bound the loop and use a zero interval.
#[derive(Debug, Clone, Copy)]
pub struct PollingStrategy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl PollingStrategy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn bounded(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_environment_roundtrip() {
        let mut env = ProcessEnvironment;
        env.set("PROTONTRACE_PORT_TEST", "value");
        assert_eq!(
            env.get("PROTONTRACE_PORT_TEST"),
            Some("value".to_string())
        );
        env.unset("PROTONTRACE_PORT_TEST");
        assert_eq!(env.get("PROTONTRACE_PORT_TEST"), None);
    }

    #[test]
    fn test_polling_strategy_constructors() {
        let unbounded = PollingStrategy::new(Duration::from_secs(1));
        assert_eq!(unbounded.max_attempts, None);

        let bounded = PollingStrategy::bounded(Duration::ZERO, 5);
        assert_eq!(bounded.max_attempts, Some(5));
        assert_eq!(bounded.interval, Duration::ZERO);
    }

    #[test]
    fn test_system_processes_running_self() {
        // The ps listing always contains ps itself and this test binary.
        let procs = SystemProcesses;
        assert!(procs.running("ps").unwrap());
        assert!(!procs.running("no-such-process-name-xyzzy").unwrap());
    }

    #[test]
    fn test_mock_environment_port() {
        let mut mock = MockEnvironmentPort::new();
        mock.expect_set()
            .withf(|name, value| name == "VAR" && value == "1")
            .times(1)
            .return_const(());
        mock.expect_get()
            .withf(|name| name == "VAR")
            .return_const(Some("1".to_string()));

        mock.set("VAR", "1");
        assert_eq!(mock.get("VAR"), Some("1".to_string()));
    }
}
