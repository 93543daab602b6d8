//! ProtonTrace - Automated graphics API trace capture for Steam/Proton games
//!
//! Main entry point for the CLI.
//!
//! # Overview
//!
//! This binary wires the capture services into one sequential pipeline:
//!
//! 1. Initialize logging (rotating file under `logs/` + console output)
//! 2. Load `ProtonTrace Settings.yaml` (defaults when absent)
//! 3. Resolve the game's install directory from the Steam library manifest
//! 4. Install the apitrace shim DLLs (or uninstall and exit with `-u`)
//! 5. Apply the capture environment (DLL overrides + Vulkan capture layer)
//! 6. Restart Steam so it picks up the environment, launch the game, and
//!    poll the process table until the session ends
//! 7. Kill Steam again, remove the shims, collect and recompress traces,
//!    restore the prior environment
//!
//! The pipeline is strictly sequential; the tokio runtime exists for
//! subprocess execution and timed sleeps, not for concurrency.
//!
//! # Platform
//!
//! Linux with Steam/Proton. The capture binaries (`apitrace-win32/`,
//! `apitrace-win64/`, `gfxreconstruct/`) are expected next to the tool
//! unless the settings file points elsewhere.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use protontrace::models::{Bitness, CaptureSettings};
use protontrace::ports::{PollingStrategy, ProcessEnvironment, SystemProcesses};
use protontrace::services::{
    EnvironmentConfigurator, GameLocator, LibraryLocator, SessionController, ShimManager,
    TraceCollector, game::resolve_install_target,
};
use protontrace::{APP_NAME, Metrics, SettingsManager, VERSION};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "protontrace",
    version,
    about = "Capture graphics API traces from Steam/Proton games",
    long_about = None
)]
struct Cli {
    /// The appid to launch on Steam
    appid: String,

    /// Use for 32-bit games
    #[arg(short = 'x', long = "x86")]
    x86: bool,

    /// Uninstall existing capture shims from the game directory and exit
    #[arg(short, long)]
    uninstall: bool,

    /// Relative path under the game root to install the shims to
    #[arg(short, long)]
    install_dir: Option<Utf8PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Settings are read before logging so the debug flag in the file can
    // raise the log level; messages from this load go nowhere.
    let settings_manager = SettingsManager::new(".")?;
    let settings = settings_manager.load_settings()?;
    let debug = cli.debug || settings.capture.debug_mode;

    let _guard = protontrace::logging::setup_logging("logs", "protontrace", debug, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    tracing::info!("Settings file: {}", settings_manager.settings_path());

    // Create tokio runtime for subprocess execution and timed sleeps
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("protontrace-worker")
        .build()?;

    let result = runtime.block_on(run(cli, settings.capture));

    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    if let Err(ref err) = result {
        tracing::error!("Capture run failed: {:#}", err);
    }
    result
}

async fn run(cli: Cli, settings: CaptureSettings) -> Result<()> {
    let metrics = Metrics::new();
    let bitness = Bitness::from_x86_flag(cli.x86);

    let locator = if settings.library_vdf.is_empty() {
        LibraryLocator::from_home()?
    } else {
        LibraryLocator::new(Utf8PathBuf::from(&settings.library_vdf))
    };
    let libraries = locator.discover()?;
    let games = GameLocator::new(libraries);

    let game_dir = games.resolve_game_dir(&cli.appid)?;
    let install_dir = resolve_install_target(&game_dir, cli.install_dir.as_deref());

    let shims = ShimManager::new(
        absolute(&settings.apitrace_win32_dir)?,
        absolute(&settings.apitrace_win64_dir)?,
    );

    if cli.uninstall {
        shims.uninstall(&install_dir)?;
        return Ok(());
    }

    shims.install(&install_dir, bitness)?;

    let mut env =
        EnvironmentConfigurator::new(ProcessEnvironment, absolute(&settings.gfxrecon_dir)?);
    env.apply(bitness)?;

    let mut session = SessionController::new(
        SystemProcesses,
        PollingStrategy::new(Duration::from_secs(settings.poll_interval_secs)),
        Duration::from_secs(settings.launch_settle_secs),
        Duration::from_secs(settings.kill_settle_secs),
    );

    // Steam inherits its environment at startup, so it must be restarted
    // for the capture variables to reach the game.
    session.terminate_client().await?;
    metrics.record_client_kill();

    session.launch_client(&cli.appid).await?;
    session.wait_for_start().await?;
    session.wait_for_exit().await?;

    // Kill the client once more so it releases file locks in the install
    // directory before the shims are removed.
    session.terminate_client().await?;
    metrics.record_client_kill();

    shims.uninstall(&install_dir)?;

    let desktop_dir = games.resolve_wine_desktop_dir(&cli.appid)?;
    let collector = TraceCollector::new(
        absolute(&settings.trace_output_dir)?,
        settings.repack_program.clone(),
        settings.repack_brotli_quality,
    );
    let summary = collector.collect(&game_dir, &desktop_dir).await?;

    env.restore();

    metrics.record_traces_moved(summary.total_moved());
    metrics.record_traces_compressed(summary.compressed.len());
    metrics.record_repack_failures(summary.repack_failures);
    metrics.log_summary();

    Ok(())
}

/// Resolve a settings path against the working directory. The capture
/// environment and output paths must stay valid after Steam changes cwd.
fn absolute(path: &str) -> Result<Utf8PathBuf> {
    let abs = std::path::absolute(Utf8Path::new(path))
        .with_context(|| format!("Failed to absolutize '{}'", path))?;
    Utf8PathBuf::from_path_buf(abs)
        .map_err(|p| anyhow::anyhow!("Path is not UTF-8: {}", p.display()))
}
