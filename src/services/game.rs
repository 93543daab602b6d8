use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::fs;
use thiserror::Error;

/// Subpath of a compatdata directory holding the Proton virtual desktop.
const WINE_DESKTOP_SUBPATH: &str = "pfx/drive_c/users/steamuser/Desktop";

/// Errors from resolving a Steam app to its on-disk locations
#[derive(Error, Debug)]
pub enum GameLocateError {
    #[error("Could not find Steam appmanifest: '{0}'")]
    ManifestNotFound(String),

    #[error("Could not find installdir in '{0}'")]
    InstallDirMissing(Utf8PathBuf),

    #[error("Could not find game '{0}' in any library")]
    InstallDirNotFound(String),

    #[error("Could not find compatdata for '{0}'")]
    CompatDataNotFound(String),

    #[error("Could not find wine desktop: '{0}'")]
    DesktopDirNotFound(Utf8PathBuf),
}

/// Resolves appids against a set of discovered Steam library roots.
///
/// Resolution is deterministic for a fixed filesystem state: the first
/// library (in discovery order) holding the relevant entry always wins.
#[derive(Debug)]
pub struct GameLocator {
    libraries: Vec<Utf8PathBuf>,

    /// Matches the quoted `"installdir" "<value>"` line of an appmanifest
    installdir_pattern: Regex,
}

impl GameLocator {
    pub fn new(libraries: Vec<Utf8PathBuf>) -> Self {
        Self {
            libraries,
            installdir_pattern: Regex::new(r#""installdir"\s+"([^"]+)""#)
                .expect("Invalid installdir regex"),
        }
    }

    pub fn libraries(&self) -> &[Utf8PathBuf] {
        &self.libraries
    }

    /// Resolve the game's install directory:
    /// `<library>/steamapps/common/<installdir>` for the first library whose
    /// appmanifest names the app, searched across all libraries.
    pub fn resolve_game_dir(&self, appid: &str) -> Result<Utf8PathBuf> {
        let manifest_name = format!("appmanifest_{}.acf", appid);

        let manifest_path = self
            .libraries
            .iter()
            .map(|lib| lib.join("steamapps").join(&manifest_name))
            .find(|path| path.exists())
            .ok_or(GameLocateError::ManifestNotFound(manifest_name))?;

        tracing::info!("Reading installdir from '{}'", manifest_path);
        let contents = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read appmanifest: {}", manifest_path))?;

        let install_dir_name = contents
            .lines()
            .find_map(|line| self.installdir_pattern.captures(line))
            .map(|caps| caps[1].to_string())
            .ok_or(GameLocateError::InstallDirMissing(manifest_path))?;

        // The manifest may live in one library while the files live in
        // another, so every common/ area is searched.
        let game_dir = self
            .libraries
            .iter()
            .map(|lib| lib.join("steamapps").join("common").join(&install_dir_name))
            .find(|path| path.exists())
            .ok_or(GameLocateError::InstallDirNotFound(install_dir_name))?;

        tracing::info!("Found game path: '{}'", game_dir);
        Ok(game_dir)
    }

    /// Resolve the per-app compatdata directory maintained by Proton.
    pub fn resolve_compat_data_dir(&self, appid: &str) -> Result<Utf8PathBuf> {
        self.libraries
            .iter()
            .map(|lib| lib.join("steamapps").join("compatdata").join(appid))
            .find(|path| path.exists())
            .ok_or_else(|| GameLocateError::CompatDataNotFound(appid.to_string()).into())
    }

    /// Resolve the Proton virtual desktop folder, where D3D interception
    /// traces are written.
    pub fn resolve_wine_desktop_dir(&self, appid: &str) -> Result<Utf8PathBuf> {
        let compat_dir = self.resolve_compat_data_dir(appid)?;
        let desktop = compat_dir.join(WINE_DESKTOP_SUBPATH);
        if !desktop.exists() {
            return Err(GameLocateError::DesktopDirNotFound(desktop).into());
        }
        Ok(desktop)
    }
}

/// Join helper for tests and the pipeline: a game install dir with an
/// optional relative subdirectory the shims should land in.
pub fn resolve_install_target(game_dir: &Utf8Path, subdir: Option<&Utf8Path>) -> Utf8PathBuf {
    match subdir {
        Some(rel) => game_dir.join(rel),
        None => game_dir.to_path_buf(),
    }
}
