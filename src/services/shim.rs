use crate::models::Bitness;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// The apitrace interception DLLs placed in front of the game's own
/// graphics libraries. Order matches the DLL-override directive.
pub const SHIM_BINARIES: [&str; 7] = [
    "d3d8.dll",
    "d3d9.dll",
    "d3d10.dll",
    "d3d10_1.dll",
    "d3d11.dll",
    "dxgi.dll",
    "dxgitrace.dll",
];

/// Subpath under an apitrace build root where the wrapper DLLs live.
const WRAPPERS_SUBPATH: &str = "lib/wrappers";

/// Errors from shim installation
#[derive(Error, Debug)]
pub enum ShimError {
    #[error("File already exists and is not a capture shim: '{0}'")]
    ForeignFileConflict(Utf8PathBuf),

    #[error("Missing shim source binary: '{0}'")]
    SourceMissing(Utf8PathBuf),
}

/// Installs and removes the capture shim DLLs in a game's install directory.
///
/// A file is only ever deleted if its content byte-matches one of the known
/// source variants. This is the guard against clobbering a game's own
/// `d3d9.dll` or a third-party wrapper someone else installed.
#[derive(Debug)]
pub struct ShimManager {
    source_win32: Utf8PathBuf,
    source_win64: Utf8PathBuf,
}

impl ShimManager {
    /// Build a manager over the two apitrace build roots
    /// (e.g. `apitrace-win32/` and `apitrace-win64/`).
    pub fn new<P: AsRef<Utf8Path>>(apitrace_win32_root: P, apitrace_win64_root: P) -> Self {
        Self {
            source_win32: apitrace_win32_root.as_ref().join(WRAPPERS_SUBPATH),
            source_win64: apitrace_win64_root.as_ref().join(WRAPPERS_SUBPATH),
        }
    }

    pub fn source_dir(&self, bitness: Bitness) -> &Utf8Path {
        match bitness {
            Bitness::Win32 => &self.source_win32,
            Bitness::Win64 => &self.source_win64,
        }
    }

    /// Whether the file at `path` is byte-identical to any known shim
    /// source variant (either bitness, any shim name).
    pub fn is_shim_binary(&self, path: &Utf8Path) -> Result<bool> {
        let target = fs::read(path).with_context(|| format!("Failed to read '{}'", path))?;

        for name in SHIM_BINARIES {
            for source_dir in [&self.source_win32, &self.source_win64] {
                let candidate = source_dir.join(name);
                if !candidate.exists() {
                    continue;
                }
                if file_matches(&candidate, &target)? {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Install the bitness-correct shim binaries into `install_dir`.
    ///
    /// Existing files are verified first: a byte-identical stale shim is
    /// replaced, anything else aborts with
    /// [`ShimError::ForeignFileConflict`] before any file is touched.
    pub fn install(&self, install_dir: &Utf8Path, bitness: Bitness) -> Result<()> {
        let source_dir = self.source_dir(bitness);
        tracing::info!("Installing capture shims ({})", bitness);
        tracing::info!("Shim source dir: '{}'", source_dir);
        tracing::info!("Shim install dir: '{}'", install_dir);

        // Verify everything before mutating anything, so a foreign file
        // conflict leaves the install directory untouched.
        for name in SHIM_BINARIES {
            let source_path = source_dir.join(name);
            if !source_path.exists() {
                return Err(ShimError::SourceMissing(source_path).into());
            }

            let dest_path = install_dir.join(name);
            if dest_path.exists() && !self.is_shim_binary(&dest_path)? {
                return Err(ShimError::ForeignFileConflict(dest_path).into());
            }
        }

        for name in SHIM_BINARIES {
            let source_path = source_dir.join(name);
            let dest_path = install_dir.join(name);

            if dest_path.exists() {
                tracing::info!("Removing stale shim binary: '{}'", dest_path);
                fs::remove_file(&dest_path)
                    .with_context(|| format!("Failed to remove '{}'", dest_path))?;
            }

            tracing::info!("Copying shim binary: '{}' -> '{}'", source_path, dest_path);
            fs::copy(&source_path, &dest_path)
                .with_context(|| format!("Failed to copy '{}' to '{}'", source_path, dest_path))?;
        }

        Ok(())
    }

    /// Remove every identity-verified shim binary from `install_dir`.
    ///
    /// Missing or foreign same-named files are skipped silently; uninstall
    /// must be safe to re-run as the documented manual recovery.
    pub fn uninstall(&self, install_dir: &Utf8Path) -> Result<()> {
        tracing::info!("Uninstalling capture shims from '{}'", install_dir);

        for name in SHIM_BINARIES {
            let install_path = install_dir.join(name);
            if !install_path.exists() {
                continue;
            }

            if self.is_shim_binary(&install_path)? {
                tracing::info!("Removing shim binary: '{}'", install_path);
                fs::remove_file(&install_path)
                    .with_context(|| format!("Failed to remove '{}'", install_path))?;
            } else {
                tracing::debug!("Leaving foreign file in place: '{}'", install_path);
            }
        }

        Ok(())
    }
}

/// Byte-compare a file on disk against an already-read buffer.
fn file_matches(path: &Utf8Path, target: &[u8]) -> Result<bool> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to stat '{}'", path))?;
    if metadata.len() != target.len() as u64 {
        return Ok(false);
    }
    let contents = fs::read(path).with_context(|| format!("Failed to read '{}'", path))?;
    Ok(contents == target)
}
