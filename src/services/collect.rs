use crate::models::CollectSummary;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// Extension of gfxreconstruct capture files, written into the game dir.
pub const VULKAN_TRACE_EXT: &str = "gfxr";

/// Extension of apitrace interception files, written onto the wine desktop.
pub const D3D_TRACE_EXT: &str = "trace";

/// Errors from trace collection
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("Trace source directory does not exist: '{0}'")]
    SourceDirMissing(Utf8PathBuf),
}

/// Moves captured trace files into the output directory and recompresses
/// interception traces through the external `apitrace repack` utility.
#[derive(Debug)]
pub struct TraceCollector {
    output_dir: Utf8PathBuf,
    repack_program: String,
    brotli_quality: u32,
}

impl TraceCollector {
    pub fn new<P: AsRef<Utf8Path>>(
        output_dir: P,
        repack_program: String,
        brotli_quality: u32,
    ) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            repack_program,
            brotli_quality,
        }
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Collect traces from one finished session: `*.gfxr` directly inside
    /// the game directory and `*.trace` directly inside the wine desktop
    /// directory. Files are moved into the output directory preserving base
    /// names; each moved `.trace` additionally gets a
    /// `<stem>-compressed.trace` sibling from the repack step.
    ///
    /// Repack failures are surfaced as warnings and counted in the summary;
    /// the uncompressed file always remains.
    pub async fn collect(
        &self,
        game_dir: &Utf8Path,
        desktop_dir: &Utf8Path,
    ) -> Result<CollectSummary> {
        tracing::info!("Moving trace files");

        let vk_traces = list_by_extension(game_dir, VULKAN_TRACE_EXT)?;
        let d3d_traces = list_by_extension(desktop_dir, D3D_TRACE_EXT)?;

        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).with_context(|| {
                format!("Failed to create output directory: {}", self.output_dir)
            })?;
        }

        let mut summary = CollectSummary::default();

        for trace in vk_traces {
            let target = self.move_into_output(&trace)?;
            summary.vulkan_traces.push(target);
        }

        for trace in d3d_traces {
            let target = self.move_into_output(&trace)?;

            let stem = target.file_stem().unwrap_or("trace");
            let compressed = self.output_dir.join(format!("{}-compressed.trace", stem));
            tracing::info!("Compressing '{}' -> '{}'", target, compressed);
            match self.repack(&target, &compressed).await {
                Ok(()) => summary.compressed.push(compressed),
                Err(err) => {
                    tracing::warn!(
                        "Repack failed for '{}' (uncompressed trace kept): {:#}",
                        target,
                        err
                    );
                    summary.repack_failures += 1;
                }
            }

            summary.d3d_traces.push(target);
        }

        tracing::info!(
            "Collected {} trace file(s) into '{}' ({} compressed, {} repack failure(s))",
            summary.total_moved(),
            self.output_dir,
            summary.compressed.len(),
            summary.repack_failures
        );
        Ok(summary)
    }

    fn move_into_output(&self, source: &Utf8Path) -> Result<Utf8PathBuf> {
        let name = source
            .file_name()
            .with_context(|| format!("Trace path has no file name: {}", source))?;
        let target = self.output_dir.join(name);
        tracing::info!("Moving '{}' -> '{}'", source, target);
        move_file(source, &target)?;
        Ok(target)
    }

    async fn repack(&self, source: &Utf8Path, target: &Utf8Path) -> Result<()> {
        let status = tokio::process::Command::new(&self.repack_program)
            .arg("repack")
            .arg(format!("--brotli={}", self.brotli_quality))
            .arg(source)
            .arg(target)
            .status()
            .await
            .with_context(|| format!("Failed to run '{} repack'", self.repack_program))?;

        if !status.success() {
            anyhow::bail!("'{} repack' exited with {}", self.repack_program, status);
        }
        Ok(())
    }
}

/// Non-recursive listing of regular files with the given extension, sorted
/// by name so repeated runs process in a stable order.
fn list_by_extension(dir: &Utf8Path, extension: &str) -> Result<Vec<Utf8PathBuf>> {
    if !dir.exists() {
        return Err(CollectError::SourceDirMissing(dir.to_path_buf()).into());
    }

    let mut files = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("Failed to list '{}'", dir))?
    {
        let entry = entry.with_context(|| format!("Failed to list '{}'", dir))?;
        let path = entry.path();
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false)
            && path.extension() == Some(extension)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Move across filesystems: rename when possible, copy + delete otherwise.
fn move_file(source: &Utf8Path, target: &Utf8Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target)
        .with_context(|| format!("Failed to copy '{}' to '{}'", source, target))?;
    fs::remove_file(source).with_context(|| format!("Failed to remove '{}'", source))?;
    Ok(())
}
