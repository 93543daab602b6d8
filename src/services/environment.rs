use crate::models::Bitness;
use crate::ports::EnvironmentPort;
use crate::services::shim::SHIM_BINARIES;
use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Wine DLL-override directive consumed by Proton.
pub const DLL_OVERRIDE_VAR: &str = "WINEDLLOVERRIDES";

/// Vulkan loader search path for implicit/explicit layer manifests.
pub const LAYER_PATH_VAR: &str = "VK_LAYER_PATH";

/// Vulkan loader layer-activation list.
pub const LAYER_ACTIVATE_VAR: &str = "VK_INSTANCE_LAYERS";

/// The gfxreconstruct capture layer name.
pub const CAPTURE_LAYER_NAME: &str = "VK_LAYER_LUNARG_gfxreconstruct";

/// Errors from environment configuration
#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Could not find gfxrecon layer: '{0}'")]
    LayerNotFound(Utf8PathBuf),
}

/// Applies and restores the capture environment.
///
/// Three variables activate the shims: the Wine DLL-override list (load the
/// installed apitrace DLLs "native then builtin"), the Vulkan layer search
/// path for the bitness-correct gfxreconstruct build, and the layer
/// activation list. The prior value of each variable is recorded on first
/// write so [`restore`](Self::restore) can put the environment back.
#[derive(Debug)]
pub struct EnvironmentConfigurator<E: EnvironmentPort> {
    env: E,
    gfxrecon_root: Utf8PathBuf,
    saved: Vec<(String, Option<String>)>,
}

impl<E: EnvironmentPort> EnvironmentConfigurator<E> {
    pub fn new<P: AsRef<Utf8Path>>(env: E, gfxrecon_root: P) -> Self {
        Self {
            env,
            gfxrecon_root: gfxrecon_root.as_ref().to_path_buf(),
            saved: Vec::new(),
        }
    }

    /// The layer build output directory for the given bitness.
    pub fn layer_dir(&self, bitness: Bitness) -> Utf8PathBuf {
        self.gfxrecon_root
            .join(format!("build-{}", bitness.build_suffix()))
            .join("layer")
    }

    /// Set the three capture variables.
    ///
    /// Fails with [`EnvironmentError::LayerNotFound`] if the expected layer
    /// build directory does not exist; in that case nothing is modified.
    pub fn apply(&mut self, bitness: Bitness) -> Result<()> {
        let layer_dir = self.layer_dir(bitness);
        if !layer_dir.exists() {
            return Err(EnvironmentError::LayerNotFound(layer_dir).into());
        }

        tracing::info!("Setting capture environment ({})", bitness);
        let overrides = format!("{}=n,b", SHIM_BINARIES.join(","));
        self.set_var(DLL_OVERRIDE_VAR, Some(&overrides));
        self.set_var(LAYER_PATH_VAR, Some(layer_dir.as_str()));
        self.set_var(LAYER_ACTIVATE_VAR, Some(CAPTURE_LAYER_NAME));
        Ok(())
    }

    /// The single mutation primitive: `Some` sets/overwrites, `None`
    /// removes. Records the variable's prior value on its first write.
    pub fn set_var(&mut self, name: &str, value: Option<&str>) {
        if !self.saved.iter().any(|(saved_name, _)| saved_name == name) {
            self.saved.push((name.to_string(), self.env.get(name)));
        }
        match value {
            Some(val) => self.env.set(name, val),
            None => self.env.unset(name),
        }
    }

    /// Put every touched variable back to its pre-run value.
    pub fn restore(&mut self) {
        if self.saved.is_empty() {
            return;
        }
        tracing::info!("Restoring prior environment");
        for (name, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(val) => self.env.set(&name, &val),
                None => self.env.unset(&name),
            }
        }
    }
}
