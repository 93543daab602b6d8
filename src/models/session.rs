use camino::Utf8PathBuf;

/// Target binary bitness. Selects which shim source variant is installed
/// and which capture-layer build directory is advertised to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bitness {
    Win32,
    Win64,
}

impl Bitness {
    pub fn from_x86_flag(x86: bool) -> Self {
        if x86 { Self::Win32 } else { Self::Win64 }
    }

    /// Suffix used by the gfxreconstruct build directories (`build-32`, `build-64`).
    pub fn build_suffix(&self) -> &'static str {
        match self {
            Self::Win32 => "32",
            Self::Win64 => "64",
        }
    }
}

impl std::fmt::Display for Bitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win32 => write!(f, "32-bit"),
            Self::Win64 => write!(f, "64-bit"),
        }
    }
}

/// Lifecycle phases of a capture session.
///
/// Transitions are strictly sequential:
/// `Idle -> Launching -> AwaitingStart -> Running -> AwaitingExit -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Launching,
    AwaitingStart,
    Running,
    AwaitingExit,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Launching => "launching",
            Self::AwaitingStart => "awaiting-start",
            Self::Running => "running",
            Self::AwaitingExit => "awaiting-exit",
        };
        write!(f, "{}", name)
    }
}

/// What a collection pass produced.
#[derive(Debug, Clone, Default)]
pub struct CollectSummary {
    /// Vulkan capture files moved out of the game directory.
    pub vulkan_traces: Vec<Utf8PathBuf>,

    /// D3D interception traces moved out of the wine desktop directory.
    pub d3d_traces: Vec<Utf8PathBuf>,

    /// Compressed siblings successfully produced by the repack step.
    pub compressed: Vec<Utf8PathBuf>,

    /// Repack invocations that exited non-zero or failed to run.
    pub repack_failures: usize,
}

impl CollectSummary {
    pub fn total_moved(&self) -> usize {
        self.vulkan_traces.len() + self.d3d_traces.len()
    }
}
