//! Services module - Core logic of the capture pipeline.
//!
//! Everything here is **framework-agnostic**: no CLI parsing, no global
//! state. Services either operate on plain paths or are generic over the
//! ports in [`crate::ports`], which keeps them testable against tempdirs,
//! fake process tables, and mock environments.
//!
//! # Components
//!
//! - [`LibraryLocator`]: discovers Steam library roots from
//!   `libraryfolders.vdf`
//! - [`GameLocator`]: resolves an appid to its install directory, compatdata
//!   directory, and the Proton virtual desktop folder
//! - [`ShimManager`]: installs/uninstalls the apitrace DLL shims with
//!   byte-identity verification so a game's own same-named file is never
//!   deleted
//! - [`EnvironmentConfigurator`]: applies the DLL-override and Vulkan-layer
//!   environment variables and restores the prior environment afterward
//! - [`SessionController`]: launches Steam, polls the process table for
//!   session start/exit, and force-kills the client between state changes
//! - [`TraceCollector`]: moves captured trace files to the output directory
//!   and recompresses interception traces via `apitrace repack`
//!
//! # Pipeline
//!
//! ```ignore
//! shims.install(&install_dir, bitness)?;
//! env.apply(bitness)?;
//! session.terminate_client().await?;   // restart Steam with the new env
//! session.launch_client(&appid).await?;
//! session.wait_for_start().await?;
//! session.wait_for_exit().await?;
//! session.terminate_client().await?;   // release file locks
//! shims.uninstall(&install_dir)?;
//! collector.collect(&game_dir, &desktop_dir).await?;
//! env.restore();
//! ```

pub mod collect;
pub mod environment;
pub mod game;
pub mod library;
pub mod session;
pub mod shim;

pub use collect::{CollectError, TraceCollector};
pub use environment::{EnvironmentConfigurator, EnvironmentError};
pub use game::{GameLocateError, GameLocator};
pub use library::{LibraryError, LibraryLocator};
pub use session::{SessionController, SessionError};
pub use shim::{SHIM_BINARIES, ShimError, ShimManager};
