//! Pseudoterminal (PTY) Management
//!
//! Process spawning inside a pseudoterminal, async I/O streams and the
//! output surfaces embedded executions render into.

pub mod process;
pub mod streams;
pub mod surface;

// Re-exports for convenience
pub use process::{
    spawn_pty_process, NativePtyBackend, ProcessWaiter, PtyBackend, PtyChildWaiter, SpawnConfig,
    SpawnedPty,
};
pub use streams::{PtyInput, PtyStreams};
pub use surface::{
    OutputPump, OutputSurface, PumpHandle, ScrollbackFactory, ScrollbackSurface, SurfaceFactory,
};
