//! # reelcut-av
//!
//! FFmpeg/FFprobe integration for the reelcut editing core.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder for running
//!   external processes, with stderr streaming and cancellation.
//! - **Probing** ([`MediaProber`]) -- extract stream metadata by shelling out
//!   to ffprobe.
//! - **Filter graphs** ([`filter`]) -- a small AST for `filter_complex`
//!   graphs, serialized once at the argument-list boundary.
//! - **Command builders** ([`ops`]) -- pure functions mapping edit requests
//!   to ordered ffmpeg passes.
//! - **Output planning** ([`output`]) -- final path resolution, collision
//!   suffixing, and atomic replacement when input and output coincide.
//! - **Workspace management** ([`Workspace`]) -- temporary directory
//!   lifecycle for intermediate artifacts.

pub mod command;
pub mod filter;
pub mod ops;
pub mod output;
pub mod probe;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{CommandSpec, ToolCommand, ToolKind, ToolOutput};
pub use output::OutputPlan;
pub use probe::{MediaProbeResult, MediaProber};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::Workspace;
