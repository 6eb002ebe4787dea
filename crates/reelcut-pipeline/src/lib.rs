//! # reelcut-pipeline
//!
//! Orchestration of edit operations.
//!
//! This crate provides:
//!
//! - **[`OperationRequest`]** -- the typed request surface consumed from the
//!   UI layer, one variant per operation.
//! - **[`ProgressSender`] / [`ProgressEvent`]** -- the observer channel
//!   carrying pass boundaries and raw tool diagnostic lines.
//! - **[`Orchestrator`]** -- the per-operation coordinator sequencing
//!   validate, probe, build, run, and finalize, with strict cleanup of
//!   intermediate artifacts on every exit path.

pub mod context;
pub mod orchestrator;
pub mod request;

// Re-export key types at the crate root.
pub use context::{ProgressEvent, ProgressSender, RunOptions};
pub use orchestrator::Orchestrator;
pub use request::OperationRequest;
pub use reelcut_av::ops::{InsertMode, TransitionSpec};
