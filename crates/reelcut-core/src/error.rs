//! Unified error type for the reelcut workspace.
//!
//! All crates funnel their failures into [`Error`]. The variants mirror the
//! stages of an edit operation: parameter validation, media probing,
//! launching the external tool, the tool run itself, and final output
//! placement.

/// Unified error type covering all failure modes in reelcut.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request parameters failed validation. Detected before any subprocess
    /// is spawned.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Media probing failed or produced unusable output.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The external executable could not be launched at all (not found,
    /// permission denied).
    #[error("Spawn error [{tool}]: {message}")]
    Spawn {
        /// Name of the tool that could not be launched.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The external tool ran but exited with a non-zero status.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Captured diagnostic text, surfaced verbatim.
        message: String,
    },

    /// The transcode succeeded but the staged output could not be moved into
    /// its final place.
    #[error("Finalize error: {0}")]
    Finalize(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Convenience constructor for [`Error::Probe`].
    pub fn probe(message: impl Into<String>) -> Self {
        Error::Probe(message.into())
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Finalize`].
    pub fn finalize(message: impl Into<String>) -> Self {
        Error::Finalize(message.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::validation("start must be non-negative");
        assert_eq!(
            err.to_string(),
            "Validation error: start must be non-negative"
        );
    }

    #[test]
    fn probe_display() {
        let err = Error::probe("missing duration");
        assert_eq!(err.to_string(), "Probe error: missing duration");
    }

    #[test]
    fn spawn_display() {
        let err = Error::spawn("ffmpeg", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Spawn error [ffmpeg]: No such file or directory"
        );
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
    }

    #[test]
    fn finalize_display() {
        let err = Error::finalize("rename failed");
        assert_eq!(err.to_string(), "Finalize error: rename failed");
    }

    #[test]
    fn cancelled_display() {
        assert_eq!(Error::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn internal_display() {
        let err = Error::Internal("unexpected state".into());
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::Internal("boom".into()))
        }
        assert!(err_fn().is_err());
    }
}
