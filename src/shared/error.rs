use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow scripts to distinguish an inconsistent index from
/// an ordinary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// `verify` found symmetry violations in the index
    VerificationFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (manifest error, file I/O error, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::VerificationFailed => write!(f, "Verification Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Errors raised by the reference index.
///
/// Most of these never reach the user: the index recovers from them by
/// falling back to a stale state that the next full rebuild repairs.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Invalid asset id: {reason}")]
    InvalidAssetId { reason: String },

    #[error("Asset is not tracked by the index: {id}")]
    UnknownAsset { id: String },

    #[error("Cannot move onto an asset that is already tracked: {id}")]
    MoveTargetExists { id: String },

    #[error("Unresolved reference: {id} cannot be loaded from the asset store")]
    UnresolvedReference { id: String },

    #[error("Corrupt index snapshot: {path}\nDetails: {details}\n\n💡 Hint: The snapshot will be discarded and rebuilt on the next query")]
    CorruptSnapshot { path: PathBuf, details: String },

    #[error("Failed to write index snapshot: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory is writable")]
    SnapshotWriteError { path: PathBuf, details: String },

    #[error("Structural change while rebuilding; the result is incomplete after {passes} pass(es)")]
    ConcurrentInvalidation { passes: usize },

    #[error("Cannot apply incremental edit safely: {reason}")]
    UnsafeIncrementalEdit { reason: String },

    #[error("Failed to parse asset manifest: {path}\nDetails: {details}\n\n💡 Hint: Each [[asset]] entry needs a unique, non-empty 'id'")]
    ManifestParseError { path: PathBuf, details: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::VerificationFailed.as_i32(), 1);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::ApplicationError.as_i32(), 3);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(format!("{}", ExitCode::Success), "Success (0)");
        assert_eq!(
            format!("{}", ExitCode::VerificationFailed),
            "Verification Failed (1)"
        );
        assert_eq!(
            format!("{}", ExitCode::ApplicationError),
            "Application Error (3)"
        );
    }

    #[test]
    fn test_unknown_asset_display() {
        let error = IndexError::UnknownAsset {
            id: "Assets/missing.prefab".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("not tracked"));
        assert!(display.contains("Assets/missing.prefab"));
    }

    #[test]
    fn test_corrupt_snapshot_display() {
        let error = IndexError::CorruptSnapshot {
            path: PathBuf::from("/tmp/index.json"),
            details: "expected value at line 1".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Corrupt index snapshot"));
        assert!(display.contains("/tmp/index.json"));
        assert!(display.contains("expected value at line 1"));
        assert!(display.contains("💡 Hint:"));
    }

    #[test]
    fn test_concurrent_invalidation_display() {
        let error = IndexError::ConcurrentInvalidation { passes: 3 };
        assert!(format!("{}", error).contains("3 pass(es)"));
    }

    #[test]
    fn test_manifest_parse_error_display() {
        let error = IndexError::ManifestParseError {
            path: PathBuf::from("assets.toml"),
            details: "duplicate id".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("assets.toml"));
        assert!(display.contains("duplicate id"));
    }
}
