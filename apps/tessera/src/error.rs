//! # CLI Errors
//!
//! Everything that can stop a command before or while a script is replayed.

use std::path::PathBuf;
use tessera_core::TesseraError;
use thiserror::Error;

/// Errors raised by the `tessera` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// The script file could not be read.
    #[error("Cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script is larger than the replay limit.
    #[error("File size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// The script is not valid TOML or does not match the script layout.
    #[error("Invalid script: {0}")]
    Parse(#[from] toml::de::Error),

    /// The script parsed but describes something impossible.
    #[error("Invalid script: {0}")]
    Script(String),

    /// The extension set failed to resolve.
    #[error("Configuration error: {0}")]
    Engine(#[from] TesseraError),

    /// JSON output could not be produced.
    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::{SlotId, SlotKind, SlotRef};

    #[test]
    fn engine_errors_keep_their_message() {
        let facet = SlotRef::new(SlotId(3), SlotKind::Facet);
        let err = CliError::from(TesseraError::StaticDerivation { facet });
        assert_eq!(
            err.to_string(),
            "Configuration error: Can't derive static facet facet#3"
        );
    }

    #[test]
    fn io_errors_name_the_path() {
        let err = CliError::io(
            "missing.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().starts_with("Cannot read 'missing.toml'"));
    }
}
