//! Config-loading errors, following the teacher's kind-enum-plus-`thiserror`
//! convention (`engine/src/error.rs`).

use std::path::PathBuf;

/// Failure loading or parsing a DOTS process configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file was read but is not valid YAML for the
    /// expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}
