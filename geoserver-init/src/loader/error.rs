//! Configuration errors.

use thiserror::Error;

/// Invalid configuration input.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    /// Port is not a `u16`.
    #[error("invalid {key} value '{value}'")]
    InvalidPort {
        /// Variable name.
        key: &'static str,
        /// Raw value as given.
        value: String,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },
    /// Scheme other than http or https.
    #[error("invalid {key} value '{value}': expected http or https")]
    InvalidProtocol {
        /// Variable name.
        key: &'static str,
        /// Lowercased value as given.
        value: String,
    },
    /// The dotenv file could not be read.
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
