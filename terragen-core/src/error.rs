//! Error types for the container core

use thiserror::Error;

/// Type alias for container results
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors that can occur during registration and resolution
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Resolution was requested for a type with no provider and no singleton
    #[error("type '{type_name}' is not registered in the container")]
    UnregisteredType {
        /// The type name that could not be resolved
        type_name: String,
    },

    /// A cycle was detected while computing the resolution order
    #[error("circular dependency detected: {}", .path.join(" -> "))]
    CircularDependency {
        /// The dependency chain from the entry node to the repeated node
        path: Vec<String>,
    },

    /// A provider failed while producing its module instance
    #[error("provider for '{type_name}' failed: {reason}")]
    ProviderFailed {
        /// Type name whose provider failed
        type_name: String,
        /// Description of the failure
        reason: String,
    },

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    ConfigError(String),
}
