//! Error types for the domain modules

use thiserror::Error;

/// Type alias for module results
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Domain rule violations raised while assembling modules
#[derive(Error, Debug)]
pub enum ModuleError {
    /// A cluster was requested before a network was attached
    #[error("a network must be attached before creating the cluster")]
    NetworkNotAttached,

    /// A cluster-scoped item was added before the cluster itself
    #[error("the cluster must be created before adding {item}")]
    ClusterNotCreated {
        /// What the caller tried to add
        item: String,
    },
}
