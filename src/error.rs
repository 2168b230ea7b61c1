//! Error types.
//!
//! Two families, both fatal to the call that raised them: configuration errors
//! are raised while constructing or configuring a component and always before
//! any binding is registered; invariant errors mean the caller used a component
//! in a state that does not allow the operation.

/// Top-level error returned by every fallible operation in the crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewportError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("no target element was provided")]
    MissingElement,
    #[error("target element has no parent element")]
    MissingParent,
    #[error("a sync group needs at least one element")]
    EmptyGroup,
    #[error("unknown configuration option: {0}")]
    UnknownOption(String),
    #[error("invalid value for option {key}: {reason}")]
    InvalidOptionValue { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantError {
    #[error("component has been destroyed")]
    Destroyed,
    #[error("drawing surface already exists")]
    SurfaceAlreadyAttached,
    #[error("scratch element is missing for the active mode")]
    MissingScratch,
    #[error("surface has no area to normalize against")]
    EmptySurface,
    #[error("zoom level must be positive and finite, got {0}")]
    InvalidZoomLevel(f64),
    #[error("child index {index} out of range for group of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
