use thiserror::Error;

/// Errors returned by session and engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed call shape (bad source, empty data, unsupported combination).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("model already loaded")]
    AlreadyLoaded,

    #[error("session is not initialized")]
    NotInitialized,

    #[error("session already disposed")]
    AlreadyDisposed,

    /// Value and declared tensor types disagree, or a value is not in the
    /// memory space the conversion requires.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Element count disagrees with the declared shape.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// Negative or overflowing dimensions.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// Bad preferred-output-location configuration.
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Native engine failure; carries the engine's message verbatim.
    #[error("engine: {0}")]
    Engine(String),
}
