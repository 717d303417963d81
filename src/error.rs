//! Error taxonomy shared by surface handles and the compositor client.

/// Errors returned by surface handle operations and the underlying
/// compositor connection.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// A caller-supplied object was null, foreign or otherwise unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The operation requires a live native buffer, but the handle is
    /// unbound or has already been released.
    #[error("surface handle is not bound to a native buffer")]
    NotBound,

    /// The compositor could not allocate or operate on a buffer.
    ///
    /// This is propagated verbatim from the compositor connection and is
    /// never retried internally.
    #[error("compositor is out of resources")]
    ResourceExhausted,

    /// The operation has been removed and is intentionally unsupported.
    #[error("operation is no longer supported")]
    Unsupported,

    /// The serialized form of a surface could not be decoded.
    #[error("malformed serialized surface: {0}")]
    Decode(&'static str),
}
