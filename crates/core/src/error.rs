use thiserror::Error;

/// Failures a cursor reports through `Result` rather than a `bool` move
/// outcome.
///
/// Ordinary navigation misses (unknown id, exhausted siblings, depth limit)
/// are `false` results with the position unchanged; the variants here mark
/// caller-facing conditions that must not be masked as a quiet miss.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    /// The operation is not supported by this cursor kind.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// A cursor was asked to root itself at an identifier the source does
    /// not resolve.
    #[error("not the identifier of a content item within the source: {0}")]
    UnknownRoot(i64),
}
