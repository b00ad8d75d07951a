use crate::point::PointId;

/// Errors produced by registry lookup, install, and interception.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Registry lookup miss; indicates a build/registry mismatch or a point
    /// the running host is too old to offer. Fatal at install time.
    #[error("unknown extension point: {0}")]
    UnknownPoint(PointId),

    /// The host refused to register a handler. Fatal; aborts module load.
    #[error("host refused handler for {point}: {reason}")]
    InstallFailure { point: PointId, reason: String },

    /// A transform point resolved nothing via delegate or host lookup.
    /// Surfaced as the point's documented failure signal; downstream
    /// formatting cannot handle absence.
    #[error("no name found for index {index_id}")]
    NotFound { index_id: u32 },

    /// Failure raised by a delegate or a host default. Interceptors forward
    /// these unchanged and never originate them.
    #[error("{0}")]
    Host(String),
}

pub type Result<T> = std::result::Result<T, HookError>;
