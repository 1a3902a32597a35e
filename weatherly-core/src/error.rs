use thiserror::Error;

/// Ways a lookup can come up empty.
///
/// These are logged where they happen and then collapsed into "no usable
/// data"; callers above the resolver and search controller only ever see an
/// `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("network or HTTP failure: {0}")]
    NetworkOrHttp(String),

    #[error("provider returned no usable data")]
    EmptyResult,
}
