use thiserror::Error;

/// A transit clock string that could not be understood.
///
/// Always recoverable: callers fall back to a display sentinel ("N/A")
/// instead of failing the render.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("clock string {value:?} has fewer than two fields")]
    TooFewFields { value: String },

    #[error("clock string {value:?} contains a non-numeric field")]
    NonNumeric { value: String },

    #[error("clock string {value:?} has minutes or seconds outside 0-59")]
    OutOfRange { value: String },
}

/// A failed call against one of the live-data endpoints.
///
/// Never fatal: the poller logs it and keeps the previous snapshot, and the
/// reconciler skips the affected pair.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}
