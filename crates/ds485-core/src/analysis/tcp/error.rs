use thiserror::Error;

/// Errors returned by TCP segment slicing.
///
/// Note: this error type lives in an internal module; the example is
/// illustrative and not compiled as a public doctest.
///
/// # Examples
/// ```text
/// use ds485_core::analysis::tcp::error::TcpError;
///
/// let err = TcpError::InvalidDataOffset { offset: 16, actual: 20 };
/// assert!(err.to_string().contains("data offset"));
/// ```
#[derive(Debug, Error)]
pub enum TcpError {
    #[error("packet slice error: {0}")]
    Slice(String),
    #[error("missing network layer in packet")]
    MissingNetworkLayer,
    #[error("missing IP payload in packet")]
    MissingIpPayload,
    #[error("segment too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid TCP data offset {offset} for a {actual}-byte segment")]
    InvalidDataOffset { offset: usize, actual: usize },
}
