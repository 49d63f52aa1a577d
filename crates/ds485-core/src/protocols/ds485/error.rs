use thiserror::Error;

/// Errors returned by dS485 bus-level decoding and encoding.
///
/// Note: this error type is re-exported from `protocols::ds485`.
///
/// # Examples
/// ```
/// use ds485_core::protocols::ds485::Ds485Error;
///
/// let err = Ds485Error::TruncatedPacket { needed: 44, actual: 10 };
/// assert!(err.to_string().contains("truncated packet"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ds485Error {
    #[error("truncated packet: need {needed} bytes, got {actual}")]
    TruncatedPacket { needed: usize, actual: usize },
    #[error("invalid payload length: {length} exceeds {max}")]
    InvalidLength { length: usize, max: usize },
    #[error("invalid identifier size: expected {expected} bytes, got {actual}")]
    InvalidIdSize { expected: usize, actual: usize },
    #[error("invalid identifier text: {text:?}")]
    InvalidIdText { text: String },
}
