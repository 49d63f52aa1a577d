use thiserror::Error;

use crate::protocols::ds485::Ds485Error;

/// Errors returned by daemon-socket decoding, encoding and reassembly.
///
/// A failure is local to one PDU; callers keep processing the stream.
///
/// # Examples
/// ```
/// use ds485_core::protocols::daemon::DaemonError;
///
/// let err = DaemonError::InvalidPduLength { length: 1 };
/// assert!(err.to_string().contains("invalid PDU length"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DaemonError {
    #[error("truncated packet: need {needed} bytes, got {actual}")]
    TruncatedPacket { needed: usize, actual: usize },
    #[error("invalid PDU length: {length} is shorter than the 3-byte header")]
    InvalidPduLength { length: u16 },
    #[error("payload too large: {size} bytes exceeds {max}")]
    PayloadTooLarge { size: usize, max: usize },
    #[error("container decode failed: {0}")]
    Container(#[from] Ds485Error),
}

impl DaemonError {
    /// True for truncation at either the envelope or the container level.
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            DaemonError::TruncatedPacket { .. }
                | DaemonError::Container(Ds485Error::TruncatedPacket { .. })
        )
    }
}
