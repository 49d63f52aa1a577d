use thiserror::Error;

/// Errors raised while reading a capture file.
#[derive(Debug, Error)]
pub enum PcapSourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error ({format} {stage}): {message}")]
    Pcap {
        /// `pcap` or `pcapng`.
        format: &'static str,
        /// `init`, `next` or `refill`.
        stage: &'static str,
        message: String,
    },
}

impl PcapSourceError {
    pub(crate) fn parse(format: &'static str, stage: &'static str, err: impl ToString) -> Self {
        PcapSourceError::Pcap {
            format,
            stage,
            message: err.to_string(),
        }
    }
}
