//! Input sources. All file and stream I/O of the crate lives here.

mod pcap;
mod stream;

pub use pcap::PcapFileSource;
pub use stream::{ChunkSource, DEFAULT_CHUNK_SIZE, ReaderSource};

use pcap_parser::Linktype;
use thiserror::Error;

/// One captured link-layer packet.
#[derive(Debug, Clone)]
pub struct PacketEvent {
    /// Capture time in seconds since the epoch, when known.
    pub ts: Option<f64>,
    pub linktype: Linktype,
    pub data: Vec<u8>,
}

/// Sequential packets from a capture.
pub trait PacketSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error: {0}")]
    Pcap(String),
}

impl From<pcap::error::PcapSourceError> for SourceError {
    fn from(value: pcap::error::PcapSourceError) -> Self {
        match value {
            pcap::error::PcapSourceError::Io(err) => SourceError::Io(err),
            pcap::error::PcapSourceError::Pcap {
                format,
                stage,
                message,
            } => SourceError::Pcap(format!("{format} {stage}: {message}")),
        }
    }
}
