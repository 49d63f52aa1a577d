//! PCAP/PCAPNG source implementation.
//!
//! A `PacketSource` backed by capture files: file I/O and block parsing live
//! here, the analysis layer only sees raw link-layer packets.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::PcapFileSource;
