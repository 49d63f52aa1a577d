//! Daemon-socket protocol: the TCP encapsulation between the bus-access
//! daemon and its clients.
//!
//! Each PDU is `command: u8`, `length: u16 LE` (total, header included) and a
//! command-specific payload. [`PduReassembler`] cuts a byte stream into PDUs,
//! [`decode_pdu`] turns one PDU into a [`DecodedPdu`], [`encode_pdu`] builds
//! an envelope. Decoding is pure and performs no logging.

pub mod command;
pub mod encode;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod reassembler;

pub use command::CommandId;
pub use encode::encode_pdu;
pub use error::DaemonError;
pub use parser::{DecodeWarning, DecodedPdu, NestedPayloadDecoder, PduFields, decode_at, decode_pdu};
pub use reader::PduReader;
pub use reassembler::{PduReassembler, Pdus};
