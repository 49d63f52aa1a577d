//! dS485 bus-level structures.
//!
//! Identifiers, bus addressing, bus-frame header recognition and the two
//! application payload shapes (Container and LongPacket). Offsets live in
//! `layout`, bounds-checked little-endian access in `reader`; the remaining
//! modules decode domain values without indexing raw bytes themselves.
//!
//! Decoding never trusts the declared length: reading past it or past the
//! supplied buffer yields `Ds485Error::TruncatedPacket`.

pub mod address;
pub mod container;
pub mod error;
pub mod frame;
pub mod ids;
pub mod layout;
pub mod reader;

pub use address::{BusAddress, Destination};
pub use container::{
    Container, ContainerHeader, LongPacket, LongPacketHeader, parse_container, parse_long_packet,
};
pub use error::Ds485Error;
pub use frame::{BusFrameHeader, CommandType, MessageType, parse_bus_frame_header};
pub use ids::{Dsid, Dsuid};

pub use crate::protocols::names::{BusState, ContainerFlags, ContainerType};
