//! Recognition of the physical bus-frame header.
//!
//! Only the four header bytes are interpreted. Escaping, CRC and payload are
//! left to the bus driver.

use serde::Serialize;

use super::address::{BusAddress, Destination};
use super::error::Ds485Error;
use super::layout;
use super::reader::Ds485Reader;
use crate::protocols::names::bus_command_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Control,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Request,
    AckResponse,
    Busy,
    Event,
}

impl CommandType {
    fn from_source_byte(value: u8) -> Self {
        match value & layout::SOURCE_TYPE_MASK {
            0x00 => CommandType::Request,
            0x80 => CommandType::AckResponse,
            0x40 => CommandType::Busy,
            _ => CommandType::Event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusFrameHeader {
    pub destination: Destination,
    pub message_type: MessageType,
    pub broadcast: bool,
    pub source: BusAddress,
    pub command_type: CommandType,
    pub command: u8,
    pub command_name: String,
    pub length: u8,
}

/// Parse the header of a raw bus frame.
///
/// Returns `Ok(None)` when the buffer does not start with the start byte.
pub fn parse_bus_frame_header(frame: &[u8]) -> Result<Option<BusFrameHeader>, Ds485Error> {
    let reader = Ds485Reader::new(frame);
    let start = reader.read_u8(layout::FRAME_START_OFFSET)?;
    if start != layout::START_BYTE {
        return Ok(None);
    }
    reader.require_len(layout::FRAME_DATA_OFFSET)?;

    let dest = reader.read_u8(layout::FRAME_DEST_OFFSET)?;
    let src = reader.read_u8(layout::FRAME_SRC_OFFSET)?;
    let command_length = reader.read_u8(layout::FRAME_CL_OFFSET)?;

    let (destination, message_type, broadcast) = if dest == layout::BROADCAST_DESTINATION {
        (Destination::Broadcast, MessageType::Data, true)
    } else {
        let message_type = if dest & layout::DATACONTROL_MASK != 0 {
            MessageType::Data
        } else {
            MessageType::Control
        };
        (
            Destination::Address(BusAddress::from_u8(dest & layout::ADDRESS_MASK)),
            message_type,
            dest & layout::BROADCAST_MASK != 0,
        )
    };

    let command = (command_length & layout::COMMAND_MASK) >> 4;
    Ok(Some(BusFrameHeader {
        destination,
        message_type,
        broadcast,
        source: BusAddress::from_u8(src & layout::ADDRESS_MASK),
        command_type: CommandType::from_source_byte(src),
        command,
        command_name: bus_command_name(command).into_owned(),
        length: command_length & layout::LENGTH_MASK,
    }))
}
