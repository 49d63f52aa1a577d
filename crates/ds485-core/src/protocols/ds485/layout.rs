//! Byte offsets and sizes of the dS485 bus-level structures.
//!
//! All multi-byte integers are little-endian and every structure is packed.

use std::ops::Range;

pub const DSUID_SIZE: usize = 17;
pub const DSID_SIZE: usize = 12;

// Container (short message), 171 bytes on the wire.
pub const DESTINATION_ID_RANGE: Range<usize> = 0..17;
pub const SOURCE_ID_RANGE: Range<usize> = 17..34;
pub const CONTAINER_TYPE_RANGE: Range<usize> = 34..38;
pub const CONTAINER_FLAGS_RANGE: Range<usize> = 38..42;
pub const LENGTH_OFFSET: usize = 42;
pub const TRANSACTION_ID_OFFSET: usize = 43;
pub const DATA_OFFSET: usize = 44;
pub const MAX_PAYLOAD_SIZE: usize = 127;
/// Transaction id plus data.
pub const RAW_PAYLOAD_SIZE: usize = MAX_PAYLOAD_SIZE + 1;
pub const CONTAINER_SIZE: usize = TRANSACTION_ID_OFFSET + RAW_PAYLOAD_SIZE;

// LongPacket (netlib message).
pub const LONG_DESTINATION_ID_RANGE: Range<usize> = 0..17;
pub const LONG_SOURCE_ID_RANGE: Range<usize> = 17..34;
pub const LONG_ALIGNMENT_PAD_RANGE: Range<usize> = 34..36;
pub const LONG_CONTAINER_TYPE_RANGE: Range<usize> = 36..40;
pub const LONG_LENGTH_RANGE: Range<usize> = 40..42;
pub const LONG_TRANSACTION_ID_OFFSET: usize = 42;
pub const LONG_DATA_OFFSET: usize = 43;
pub const LONG_RAW_PAYLOAD_SIZE: usize = 8600;
pub const LONG_MAX_PAYLOAD_SIZE: usize = LONG_RAW_PAYLOAD_SIZE - 1;
pub const LONG_PACKET_SIZE: usize = LONG_TRANSACTION_ID_OFFSET + LONG_RAW_PAYLOAD_SIZE;

// Physical bus frame.
pub const START_BYTE: u8 = 0xFD;
pub const ESCAPE_BYTE: u8 = 0xFC;
pub const RESERVED_BYTE: u8 = 0xFE;
pub const BROADCAST_DESTINATION: u8 = 0xFF;

pub const FRAME_START_OFFSET: usize = 0;
pub const FRAME_DEST_OFFSET: usize = 1;
pub const FRAME_SRC_OFFSET: usize = 2;
pub const FRAME_CL_OFFSET: usize = 3;
pub const FRAME_DATA_OFFSET: usize = 4;

/// Start + destination + source + command/length + crc16.
pub const HEADER_CRC_SIZE: usize = 6;
/// Transaction id + message id + modifier/error code.
pub const MIN_DATA_PAYLOAD_SIZE: usize = 3;
pub const SHORT_PAYLOAD_SIZE: usize = 15;
pub const LONG_PAYLOAD_SIZE: usize = 128;
pub const SHORT_MESSAGE_SIZE: usize = SHORT_PAYLOAD_SIZE + HEADER_CRC_SIZE;
pub const LONG_MESSAGE_SIZE: usize = LONG_PAYLOAD_SIZE + HEADER_CRC_SIZE;

pub const COMMAND_MASK: u8 = 0xF0;
pub const LENGTH_MASK: u8 = 0x0F;
pub const DATACONTROL_MASK: u8 = 0x80;
pub const BROADCAST_MASK: u8 = 0x40;
pub const SOURCE_TYPE_MASK: u8 = 0xC0;
pub const ADDRESS_MASK: u8 = 0x3F;

// Bus addresses.
pub const MASTER_ADDRESS: u8 = 0;
pub const MIN_SLAVE_ADDRESS: u8 = 1;
pub const MAX_SLAVE_ADDRESS: u8 = 62;
pub const INTERMEDIATE_ADDRESS: u8 = 63;
pub const INVALID_ADDRESS: u8 = 255;
