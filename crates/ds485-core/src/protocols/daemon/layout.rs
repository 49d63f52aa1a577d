//! Daemon-socket envelope layout: command byte, 16-bit LE total length,
//! command-specific payload.

use std::ops::Range;

use crate::protocols::ds485::layout as ds485;

pub const HEADER_LEN: usize = 3;
pub const COMMAND_OFFSET: usize = 0;
pub const LENGTH_RANGE: Range<usize> = 1..3;
pub const PAYLOAD_OFFSET: usize = HEADER_LEN;
pub const MAX_PDU_LEN: usize = u16::MAX as usize;

pub const API_REVISION: u8 = 1;

/// TCP ports the daemon protocol is conventionally served on.
pub const DEFAULT_PORTS: [u16; 5] = [8440, 8441, 8442, 8445, 8945];

pub const CMD_SYNC: u8 = 0x00;
pub const CMD_API_REVISION: u8 = 0x01;
pub const CMD_PING: u8 = 0x02;
pub const CMD_TX_PACKET: u8 = 0x03;
pub const CMD_RX_PACKET: u8 = 0x04;
pub const CMD_DEVICE_PACKET: u8 = 0x05;
pub const CMD_LONG_TX_PACKET: u8 = 0x06;
pub const CMD_LONG_RX_PACKET: u8 = 0x07;
pub const CMD_LONG_DEVICE_PACKET: u8 = 0x08;
pub const CMD_REGISTER: u8 = 0x10;
pub const CMD_UNREGISTER: u8 = 0x11;
pub const CMD_PACKETFILTER: u8 = 0x12;
pub const CMD_RAWMODE: u8 = 0x13;
pub const CMD_QUERY_DEVICES: u8 = 0x20;
pub const CMD_QUERY_DSUID: u8 = 0x21;
pub const CMD_QUERY_ADDRESS: u8 = 0x22;
pub const CMD_QUERY_BUSSTATE: u8 = 0x23;
pub const CMD_BUS_CHANGE: u8 = 0x24;
pub const CMD_BUS_STATE: u8 = 0x25;
pub const CMD_RESTART_BUS: u8 = 0x26;

/// Single-byte responses (revision, filter flags, bus state, status).
pub const RESPONSE_VALUE_OFFSET: usize = 0;

/// Payload offset of the byte following a bus event's container header:
/// the container data offset, i.e. PDU offset `data + 3`.
pub const BUS_EVENT_VALUE_OFFSET: usize = ds485::DATA_OFFSET;

/// Inverted logic: set means the dSM left the bus, clear means it joined.
pub const DSM_CHANGE_LEAVE: u8 = 0x01;

/// Packet filter bit: deliver all responses, not only replies to own requests.
pub const FILTER_ALL_RESPONSES: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_event_value_sits_after_container_header() {
        assert_eq!(PAYLOAD_OFFSET + BUS_EVENT_VALUE_OFFSET, 47);
    }
}
