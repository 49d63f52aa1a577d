use std::borrow::Cow;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::layout;
use crate::protocols::names::command_name;

/// Daemon command identifier. Unassigned bytes are carried in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Sync,
    ApiRevision,
    Ping,
    TxPacket,
    RxPacket,
    DevicePacket,
    LongTxPacket,
    LongRxPacket,
    LongDevicePacket,
    Register,
    Unregister,
    PacketFilter,
    RawMode,
    QueryDevices,
    QueryDsuid,
    QueryAddress,
    QueryBusState,
    BusChange,
    BusState,
    RestartBus,
    Unknown(u8),
}

impl CommandId {
    pub fn from_u8(value: u8) -> Self {
        match value {
            layout::CMD_SYNC => CommandId::Sync,
            layout::CMD_API_REVISION => CommandId::ApiRevision,
            layout::CMD_PING => CommandId::Ping,
            layout::CMD_TX_PACKET => CommandId::TxPacket,
            layout::CMD_RX_PACKET => CommandId::RxPacket,
            layout::CMD_DEVICE_PACKET => CommandId::DevicePacket,
            layout::CMD_LONG_TX_PACKET => CommandId::LongTxPacket,
            layout::CMD_LONG_RX_PACKET => CommandId::LongRxPacket,
            layout::CMD_LONG_DEVICE_PACKET => CommandId::LongDevicePacket,
            layout::CMD_REGISTER => CommandId::Register,
            layout::CMD_UNREGISTER => CommandId::Unregister,
            layout::CMD_PACKETFILTER => CommandId::PacketFilter,
            layout::CMD_RAWMODE => CommandId::RawMode,
            layout::CMD_QUERY_DEVICES => CommandId::QueryDevices,
            layout::CMD_QUERY_DSUID => CommandId::QueryDsuid,
            layout::CMD_QUERY_ADDRESS => CommandId::QueryAddress,
            layout::CMD_QUERY_BUSSTATE => CommandId::QueryBusState,
            layout::CMD_BUS_CHANGE => CommandId::BusChange,
            layout::CMD_BUS_STATE => CommandId::BusState,
            layout::CMD_RESTART_BUS => CommandId::RestartBus,
            other => CommandId::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            CommandId::Sync => layout::CMD_SYNC,
            CommandId::ApiRevision => layout::CMD_API_REVISION,
            CommandId::Ping => layout::CMD_PING,
            CommandId::TxPacket => layout::CMD_TX_PACKET,
            CommandId::RxPacket => layout::CMD_RX_PACKET,
            CommandId::DevicePacket => layout::CMD_DEVICE_PACKET,
            CommandId::LongTxPacket => layout::CMD_LONG_TX_PACKET,
            CommandId::LongRxPacket => layout::CMD_LONG_RX_PACKET,
            CommandId::LongDevicePacket => layout::CMD_LONG_DEVICE_PACKET,
            CommandId::Register => layout::CMD_REGISTER,
            CommandId::Unregister => layout::CMD_UNREGISTER,
            CommandId::PacketFilter => layout::CMD_PACKETFILTER,
            CommandId::RawMode => layout::CMD_RAWMODE,
            CommandId::QueryDevices => layout::CMD_QUERY_DEVICES,
            CommandId::QueryDsuid => layout::CMD_QUERY_DSUID,
            CommandId::QueryAddress => layout::CMD_QUERY_ADDRESS,
            CommandId::QueryBusState => layout::CMD_QUERY_BUSSTATE,
            CommandId::BusChange => layout::CMD_BUS_CHANGE,
            CommandId::BusState => layout::CMD_BUS_STATE,
            CommandId::RestartBus => layout::CMD_RESTART_BUS,
            CommandId::Unknown(value) => value,
        }
    }

    /// Recognized but no longer interpreted.
    pub fn is_deprecated(self) -> bool {
        matches!(
            self,
            CommandId::Sync
                | CommandId::DevicePacket
                | CommandId::LongDevicePacket
                | CommandId::Register
                | CommandId::Unregister
                | CommandId::RawMode
                | CommandId::QueryAddress
        )
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, CommandId::Unknown(_))
    }

    pub fn name(self) -> Cow<'static, str> {
        command_name(self.as_u8())
    }
}

impl From<u8> for CommandId {
    fn from(value: u8) -> Self {
        CommandId::from_u8(value)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for CommandId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CommandId", 2)?;
        state.serialize_field("value", &self.as_u8())?;
        state.serialize_field("name", &self.name())?;
        state.end()
    }
}
