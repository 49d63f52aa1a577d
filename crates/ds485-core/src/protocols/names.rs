//! Symbolic tables for numeric enumerants.
//!
//! Decoding always works on the numeric value; the tables here only provide
//! names for display. Every lookup is total: values without an entry render
//! as `unknown(0xNN)`.

use std::borrow::Cow;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

pub type NameTable = &'static [(u32, &'static str)];

pub const COMMAND_NAMES: NameTable = &[
    (0x00, "sync"),
    (0x01, "revision"),
    (0x02, "ping"),
    (0x03, "TX packet"),
    (0x04, "RX packet"),
    (0x05, "Device packet"),
    (0x06, "TX long packet"),
    (0x07, "RX long packet"),
    (0x08, "Long device packet"),
    (0x10, "register"),
    (0x11, "unregister"),
    (0x12, "packet filter"),
    (0x13, "RAW mode"),
    (0x20, "query devices"),
    (0x21, "query DSID"),
    (0x22, "query address"),
    (0x23, "query bus state"),
    (0x24, "bus change event"),
    (0x25, "bus state event"),
    (0x26, "restart bus"),
];

pub const BUS_STATE_NAMES: NameTable = &[
    (1, "isolated"),
    (2, "join"),
    (3, "connected"),
    (4, "active"),
    (5, "disconnected"),
];

pub const CONTAINER_TYPE_NAMES: NameTable = &[(1, "request"), (2, "response"), (3, "event")];

pub const CONTAINER_FLAG_NAMES: NameTable = &[(1, "none"), (2, "broadcast")];

pub const BUS_COMMAND_NAMES: NameTable = &[
    (0, "token"),
    (1, "startup"),
    (2, "join"),
    (3, "get address"),
    (4, "set address"),
    (5, "set successor address"),
    (6, "response"),
    (7, "reserved"),
    (8, "restart bus"),
];

/// Look up `value` in `table`, falling back to `unknown(0xNN)`.
///
/// # Examples
/// ```
/// use ds485_core::protocols::names::{BUS_STATE_NAMES, name_of};
///
/// assert_eq!(name_of(BUS_STATE_NAMES, 3), "connected");
/// assert_eq!(name_of(BUS_STATE_NAMES, 9), "unknown(0x09)");
/// ```
pub fn name_of(table: NameTable, value: u32) -> Cow<'static, str> {
    table
        .iter()
        .find(|(raw, _)| *raw == value)
        .map(|(_, name)| Cow::Borrowed(*name))
        .unwrap_or_else(|| Cow::Owned(format!("unknown(0x{:02x})", value)))
}

pub fn command_name(value: u8) -> Cow<'static, str> {
    name_of(COMMAND_NAMES, value.into())
}

pub fn bus_state_name(value: u8) -> Cow<'static, str> {
    name_of(BUS_STATE_NAMES, value.into())
}

pub fn container_type_name(value: u32) -> Cow<'static, str> {
    name_of(CONTAINER_TYPE_NAMES, value)
}

pub fn container_flags_name(value: u32) -> Cow<'static, str> {
    name_of(CONTAINER_FLAG_NAMES, value)
}

pub fn bus_command_name(value: u8) -> Cow<'static, str> {
    name_of(BUS_COMMAND_NAMES, value.into())
}

/// A closed enumeration backed by a name table.
pub trait Symbolic: Copy + Eq + 'static {
    const TABLE: NameTable;

    fn from_raw(raw: u32) -> Option<Self>;
    fn raw(self) -> u32;

    fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(raw, _)| *raw == self.raw())
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }
}

/// A decoded field that is either a known enumerant or the raw value.
///
/// Out-of-table values are kept instead of rejected so that a single odd
/// field never aborts decoding of the surrounding message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol<T> {
    Known(T),
    Unknown(u32),
}

impl<T: Symbolic> Symbol<T> {
    pub fn from_raw(raw: u32) -> Self {
        T::from_raw(raw).map_or(Symbol::Unknown(raw), Symbol::Known)
    }

    pub fn raw(&self) -> u32 {
        match self {
            Symbol::Known(value) => value.raw(),
            Symbol::Unknown(raw) => *raw,
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            Symbol::Known(value) => Some(*value),
            Symbol::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Symbol::Known(_))
    }

    pub fn name(&self) -> Cow<'static, str> {
        name_of(T::TABLE, self.raw())
    }
}

impl<T: Symbolic> fmt::Display for Symbol<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl<T: Symbolic> Serialize for Symbol<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Symbol", 2)?;
        state.serialize_field("value", &self.raw())?;
        state.serialize_field("name", &self.name())?;
        state.end()
    }
}

/// Bus-master negotiation phase, carried opaquely from the bus driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BusState {
    Isolated = 1,
    Join = 2,
    Connected = 3,
    Active = 4,
    Disconnected = 5,
}

impl Symbolic for BusState {
    const TABLE: NameTable = BUS_STATE_NAMES;

    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(BusState::Isolated),
            2 => Some(BusState::Join),
            3 => Some(BusState::Connected),
            4 => Some(BusState::Active),
            5 => Some(BusState::Disconnected),
            _ => None,
        }
    }

    fn raw(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ContainerType {
    Request = 1,
    Response = 2,
    Event = 3,
}

impl Symbolic for ContainerType {
    const TABLE: NameTable = CONTAINER_TYPE_NAMES;

    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(ContainerType::Request),
            2 => Some(ContainerType::Response),
            3 => Some(ContainerType::Event),
            _ => None,
        }
    }

    fn raw(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ContainerFlags {
    None = 1,
    Broadcast = 2,
}

impl Symbolic for ContainerFlags {
    const TABLE: NameTable = CONTAINER_FLAG_NAMES;

    fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(ContainerFlags::None),
            2 => Some(ContainerFlags::Broadcast),
            _ => None,
        }
    }

    fn raw(self) -> u32 {
        self as u32
    }
}
