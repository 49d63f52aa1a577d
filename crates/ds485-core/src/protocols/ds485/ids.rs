//! Fixed-size device identifiers.
//!
//! `Dsuid` is the 17-byte unique identifier, `Dsid` the legacy 12-byte one.
//! Both reserve an all-zero pattern (null, no device) and an all-0xFF
//! pattern (broadcast, all devices). Identifiers compare byte for byte and
//! deliberately have no ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::error::Ds485Error;
use super::layout;
use crate::protocols::common::hex::{from_hex, to_hex};

macro_rules! device_id {
    ($(#[$meta:meta])* $name:ident, $size:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name([u8; $size]);

        impl $name {
            pub const SIZE: usize = $size;
            pub const NULL: Self = Self([0x00; $size]);
            pub const BROADCAST: Self = Self([0xFF; $size]);

            pub const fn from_bytes(bytes: [u8; $size]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(bytes: &[u8]) -> Result<Self, Ds485Error> {
                let id: [u8; $size] =
                    bytes.try_into().map_err(|_| Ds485Error::InvalidIdSize {
                        expected: $size,
                        actual: bytes.len(),
                    })?;
                Ok(Self(id))
            }

            pub fn as_bytes(&self) -> &[u8; $size] {
                &self.0
            }

            pub fn is_null(&self) -> bool {
                *self == Self::NULL
            }

            pub fn is_broadcast(&self) -> bool {
                *self == Self::BROADCAST
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&to_hex(&self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = Ds485Error;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                let bytes = from_hex(text).ok_or_else(|| Ds485Error::InvalidIdText {
                    text: text.to_string(),
                })?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }
    };
}

device_id!(
    /// 136-bit device unique identifier (dSUID).
    Dsuid,
    layout::DSUID_SIZE
);

device_id!(
    /// Legacy 96-bit device identifier (dSID).
    Dsid,
    layout::DSID_SIZE
);

#[cfg(test)]
mod tests {
    use super::{Dsid, Dsuid};
    use crate::protocols::ds485::error::Ds485Error;

    #[test]
    fn broadcast_and_null_sentinels() {
        let broadcast = Dsuid::from_bytes([0xFF; 17]);
        let null = Dsuid::from_bytes([0x00; 17]);
        assert_eq!(broadcast, Dsuid::BROADCAST);
        assert_eq!(null, Dsuid::NULL);
        assert!(broadcast.is_broadcast());
        assert!(null.is_null());

        let mut bytes = [0x00; 17];
        bytes[16] = 0x01;
        let other = Dsuid::from_bytes(bytes);
        assert_ne!(other, Dsuid::NULL);
        assert_ne!(other, Dsuid::BROADCAST);
        assert!(!other.is_null() && !other.is_broadcast());
    }

    #[test]
    fn from_slice_checks_size() {
        let err = Dsid::from_slice(&[0u8; 11]).unwrap_err();
        assert_eq!(
            err,
            Ds485Error::InvalidIdSize {
                expected: 12,
                actual: 11
            }
        );
        assert!(Dsid::from_slice(&[0u8; 12]).unwrap().is_null());
    }

    #[test]
    fn display_and_parse_agree() {
        let text = "3504175fe0000000000000010000000000";
        let dsuid: Dsuid = text.parse().unwrap();
        assert_eq!(dsuid.to_string(), text);
        assert!("xyz".parse::<Dsuid>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let value = serde_json::to_value(Dsid::BROADCAST).unwrap();
        assert_eq!(value, serde_json::json!("ffffffffffffffffffffffff"));
    }
}
