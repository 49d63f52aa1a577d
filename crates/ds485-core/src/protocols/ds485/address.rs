use serde::Serialize;

use super::layout;

/// Address class of a one-byte bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "class", content = "address", rename_all = "snake_case")]
pub enum BusAddress {
    Master,
    Slave(u8),
    Intermediate,
    Invalid(u8),
}

impl BusAddress {
    pub fn from_u8(value: u8) -> Self {
        match value {
            layout::MASTER_ADDRESS => BusAddress::Master,
            layout::MIN_SLAVE_ADDRESS..=layout::MAX_SLAVE_ADDRESS => BusAddress::Slave(value),
            layout::INTERMEDIATE_ADDRESS => BusAddress::Intermediate,
            _ => BusAddress::Invalid(value),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            BusAddress::Master => layout::MASTER_ADDRESS,
            BusAddress::Slave(value) => value,
            BusAddress::Intermediate => layout::INTERMEDIATE_ADDRESS,
            BusAddress::Invalid(value) => value,
        }
    }

    pub fn is_valid(self) -> bool {
        !matches!(self, BusAddress::Invalid(_))
    }
}

/// Frame destination: a bus address or the 0xFF broadcast sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Broadcast,
    Address(BusAddress),
}

impl Destination {
    pub fn from_u8(value: u8) -> Self {
        if value == layout::BROADCAST_DESTINATION {
            Destination::Broadcast
        } else {
            Destination::Address(BusAddress::from_u8(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BusAddress, Destination};

    #[test]
    fn address_classes() {
        assert_eq!(BusAddress::from_u8(0), BusAddress::Master);
        assert_eq!(BusAddress::from_u8(1), BusAddress::Slave(1));
        assert_eq!(BusAddress::from_u8(62), BusAddress::Slave(62));
        assert_eq!(BusAddress::from_u8(63), BusAddress::Intermediate);
        assert_eq!(BusAddress::from_u8(64), BusAddress::Invalid(64));
        assert_eq!(BusAddress::from_u8(255), BusAddress::Invalid(255));
        assert!(!BusAddress::from_u8(255).is_valid());
    }

    #[test]
    fn to_u8_round_trips() {
        for value in 0..=u8::MAX {
            assert_eq!(BusAddress::from_u8(value).to_u8(), value);
        }
    }

    #[test]
    fn broadcast_destination_sentinel() {
        assert_eq!(Destination::from_u8(0xFF), Destination::Broadcast);
        assert_eq!(
            Destination::from_u8(5),
            Destination::Address(BusAddress::Slave(5))
        );
    }
}
