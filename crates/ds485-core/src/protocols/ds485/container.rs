//! Container (short message) and LongPacket (netlib message) layouts.
//!
//! Both share the same shape: destination/source dSUID, a container type,
//! a length, a transaction id and `length` bytes of application data. The
//! data blob is only delimited here, never interpreted.

use serde::Serialize;

use super::error::Ds485Error;
use super::ids::Dsuid;
use super::layout;
use super::reader::Ds485Reader;
use crate::protocols::common::hex::serialize_hex;
use crate::protocols::names::{ContainerFlags, ContainerType, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub destination_id: Dsuid,
    pub source_id: Dsuid,
    pub container_type: Symbol<ContainerType>,
    pub container_flags: Symbol<ContainerFlags>,
    pub length: u8,
    pub transaction_id: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongPacketHeader {
    pub destination_id: Dsuid,
    pub source_id: Dsuid,
    pub container_type: Symbol<ContainerType>,
    pub length: u16,
    pub transaction_id: u8,
}

/// Decode the fixed container header and, if `decode_nested_payload` is set,
/// delimit the `length` data bytes that follow it.
pub fn parse_container(
    payload: &[u8],
    decode_nested_payload: bool,
) -> Result<(ContainerHeader, Option<&[u8]>), Ds485Error> {
    let reader = Ds485Reader::new(payload);
    reader.require_len(layout::DATA_OFFSET)?;

    let header = ContainerHeader {
        destination_id: reader.read_dsuid(layout::DESTINATION_ID_RANGE)?,
        source_id: reader.read_dsuid(layout::SOURCE_ID_RANGE)?,
        container_type: Symbol::from_raw(reader.read_u32_le(layout::CONTAINER_TYPE_RANGE)?),
        container_flags: Symbol::from_raw(reader.read_u32_le(layout::CONTAINER_FLAGS_RANGE)?),
        length: reader.read_u8(layout::LENGTH_OFFSET)?,
        transaction_id: reader.read_u8(layout::TRANSACTION_ID_OFFSET)?,
    };
    if !decode_nested_payload {
        return Ok((header, None));
    }

    let length = header.length as usize;
    if length > layout::MAX_PAYLOAD_SIZE {
        return Err(Ds485Error::InvalidLength {
            length,
            max: layout::MAX_PAYLOAD_SIZE,
        });
    }
    let data = reader.read_slice(layout::DATA_OFFSET..layout::DATA_OFFSET + length)?;
    Ok((header, Some(data)))
}

/// LongPacket counterpart of [`parse_container`]. The two alignment bytes
/// after the source id are skipped.
pub fn parse_long_packet(
    payload: &[u8],
    decode_nested_payload: bool,
) -> Result<(LongPacketHeader, Option<&[u8]>), Ds485Error> {
    let reader = Ds485Reader::new(payload);
    reader.require_len(layout::LONG_DATA_OFFSET)?;

    let header = LongPacketHeader {
        destination_id: reader.read_dsuid(layout::LONG_DESTINATION_ID_RANGE)?,
        source_id: reader.read_dsuid(layout::LONG_SOURCE_ID_RANGE)?,
        container_type: Symbol::from_raw(reader.read_u32_le(layout::LONG_CONTAINER_TYPE_RANGE)?),
        length: reader.read_u16_le(layout::LONG_LENGTH_RANGE)?,
        transaction_id: reader.read_u8(layout::LONG_TRANSACTION_ID_OFFSET)?,
    };
    if !decode_nested_payload {
        return Ok((header, None));
    }

    let length = header.length as usize;
    if length > layout::LONG_MAX_PAYLOAD_SIZE {
        return Err(Ds485Error::InvalidLength {
            length,
            max: layout::LONG_MAX_PAYLOAD_SIZE,
        });
    }
    let data = reader.read_slice(layout::LONG_DATA_OFFSET..layout::LONG_DATA_OFFSET + length)?;
    Ok((header, Some(data)))
}

/// An owned short message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Container {
    pub destination_id: Dsuid,
    pub source_id: Dsuid,
    pub container_type: Symbol<ContainerType>,
    pub container_flags: Symbol<ContainerFlags>,
    pub transaction_id: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl Container {
    pub fn decode(payload: &[u8]) -> Result<Self, Ds485Error> {
        let (header, data) = parse_container(payload, true)?;
        Ok(Self {
            destination_id: header.destination_id,
            source_id: header.source_id,
            container_type: header.container_type,
            container_flags: header.container_flags,
            transaction_id: header.transaction_id,
            data: data.unwrap_or_default().to_vec(),
        })
    }

    /// Encode into the fixed 171-byte packed structure, zero padding the
    /// unused part of the data buffer.
    ///
    /// # Examples
    /// ```
    /// use ds485_core::protocols::ds485::{Container, ContainerFlags, ContainerType, Dsuid};
    /// use ds485_core::protocols::names::Symbol;
    ///
    /// let container = Container {
    ///     destination_id: Dsuid::BROADCAST,
    ///     source_id: Dsuid::NULL,
    ///     container_type: Symbol::Known(ContainerType::Request),
    ///     container_flags: Symbol::Known(ContainerFlags::Broadcast),
    ///     transaction_id: 7,
    ///     data: vec![0x01, 0x02],
    /// };
    /// let bytes = container.encode()?;
    /// assert_eq!(bytes.len(), 171);
    /// assert_eq!(Container::decode(&bytes)?, container);
    /// # Ok::<(), ds485_core::protocols::ds485::Ds485Error>(())
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>, Ds485Error> {
        if self.data.len() > layout::MAX_PAYLOAD_SIZE {
            return Err(Ds485Error::InvalidLength {
                length: self.data.len(),
                max: layout::MAX_PAYLOAD_SIZE,
            });
        }
        let mut out = vec![0u8; layout::CONTAINER_SIZE];
        out[layout::DESTINATION_ID_RANGE].copy_from_slice(self.destination_id.as_bytes());
        out[layout::SOURCE_ID_RANGE].copy_from_slice(self.source_id.as_bytes());
        out[layout::CONTAINER_TYPE_RANGE]
            .copy_from_slice(&self.container_type.raw().to_le_bytes());
        out[layout::CONTAINER_FLAGS_RANGE]
            .copy_from_slice(&self.container_flags.raw().to_le_bytes());
        out[layout::LENGTH_OFFSET] = self.data.len() as u8;
        out[layout::TRANSACTION_ID_OFFSET] = self.transaction_id;
        out[layout::DATA_OFFSET..layout::DATA_OFFSET + self.data.len()]
            .copy_from_slice(&self.data);
        Ok(out)
    }
}

/// An owned netlib message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongPacket {
    pub destination_id: Dsuid,
    pub source_id: Dsuid,
    pub container_type: Symbol<ContainerType>,
    pub transaction_id: u8,
    #[serde(serialize_with = "serialize_hex")]
    pub data: Vec<u8>,
}

impl LongPacket {
    pub fn decode(payload: &[u8]) -> Result<Self, Ds485Error> {
        let (header, data) = parse_long_packet(payload, true)?;
        Ok(Self {
            destination_id: header.destination_id,
            source_id: header.source_id,
            container_type: header.container_type,
            transaction_id: header.transaction_id,
            data: data.unwrap_or_default().to_vec(),
        })
    }

    /// Encode the header, transaction id and the data bytes in use. The
    /// unused tail of the 8600-byte buffer is not emitted.
    pub fn encode(&self) -> Result<Vec<u8>, Ds485Error> {
        if self.data.len() > layout::LONG_MAX_PAYLOAD_SIZE {
            return Err(Ds485Error::InvalidLength {
                length: self.data.len(),
                max: layout::LONG_MAX_PAYLOAD_SIZE,
            });
        }
        let mut out = vec![0u8; layout::LONG_DATA_OFFSET + self.data.len()];
        out[layout::LONG_DESTINATION_ID_RANGE].copy_from_slice(self.destination_id.as_bytes());
        out[layout::LONG_SOURCE_ID_RANGE].copy_from_slice(self.source_id.as_bytes());
        out[layout::LONG_CONTAINER_TYPE_RANGE]
            .copy_from_slice(&self.container_type.raw().to_le_bytes());
        out[layout::LONG_LENGTH_RANGE].copy_from_slice(&(self.data.len() as u16).to_le_bytes());
        out[layout::LONG_TRANSACTION_ID_OFFSET] = self.transaction_id;
        out[layout::LONG_DATA_OFFSET..].copy_from_slice(&self.data);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_container(data: Vec<u8>) -> Container {
        let mut src = [0u8; 17];
        src[0] = 0x35;
        src[16] = 0x42;
        Container {
            destination_id: Dsuid::BROADCAST,
            source_id: Dsuid::from_bytes(src),
            container_type: Symbol::Known(ContainerType::Response),
            container_flags: Symbol::Known(ContainerFlags::None),
            transaction_id: 0x5A,
            data,
        }
    }

    #[test]
    fn container_round_trips_for_every_valid_length() {
        for length in 0..=layout::MAX_PAYLOAD_SIZE {
            let data: Vec<u8> = (0..length).map(|i| i as u8).collect();
            let container = sample_container(data);
            let bytes = container.encode().unwrap();
            assert_eq!(bytes.len(), layout::CONTAINER_SIZE);
            assert_eq!(Container::decode(&bytes).unwrap(), container);
        }
    }

    #[test]
    fn container_field_offsets() {
        let bytes = sample_container(vec![0xEE]).encode().unwrap();
        assert_eq!(&bytes[0..17], &[0xFF; 17]);
        assert_eq!(bytes[17], 0x35);
        assert_eq!(&bytes[34..38], &[2, 0, 0, 0]);
        assert_eq!(&bytes[38..42], &[1, 0, 0, 0]);
        assert_eq!(bytes[42], 1);
        assert_eq!(bytes[43], 0x5A);
        assert_eq!(bytes[44], 0xEE);
    }

    #[test]
    fn header_only_ignores_missing_data() {
        let mut bytes = sample_container(vec![1, 2, 3]).encode().unwrap();
        bytes.truncate(layout::DATA_OFFSET);
        let (header, data) = parse_container(&bytes, false).unwrap();
        assert_eq!(header.length, 3);
        assert!(data.is_none());
        let err = parse_container(&bytes, true).unwrap_err();
        assert_eq!(
            err,
            Ds485Error::TruncatedPacket {
                needed: 47,
                actual: 44
            }
        );
    }

    #[test]
    fn container_length_above_capacity_is_rejected() {
        let mut bytes = sample_container(Vec::new()).encode().unwrap();
        bytes[layout::LENGTH_OFFSET] = 128;
        let err = parse_container(&bytes, true).unwrap_err();
        assert_eq!(err, Ds485Error::InvalidLength { length: 128, max: 127 });
        assert!(sample_container(vec![0; 128]).encode().is_err());
    }

    #[test]
    fn unknown_container_type_is_kept() {
        let mut bytes = sample_container(Vec::new()).encode().unwrap();
        bytes[layout::CONTAINER_TYPE_RANGE].copy_from_slice(&9u32.to_le_bytes());
        let (header, _) = parse_container(&bytes, false).unwrap();
        assert_eq!(header.container_type, Symbol::Unknown(9));
    }

    #[test]
    fn long_packet_skips_alignment_pad() {
        let packet = LongPacket {
            destination_id: Dsuid::NULL,
            source_id: Dsuid::BROADCAST,
            container_type: Symbol::Known(ContainerType::Event),
            transaction_id: 3,
            data: vec![0xAB; 300],
        };
        let mut bytes = packet.encode().unwrap();
        assert_eq!(&bytes[40..42], &300u16.to_le_bytes());
        bytes[layout::LONG_ALIGNMENT_PAD_RANGE].copy_from_slice(&[0xDE, 0xAD]);
        assert_eq!(LongPacket::decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn long_packet_truncated_data() {
        let packet = LongPacket {
            destination_id: Dsuid::NULL,
            source_id: Dsuid::NULL,
            container_type: Symbol::Known(ContainerType::Request),
            transaction_id: 1,
            data: vec![1; 10],
        };
        let mut bytes = packet.encode().unwrap();
        bytes.pop();
        let err = parse_long_packet(&bytes, true).unwrap_err();
        assert!(matches!(err, Ds485Error::TruncatedPacket { needed: 53, .. }));
        assert!(parse_long_packet(&bytes, false).is_ok());
    }
}
