use std::ops::Range;

use super::error::DaemonError;
use super::layout;
use crate::protocols::ds485::Dsid;
use crate::protocols::ds485::layout::DSID_SIZE;

/// View over one complete PDU, validated against its declared length.
pub struct PduReader<'a> {
    pdu: &'a [u8],
    command: u8,
    declared_len: u16,
}

impl<'a> PduReader<'a> {
    /// Validate the header at the start of `bytes` and bound the view to the
    /// declared length. Bytes after the declared length are not part of it.
    pub fn new(bytes: &'a [u8]) -> Result<Self, DaemonError> {
        if bytes.len() < layout::HEADER_LEN {
            return Err(DaemonError::TruncatedPacket {
                needed: layout::HEADER_LEN,
                actual: bytes.len(),
            });
        }
        let command = bytes[layout::COMMAND_OFFSET];
        let declared_len = read_declared_len(bytes)?;
        let total = declared_len as usize;
        if total < layout::HEADER_LEN {
            return Err(DaemonError::InvalidPduLength {
                length: declared_len,
            });
        }
        let pdu = bytes.get(..total).ok_or(DaemonError::TruncatedPacket {
            needed: total,
            actual: bytes.len(),
        })?;
        Ok(Self {
            pdu,
            command,
            declared_len,
        })
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn declared_len(&self) -> u16 {
        self.declared_len
    }

    /// A PDU with nothing after the header is the request form of a query.
    pub fn is_request(&self) -> bool {
        self.pdu.len() == layout::HEADER_LEN
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.pdu[layout::PAYLOAD_OFFSET..]
    }

    /// Read a byte at a payload-relative offset.
    pub fn read_u8(&self, offset: usize) -> Result<u8, DaemonError> {
        self.payload()
            .get(offset)
            .copied()
            .ok_or(DaemonError::TruncatedPacket {
                needed: layout::PAYLOAD_OFFSET + offset + 1,
                actual: self.pdu.len(),
            })
    }

    /// Payload-relative offsets of every complete dSID entry, plus the count
    /// of trailing bytes too short to form one.
    pub fn dsid_slots(&self) -> (Range<usize>, usize) {
        let payload_len = self.payload().len();
        let complete = payload_len / DSID_SIZE;
        (0..complete, payload_len % DSID_SIZE)
    }

    pub fn read_dsid(&self, offset: usize) -> Result<Dsid, DaemonError> {
        let bytes = self
            .payload()
            .get(offset..offset + DSID_SIZE)
            .ok_or(DaemonError::TruncatedPacket {
                needed: layout::PAYLOAD_OFFSET + offset + DSID_SIZE,
                actual: self.pdu.len(),
            })?;
        Ok(Dsid::from_slice(bytes)?)
    }
}

/// Read the little-endian total length from a buffer holding at least the
/// 3-byte header.
pub fn read_declared_len(bytes: &[u8]) -> Result<u16, DaemonError> {
    let raw = bytes
        .get(layout::LENGTH_RANGE)
        .ok_or(DaemonError::TruncatedPacket {
            needed: layout::HEADER_LEN,
            actual: bytes.len(),
        })?;
    Ok(u16::from_le_bytes([raw[0], raw[1]]))
}
