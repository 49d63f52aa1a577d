use std::ops::Range;

use super::error::Ds485Error;
use super::ids::{Dsid, Dsuid};
use super::layout;

/// Bounds-checked little-endian access over a borrowed buffer.
pub struct Ds485Reader<'a> {
    payload: &'a [u8],
}

impl<'a> Ds485Reader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), Ds485Error> {
        if self.payload.len() < needed {
            return Err(Ds485Error::TruncatedPacket {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, Ds485Error> {
        self.payload
            .get(offset)
            .copied()
            .ok_or(Ds485Error::TruncatedPacket {
                needed: offset + 1,
                actual: self.payload.len(),
            })
    }

    pub fn read_u16_le(&self, range: Range<usize>) -> Result<u16, Ds485Error> {
        let bytes: [u8; 2] = self.read_array(range)?;
        Ok(u16::from_le_bytes(bytes))
    }

    pub fn read_u32_le(&self, range: Range<usize>) -> Result<u32, Ds485Error> {
        let bytes: [u8; 4] = self.read_array(range)?;
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], Ds485Error> {
        self.payload
            .get(range.clone())
            .ok_or(Ds485Error::TruncatedPacket {
                needed: range.end,
                actual: self.payload.len(),
            })
    }

    pub fn read_dsuid(&self, range: Range<usize>) -> Result<Dsuid, Ds485Error> {
        Ok(Dsuid::from_bytes(self.read_array(range)?))
    }

    pub fn read_dsid(&self, offset: usize) -> Result<Dsid, Ds485Error> {
        Ok(Dsid::from_bytes(
            self.read_array(offset..offset + layout::DSID_SIZE)?,
        ))
    }

    fn read_array<const N: usize>(&self, range: Range<usize>) -> Result<[u8; N], Ds485Error> {
        let bytes = self.read_slice(range)?;
        bytes.try_into().map_err(|_| Ds485Error::TruncatedPacket {
            needed: N,
            actual: bytes.len(),
        })
    }
}
