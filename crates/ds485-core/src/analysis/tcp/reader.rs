use super::error::TcpError;
use super::layout;

/// Bounds-checked view over a TCP segment (header plus payload).
///
/// # Examples
/// `analysis` is private to the crate; the snippet is not compiled.
/// ```text
/// let mut segment = vec![0u8; 24];
/// segment[12] = 5 << 4;
/// segment[20..].copy_from_slice(&[0x02, 0x03, 0x00, 0xFF]);
///
/// let reader = TcpReader::new(&segment);
/// assert_eq!(reader.header_len()?, 20);
/// assert_eq!(reader.payload_without_header()?, &[0x02, 0x03, 0x00, 0xFF]);
/// ```
pub struct TcpReader<'a> {
    segment: &'a [u8],
}

impl<'a> TcpReader<'a> {
    pub fn new(segment: &'a [u8]) -> Self {
        Self { segment }
    }

    /// # Errors
    /// `TcpError::TooShort` when the segment holds fewer than `needed` bytes.
    pub fn require_len(&self, needed: usize) -> Result<(), TcpError> {
        if self.segment.len() < needed {
            return Err(TcpError::TooShort {
                needed,
                actual: self.segment.len(),
            });
        }
        Ok(())
    }

    /// Header length announced by the data offset field, in bytes.
    pub fn header_len(&self) -> Result<usize, TcpError> {
        self.require_len(layout::TCP_MIN_HEADER_LEN)?;
        let words = self.segment[layout::DATA_OFFSET_BYTE] >> layout::DATA_OFFSET_SHIFT;
        Ok(words as usize * layout::DATA_OFFSET_WORD)
    }

    /// Bytes after the options. Data offsets below five words, or past the
    /// end of the segment, are rejected.
    ///
    /// # Errors
    /// `TcpError::InvalidDataOffset` for an impossible header length.
    pub fn payload_without_header(&self) -> Result<&'a [u8], TcpError> {
        let header_len = self.header_len()?;
        if header_len < layout::TCP_MIN_HEADER_LEN {
            return Err(TcpError::InvalidDataOffset {
                offset: header_len,
                actual: self.segment.len(),
            });
        }
        self.segment
            .get(header_len..)
            .ok_or(TcpError::InvalidDataOffset {
                offset: header_len,
                actual: self.segment.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::TcpReader;
    use crate::analysis::tcp::error::TcpError;

    fn header(words: u8, total: usize) -> Vec<u8> {
        let mut segment = vec![0u8; total];
        segment[12] = words << 4;
        segment
    }

    #[test]
    fn payload_follows_minimal_header() {
        let segment = header(5, 24);
        let reader = TcpReader::new(&segment);
        assert_eq!(reader.payload_without_header().unwrap().len(), 4);
    }

    #[test]
    fn options_are_skipped() {
        let segment = header(8, 40);
        let reader = TcpReader::new(&segment);
        assert_eq!(reader.header_len().unwrap(), 32);
        assert_eq!(reader.payload_without_header().unwrap().len(), 8);
    }

    #[test]
    fn too_short_for_fixed_header() {
        let segment = [0u8; 19];
        let err = TcpReader::new(&segment).payload_without_header().unwrap_err();
        assert!(matches!(err, TcpError::TooShort { .. }));
    }

    #[test]
    fn data_offset_below_minimum_or_past_end() {
        let low = header(4, 24);
        assert!(matches!(
            TcpReader::new(&low).payload_without_header(),
            Err(TcpError::InvalidDataOffset { offset: 16, .. })
        ));
        let high = header(15, 24);
        assert!(matches!(
            TcpReader::new(&high).payload_without_header(),
            Err(TcpError::InvalidDataOffset { offset: 60, .. })
        ));
    }
}
