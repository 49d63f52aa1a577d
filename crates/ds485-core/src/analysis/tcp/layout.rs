//! TCP header offsets needed to locate the segment payload.

pub const TCP_MIN_HEADER_LEN: usize = 20;
/// High nibble: header length in 32-bit words.
pub const DATA_OFFSET_BYTE: usize = 12;
pub const DATA_OFFSET_SHIFT: u8 = 4;
pub const DATA_OFFSET_WORD: usize = 4;
