use std::io::{Read, Seek, SeekFrom};

use pcap_parser::Linktype;

use super::error::PcapSourceError;
use super::layout;

/// Read the magic bytes and rewind the reader to the start.
///
/// # Examples
/// `source::pcap` is private to the crate; the snippet is not compiled.
/// ```text
/// use std::io::Cursor;
///
/// let mut cursor = Cursor::new([0xd4, 0xc3, 0xb2, 0xa1, 0x02, 0x00]);
/// let magic = read_magic_and_rewind(&mut cursor)?;
/// assert_eq!(magic, [0xd4, 0xc3, 0xb2, 0xa1]);
/// assert_eq!(cursor.position(), 0);
/// ```
///
/// # Errors
/// Returns `PcapSourceError::Io` when fewer than four bytes are available or
/// the reader cannot be rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], PcapSourceError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

/// True for the PCAPNG section header block type.
///
/// # Examples
/// ```text
/// assert!(is_pcapng_magic(&[0x0a, 0x0d, 0x0d, 0x0a]));
/// assert!(!is_pcapng_magic(&[0xd4, 0xc3, 0xb2, 0xa1]));
/// ```
pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &layout::PCAPNG_MAGIC
}

/// Resolve the linktype for a given interface id, defaulting to Ethernet.
///
/// # Examples
/// ```text
/// use pcap_parser::Linktype;
///
/// let interfaces = [Linktype::RAW, Linktype::ETHERNET];
/// assert_eq!(linktype_for_interface(&interfaces, 0), Linktype::RAW);
/// assert_eq!(linktype_for_interface(&interfaces, 7), Linktype::ETHERNET);
/// ```
pub fn linktype_for_interface(linktypes: &[Linktype], if_id: u32) -> Linktype {
    linktypes
        .get(if_id as usize)
        .copied()
        .unwrap_or(Linktype::ETHERNET)
}

/// Convert a PCAPNG high/low timestamp (microsecond resolution) to seconds.
///
/// # Examples
/// ```text
/// assert_eq!(pcapng_ts_to_seconds(0, 1_500_000), 1.5);
/// ```
pub fn pcapng_ts_to_seconds(ts_high: u32, ts_low: u32) -> f64 {
    let ts = ((ts_high as u64) << 32) | (ts_low as u64);
    ts as f64 / layout::MICROS_PER_SECOND
}

/// Convert a legacy record timestamp to seconds. The fractional field holds
/// nanoseconds when the file header says so.
///
/// # Examples
/// ```text
/// assert_eq!(legacy_ts_to_seconds(2, 250_000, false), 2.25);
/// assert_eq!(legacy_ts_to_seconds(2, 250_000_000, true), 2.25);
/// ```
pub fn legacy_ts_to_seconds(ts_sec: u32, ts_frac: u32, nanosecond: bool) -> f64 {
    let divisor = if nanosecond {
        layout::MICROS_PER_SECOND * 1e3
    } else {
        layout::MICROS_PER_SECOND
    };
    ts_sec as f64 + ts_frac as f64 / divisor
}
