//! Frame Reassembler: complete daemon PDUs out of an arbitrarily split byte
//! stream.
//!
//! One instance per stream direction. The buffer persists across
//! [`PduReassembler::push`] calls; a PDU leaves it only once all of its
//! declared bytes have arrived.

use bytes::{Bytes, BytesMut};

use super::error::DaemonError;
use super::layout;
use super::reader::read_declared_len;

#[derive(Debug, Default)]
pub struct PduReassembler {
    buffer: BytesMut,
    emitted: u64,
    discarded: u64,
}

impl PduReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and iterate over the PDUs it completes.
    ///
    /// Extraction is lazy: PDUs not pulled from the iterator stay buffered
    /// and are returned by the next `push` or [`next_pdu`](Self::next_pdu).
    /// Empty chunks are accepted.
    ///
    /// # Examples
    /// ```
    /// use ds485_core::protocols::daemon::PduReassembler;
    ///
    /// let mut reassembler = PduReassembler::new();
    /// assert_eq!(reassembler.push(&[0x02, 0x03]).count(), 0);
    /// let pdus: Vec<_> = reassembler
    ///     .push(&[0x00, 0x23, 0x04])
    ///     .collect::<Result<_, _>>()?;
    /// assert_eq!(pdus.len(), 1);
    /// assert_eq!(&pdus[0][..], &[0x02, 0x03, 0x00]);
    /// assert_eq!(reassembler.buffered_len(), 2);
    /// # Ok::<(), ds485_core::protocols::daemon::DaemonError>(())
    /// ```
    pub fn push(&mut self, chunk: &[u8]) -> Pdus<'_> {
        self.buffer.extend_from_slice(chunk);
        Pdus { reassembler: self }
    }

    /// Take the next complete PDU from the buffer, if any.
    ///
    /// A declared length below the header size cannot be resynchronized;
    /// the buffer is dropped and `InvalidPduLength` is returned once.
    pub fn next_pdu(&mut self) -> Option<Result<Bytes, DaemonError>> {
        if self.buffer.len() < layout::HEADER_LEN {
            return None;
        }
        let declared = match read_declared_len(&self.buffer) {
            Ok(declared) => declared,
            Err(err) => return Some(Err(err)),
        };
        let total = declared as usize;
        if total < layout::HEADER_LEN {
            let dropped = self.buffer.len();
            tracing::warn!(
                declared,
                dropped,
                "daemon PDU length shorter than header; discarding buffer"
            );
            self.discarded += dropped as u64;
            self.buffer.clear();
            return Some(Err(DaemonError::InvalidPduLength { length: declared }));
        }
        if self.buffer.len() < total {
            return None;
        }
        self.emitted += 1;
        Some(Ok(self.buffer.split_to(total).freeze()))
    }

    /// Forget buffered bytes, e.g. when the stream reconnects.
    pub fn reset(&mut self) {
        self.discarded += self.buffer.len() as u64;
        self.buffer.clear();
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn pdus_emitted(&self) -> u64 {
        self.emitted
    }

    /// Bytes dropped by `reset` or by corrupt-length recovery.
    pub fn bytes_discarded(&self) -> u64 {
        self.discarded
    }
}

/// Iterator returned by [`PduReassembler::push`].
pub struct Pdus<'a> {
    reassembler: &'a mut PduReassembler,
}

impl Iterator for Pdus<'_> {
    type Item = Result<Bytes, DaemonError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reassembler.next_pdu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &[u8] = &[
        0x02, 0x03, 0x00, // ping
        0x23, 0x04, 0x00, 0x03, // bus state
        0x99, 0x05, 0x00, 0xAA, 0xBB, // unknown
    ];

    fn drain(reassembler: &mut PduReassembler, chunk: &[u8]) -> Vec<Bytes> {
        reassembler
            .push(chunk)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn whole_stream_yields_every_pdu() {
        let mut reassembler = PduReassembler::new();
        let pdus = drain(&mut reassembler, STREAM);
        assert_eq!(pdus.len(), 3);
        assert_eq!(&pdus[1][..], &[0x23, 0x04, 0x00, 0x03]);
        assert_eq!(reassembler.buffered_len(), 0);
        assert_eq!(reassembler.pdus_emitted(), 3);
    }

    #[test]
    fn byte_by_byte_matches_whole() {
        let mut reassembler = PduReassembler::new();
        let mut pdus = Vec::new();
        for byte in STREAM {
            pdus.extend(drain(&mut reassembler, std::slice::from_ref(byte)));
            pdus.extend(drain(&mut reassembler, &[]));
        }
        assert_eq!(pdus.concat(), STREAM);
        assert_eq!(pdus.len(), 3);
    }

    #[test]
    fn partial_header_waits() {
        let mut reassembler = PduReassembler::new();
        assert!(drain(&mut reassembler, &[0x23, 0x04]).is_empty());
        assert_eq!(reassembler.buffered_len(), 2);
        assert!(drain(&mut reassembler, &[0x00]).is_empty());
        assert_eq!(drain(&mut reassembler, &[0x05]).len(), 1);
    }

    #[test]
    fn unpulled_pdus_stay_buffered() {
        let mut reassembler = PduReassembler::new();
        let first = reassembler.push(STREAM).next().unwrap().unwrap();
        assert_eq!(&first[..], &[0x02, 0x03, 0x00]);
        assert_eq!(reassembler.buffered_len(), STREAM.len() - 3);
        assert_eq!(drain(&mut reassembler, &[]).len(), 2);
    }

    #[test]
    fn corrupt_length_discards_buffer_once() {
        let mut reassembler = PduReassembler::new();
        let results: Vec<_> = reassembler.push(&[0x02, 0x01, 0x00, 0x02, 0x03]).collect();
        assert_eq!(results, vec![Err(DaemonError::InvalidPduLength { length: 1 })]);
        assert_eq!(reassembler.buffered_len(), 0);
        assert_eq!(reassembler.bytes_discarded(), 5);
        assert_eq!(drain(&mut reassembler, &[0x02, 0x03, 0x00]).len(), 1);
    }

    #[test]
    fn reset_drops_partial_pdu() {
        let mut reassembler = PduReassembler::new();
        drain(&mut reassembler, &[0x04, 0xAE, 0x00, 0x01]);
        reassembler.reset();
        assert_eq!(reassembler.buffered_len(), 0);
        assert_eq!(reassembler.bytes_discarded(), 4);
        assert_eq!(drain(&mut reassembler, &[0x02, 0x03, 0x00]).len(), 1);
    }
}
