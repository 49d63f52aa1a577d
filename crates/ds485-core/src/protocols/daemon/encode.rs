use bytes::{BufMut, Bytes, BytesMut};

use super::command::CommandId;
use super::error::DaemonError;
use super::layout;

/// Wrap `payload` in a daemon envelope whose length field covers the header.
///
/// # Examples
/// ```
/// use ds485_core::protocols::daemon::{CommandId, encode_pdu};
///
/// let pdu = encode_pdu(CommandId::Ping, &[])?;
/// assert_eq!(&pdu[..], &[0x02, 0x03, 0x00]);
/// # Ok::<(), ds485_core::protocols::daemon::DaemonError>(())
/// ```
pub fn encode_pdu(command: CommandId, payload: &[u8]) -> Result<Bytes, DaemonError> {
    let total = layout::HEADER_LEN + payload.len();
    if total > layout::MAX_PDU_LEN {
        return Err(DaemonError::PayloadTooLarge {
            size: payload.len(),
            max: layout::MAX_PDU_LEN - layout::HEADER_LEN,
        });
    }
    let mut out = BytesMut::with_capacity(total);
    out.put_u8(command.as_u8());
    out.put_u16_le(total as u16);
    out.extend_from_slice(payload);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_field_is_little_endian_total() {
        let pdu = encode_pdu(CommandId::QueryDevices, &[0u8; 300]).unwrap();
        assert_eq!(pdu.len(), 303);
        assert_eq!(&pdu[..3], &[0x20, 0x2F, 0x01]);
    }

    #[test]
    fn largest_payload_fits() {
        let payload = vec![0u8; layout::MAX_PDU_LEN - layout::HEADER_LEN];
        let pdu = encode_pdu(CommandId::Unknown(0x99), &payload).unwrap();
        assert_eq!(&pdu[..3], &[0x99, 0xFF, 0xFF]);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; layout::MAX_PDU_LEN - layout::HEADER_LEN + 1];
        let err = encode_pdu(CommandId::TxPacket, &payload).unwrap_err();
        assert_eq!(
            err,
            DaemonError::PayloadTooLarge {
                size: 65533,
                max: 65532
            }
        );
    }
}
