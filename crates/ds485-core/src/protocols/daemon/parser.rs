//! Command decoder: one complete PDU in, one structured record out.

use serde::Serialize;

use super::command::CommandId;
use super::error::DaemonError;
use super::layout;
use super::reader::PduReader;
use crate::protocols::common::hex::serialize_opt_hex;
use crate::protocols::ds485::layout::DSID_SIZE;
use crate::protocols::ds485::{ContainerHeader, Dsid, LongPacketHeader, parse_container, parse_long_packet};
use crate::protocols::names::{BusState, Symbol};

/// Structured record for one PDU.
///
/// `fields` is `None` only for unknown command bytes; their payload is then
/// passed through untouched in `nested_payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedPdu {
    pub command: CommandId,
    pub raw_length: u16,
    pub fields: Option<PduFields>,
    #[serde(
        serialize_with = "serialize_opt_hex",
        skip_serializing_if = "Option::is_none"
    )]
    pub nested_payload: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DecodeWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PduFields {
    /// No payload in either direction (ping).
    Empty,
    /// Request form of a query: header only.
    Request,
    /// Recognized command that is no longer interpreted.
    Deprecated,
    ApiRevision {
        revision: u8,
    },
    PacketFilter {
        flags: u8,
        promiscuous: bool,
    },
    Container(ContainerHeader),
    LongPacket(LongPacketHeader),
    Devices {
        dsids: Vec<Dsid>,
    },
    DeviceId {
        dsid: Dsid,
    },
    BusState {
        state: Symbol<BusState>,
    },
    BusChange {
        container: ContainerHeader,
        leave: bool,
    },
    BusStateEvent {
        container: ContainerHeader,
        state: Symbol<BusState>,
    },
    RestartBus {
        status: u8,
    },
}

/// Non-fatal irregularities found while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodeWarning {
    /// QUERY_DEVICES payload was not a multiple of the dSID size; the
    /// partial entry was not decoded.
    TrailingDeviceBytes { count: usize },
    /// Bytes after a fixed-size response value.
    TrailingBytes { count: usize },
    /// Field value outside its symbolic table.
    InvalidFieldValue { field: &'static str, value: u32 },
}

/// Caller-supplied interpretation of a record's nested payload.
pub trait NestedPayloadDecoder {
    type Output;

    fn decode(&self, command: CommandId, payload: &[u8]) -> Self::Output;
}

impl<F, T> NestedPayloadDecoder for F
where
    F: Fn(CommandId, &[u8]) -> T,
{
    type Output = T;

    fn decode(&self, command: CommandId, payload: &[u8]) -> T {
        self(command, payload)
    }
}

impl DecodedPdu {
    pub fn decode_nested<D: NestedPayloadDecoder>(&self, decoder: &D) -> Option<D::Output> {
        self.nested_payload
            .as_deref()
            .map(|payload| decoder.decode(self.command, payload))
    }
}

/// Decode one complete PDU.
///
/// # Examples
/// ```
/// use ds485_core::protocols::daemon::{CommandId, PduFields, decode_pdu};
/// use ds485_core::protocols::names::{BusState, Symbol};
///
/// let pdu = decode_pdu(&[0x23, 0x04, 0x00, 0x03])?;
/// assert_eq!(pdu.command, CommandId::QueryBusState);
/// assert_eq!(
///     pdu.fields,
///     Some(PduFields::BusState { state: Symbol::Known(BusState::Connected) })
/// );
/// # Ok::<(), ds485_core::protocols::daemon::DaemonError>(())
/// ```
///
/// # Errors
/// `TruncatedPacket` when the declared length or a container inside the
/// payload runs past the buffer, `InvalidPduLength` when the declared length
/// is shorter than the header.
pub fn decode_pdu(pdu: &[u8]) -> Result<DecodedPdu, DaemonError> {
    decode_at(pdu, 0).map(|(decoded, _)| decoded)
}

/// Decode the PDU starting at `offset` and report how many bytes it spans.
pub fn decode_at(buffer: &[u8], offset: usize) -> Result<(DecodedPdu, usize), DaemonError> {
    let rest = buffer.get(offset..).ok_or(DaemonError::TruncatedPacket {
        needed: offset,
        actual: buffer.len(),
    })?;
    let reader = PduReader::new(rest)?;
    let command = CommandId::from_u8(reader.command());
    let mut decoded = DecodedPdu {
        command,
        raw_length: reader.declared_len(),
        fields: None,
        nested_payload: None,
        warnings: Vec::new(),
    };
    decode_body(&reader, &mut decoded)?;
    Ok((decoded, reader.declared_len() as usize))
}

fn decode_body(reader: &PduReader<'_>, out: &mut DecodedPdu) -> Result<(), DaemonError> {
    let payload = reader.payload();
    let fields = match out.command {
        CommandId::Ping => {
            trailing_after(out, payload.len(), 0);
            PduFields::Empty
        }
        CommandId::TxPacket | CommandId::RxPacket => {
            let (header, data) = parse_container(payload, true)?;
            check_container_symbols(out, &header);
            out.nested_payload = data.map(<[u8]>::to_vec);
            PduFields::Container(header)
        }
        CommandId::LongTxPacket | CommandId::LongRxPacket => {
            let (header, data) = parse_long_packet(payload, true)?;
            check_symbol(out, "container_type", &header.container_type);
            out.nested_payload = data.map(<[u8]>::to_vec);
            PduFields::LongPacket(header)
        }
        CommandId::BusChange => {
            let (container, _) = parse_container(payload, false)?;
            check_container_symbols(out, &container);
            let flags = reader.read_u8(layout::BUS_EVENT_VALUE_OFFSET)?;
            PduFields::BusChange {
                container,
                leave: flags & layout::DSM_CHANGE_LEAVE != 0,
            }
        }
        _ if reader.is_request() && has_request_form(out.command) => PduFields::Request,
        CommandId::ApiRevision => {
            let revision = reader.read_u8(layout::RESPONSE_VALUE_OFFSET)?;
            trailing_after(out, payload.len(), 1);
            PduFields::ApiRevision { revision }
        }
        CommandId::PacketFilter => {
            let flags = reader.read_u8(layout::RESPONSE_VALUE_OFFSET)?;
            trailing_after(out, payload.len(), 1);
            PduFields::PacketFilter {
                flags,
                promiscuous: flags & layout::FILTER_ALL_RESPONSES != 0,
            }
        }
        CommandId::QueryDevices => {
            let (slots, trailing) = reader.dsid_slots();
            let dsids = slots
                .map(|slot| reader.read_dsid(slot * DSID_SIZE))
                .collect::<Result<Vec<_>, _>>()?;
            if trailing > 0 {
                out.warnings
                    .push(DecodeWarning::TrailingDeviceBytes { count: trailing });
            }
            PduFields::Devices { dsids }
        }
        CommandId::QueryDsuid => {
            let dsid = reader.read_dsid(0)?;
            trailing_after(out, payload.len(), DSID_SIZE);
            PduFields::DeviceId { dsid }
        }
        CommandId::QueryBusState => {
            let raw = reader.read_u8(layout::RESPONSE_VALUE_OFFSET)?;
            trailing_after(out, payload.len(), 1);
            PduFields::BusState {
                state: bus_state(out, raw),
            }
        }
        CommandId::BusState => {
            let (container, _) = parse_container(payload, false)?;
            check_container_symbols(out, &container);
            let raw = reader.read_u8(layout::BUS_EVENT_VALUE_OFFSET)?;
            PduFields::BusStateEvent {
                container,
                state: bus_state(out, raw),
            }
        }
        CommandId::RestartBus => {
            let status = reader.read_u8(layout::RESPONSE_VALUE_OFFSET)?;
            trailing_after(out, payload.len(), 1);
            PduFields::RestartBus { status }
        }
        CommandId::Sync
        | CommandId::DevicePacket
        | CommandId::LongDevicePacket
        | CommandId::Register
        | CommandId::Unregister
        | CommandId::RawMode
        | CommandId::QueryAddress => PduFields::Deprecated,
        CommandId::Unknown(_) => {
            out.nested_payload = Some(payload.to_vec());
            return Ok(());
        }
    };
    out.fields = Some(fields);
    Ok(())
}

fn has_request_form(command: CommandId) -> bool {
    matches!(
        command,
        CommandId::ApiRevision
            | CommandId::PacketFilter
            | CommandId::QueryDevices
            | CommandId::QueryDsuid
            | CommandId::QueryBusState
            | CommandId::BusState
            | CommandId::RestartBus
    )
}

fn trailing_after(out: &mut DecodedPdu, payload_len: usize, used: usize) {
    if payload_len > used {
        out.warnings.push(DecodeWarning::TrailingBytes {
            count: payload_len - used,
        });
    }
}

fn bus_state(out: &mut DecodedPdu, raw: u8) -> Symbol<BusState> {
    let state = Symbol::from_raw(raw.into());
    check_symbol(out, "bus_state", &state);
    state
}

fn check_container_symbols(out: &mut DecodedPdu, header: &ContainerHeader) {
    check_symbol(out, "container_type", &header.container_type);
    check_symbol(out, "container_flags", &header.container_flags);
}

fn check_symbol<T: crate::protocols::names::Symbolic>(
    out: &mut DecodedPdu,
    field: &'static str,
    symbol: &Symbol<T>,
) {
    if !symbol.is_known() {
        out.warnings.push(DecodeWarning::InvalidFieldValue {
            field,
            value: symbol.raw(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::daemon::encode::encode_pdu;
    use crate::protocols::ds485::{Container, ContainerFlags, ContainerType, Dsuid};

    fn container(data: Vec<u8>) -> Container {
        Container {
            destination_id: Dsuid::NULL,
            source_id: Dsuid::BROADCAST,
            container_type: Symbol::Known(ContainerType::Event),
            container_flags: Symbol::Known(ContainerFlags::None),
            transaction_id: 9,
            data,
        }
    }

    #[test]
    fn ping_has_no_fields() {
        let pdu = decode_pdu(&[0x02, 0x03, 0x00]).unwrap();
        assert_eq!(pdu.command, CommandId::Ping);
        assert_eq!(pdu.raw_length, 3);
        assert_eq!(pdu.fields, Some(PduFields::Empty));
        assert!(pdu.warnings.is_empty());
    }

    #[test]
    fn api_revision_request_and_response() {
        let request = decode_pdu(&[0x01, 0x03, 0x00]).unwrap();
        assert_eq!(request.fields, Some(PduFields::Request));
        let response = decode_pdu(&[0x01, 0x04, 0x00, 0x01]).unwrap();
        assert_eq!(response.fields, Some(PduFields::ApiRevision { revision: 1 }));
    }

    #[test]
    fn rx_packet_exposes_nested_payload() {
        let payload = container(vec![0x10, 0x20, 0x30]).encode().unwrap();
        let pdu_bytes = encode_pdu(CommandId::RxPacket, &payload).unwrap();
        let pdu = decode_pdu(&pdu_bytes).unwrap();
        assert_eq!(pdu.command, CommandId::RxPacket);
        assert_eq!(pdu.raw_length as usize, 3 + 171);
        match pdu.fields {
            Some(PduFields::Container(ref header)) => {
                assert_eq!(header.length, 3);
                assert_eq!(header.transaction_id, 9);
                assert!(header.source_id.is_broadcast());
            }
            ref other => panic!("unexpected fields: {other:?}"),
        }
        assert_eq!(pdu.nested_payload.as_deref(), Some(&[0x10, 0x20, 0x30][..]));
    }

    #[test]
    fn tx_packet_request_without_container_is_truncated() {
        let err = decode_pdu(&[0x03, 0x03, 0x00]).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn packet_filter_promiscuous_bit() {
        let pdu = decode_pdu(&[0x12, 0x04, 0x00, 0x01]).unwrap();
        assert_eq!(
            pdu.fields,
            Some(PduFields::PacketFilter {
                flags: 1,
                promiscuous: true
            })
        );
    }

    #[test]
    fn bus_change_leave_bit_is_inverted_logic() {
        for (flag, leave) in [(0x00u8, false), (0x01, true), (0xFE, false), (0xFF, true)] {
            let mut payload = container(vec![flag]).encode().unwrap();
            payload.truncate(45);
            let pdu = decode_pdu(&encode_pdu(CommandId::BusChange, &payload).unwrap()).unwrap();
            match pdu.fields {
                Some(PduFields::BusChange { leave: decoded, .. }) => assert_eq!(decoded, leave),
                other => panic!("unexpected fields: {other:?}"),
            }
            assert!(pdu.nested_payload.is_none());
        }
    }

    #[test]
    fn bus_state_event_reads_state_after_header() {
        let payload = container(vec![4]).encode().unwrap();
        let pdu = decode_pdu(&encode_pdu(CommandId::BusState, &payload).unwrap()).unwrap();
        match pdu.fields {
            Some(PduFields::BusStateEvent { state, .. }) => {
                assert_eq!(state, Symbol::Known(BusState::Active))
            }
            other => panic!("unexpected fields: {other:?}"),
        }
        let request = decode_pdu(&[0x25, 0x03, 0x00]).unwrap();
        assert_eq!(request.fields, Some(PduFields::Request));
    }

    #[test]
    fn invalid_bus_state_is_surfaced_not_fatal() {
        let pdu = decode_pdu(&[0x23, 0x04, 0x00, 0x09]).unwrap();
        assert_eq!(
            pdu.fields,
            Some(PduFields::BusState {
                state: Symbol::Unknown(9)
            })
        );
        assert_eq!(
            pdu.warnings,
            vec![DecodeWarning::InvalidFieldValue {
                field: "bus_state",
                value: 9
            }]
        );
    }

    #[test]
    fn query_dsuid_reads_one_dsid() {
        let mut bytes = vec![0x21, 15, 0x00];
        bytes.extend_from_slice(&[0xAB; 12]);
        let pdu = decode_pdu(&bytes).unwrap();
        assert_eq!(
            pdu.fields,
            Some(PduFields::DeviceId {
                dsid: Dsid::from_bytes([0xAB; 12])
            })
        );
    }

    #[test]
    fn deprecated_commands_are_recognized() {
        for command in [0x00u8, 0x05, 0x08, 0x10, 0x11, 0x13, 0x22] {
            let pdu = decode_pdu(&[command, 0x03, 0x00]).unwrap();
            assert!(pdu.command.is_deprecated());
            assert_eq!(pdu.fields, Some(PduFields::Deprecated));
        }
    }

    #[test]
    fn unknown_command_passes_payload_through() {
        let pdu = decode_pdu(&[0x99, 0x05, 0x00, 0xAA, 0xBB]).unwrap();
        assert_eq!(pdu.command, CommandId::Unknown(0x99));
        assert!(pdu.fields.is_none());
        assert_eq!(pdu.nested_payload, Some(vec![0xAA, 0xBB]));
    }

    #[test]
    fn decode_at_reports_consumed_bytes() {
        let buffer = [0x02, 0x03, 0x00, 0x23, 0x04, 0x00, 0x05];
        let (first, used) = decode_at(&buffer, 0).unwrap();
        assert_eq!(first.command, CommandId::Ping);
        assert_eq!(used, 3);
        let (second, used) = decode_at(&buffer, used).unwrap();
        assert_eq!(second.command, CommandId::QueryBusState);
        assert_eq!(used, 4);
    }

    #[test]
    fn nested_decoder_closure() {
        let pdu = decode_pdu(&[0x99, 0x05, 0x00, 0xAA, 0xBB]).unwrap();
        let len = pdu.decode_nested(&|_command: CommandId, payload: &[u8]| payload.len());
        assert_eq!(len, Some(2));
        let ping = decode_pdu(&[0x02, 0x03, 0x00]).unwrap();
        assert_eq!(ping.decode_nested(&|_: CommandId, p: &[u8]| p.len()), None);
    }

    #[test]
    fn record_serializes_with_names() {
        let pdu = decode_pdu(&[0x23, 0x04, 0x00, 0x03]).unwrap();
        let value = serde_json::to_value(&pdu).unwrap();
        assert_eq!(value["command"]["name"], "query bus state");
        assert_eq!(value["fields"]["kind"], "bus_state");
        assert_eq!(value["fields"]["state"]["name"], "connected");
        assert!(value.get("nested_payload").is_none());
    }
}
