use std::collections::HashMap;

use crate::protocols::daemon::{CommandId, DecodedPdu, NestedPayloadDecoder, PduFields};
use crate::protocols::names::{BusState, Symbol};
use crate::{ApiMessageSummary, BusChangeSummary, BusStateSummary, CommandSummary};

/// Reads the dSM API message id: the first data byte of a bus packet. The
/// transaction id travels in the container header.
pub(crate) struct ApiMessageId;

impl NestedPayloadDecoder for ApiMessageId {
    type Output = Option<u8>;

    fn decode(&self, command: CommandId, payload: &[u8]) -> Option<u8> {
        match command {
            CommandId::TxPacket
            | CommandId::RxPacket
            | CommandId::LongTxPacket
            | CommandId::LongRxPacket => payload.first().copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CommandCounts {
    count: u64,
    errors: u64,
}

/// Per-command, bus state and API message counters.
#[derive(Debug, Default)]
pub(crate) struct PduStats {
    commands: HashMap<u8, CommandCounts>,
    bus_states: HashMap<u8, u64>,
    bus_changes: BusChangeSummary,
    api_messages: HashMap<u8, u64>,
}

impl PduStats {
    pub(crate) fn record(&mut self, pdu: &DecodedPdu) {
        self.commands.entry(pdu.command.as_u8()).or_default().count += 1;

        match &pdu.fields {
            Some(PduFields::BusState { state }) | Some(PduFields::BusStateEvent { state, .. }) => {
                self.record_bus_state(*state);
            }
            Some(PduFields::BusChange { leave, .. }) => {
                if *leave {
                    self.bus_changes.leaves += 1;
                } else {
                    self.bus_changes.joins += 1;
                }
            }
            _ => {}
        }

        if let Some(Some(message_id)) = pdu.decode_nested(&ApiMessageId) {
            *self.api_messages.entry(message_id).or_default() += 1;
        }
    }

    /// A PDU whose envelope was read but whose body failed to decode.
    pub(crate) fn record_error(&mut self, command: u8) {
        let counts = self.commands.entry(command).or_default();
        counts.count += 1;
        counts.errors += 1;
    }

    fn record_bus_state(&mut self, state: Symbol<BusState>) {
        *self.bus_states.entry(state.raw() as u8).or_default() += 1;
    }

    pub(crate) fn build_command_summaries(&self) -> Vec<CommandSummary> {
        let mut summaries: Vec<CommandSummary> = self
            .commands
            .iter()
            .map(|(&command, counts)| {
                let id = CommandId::from_u8(command);
                CommandSummary {
                    command,
                    name: id.name().into_owned(),
                    count: counts.count,
                    errors: counts.errors,
                    deprecated: id.is_deprecated(),
                }
            })
            .collect();
        summaries.sort_by_key(|summary| summary.command);
        summaries
    }

    pub(crate) fn build_bus_state_summaries(&self) -> Vec<BusStateSummary> {
        let mut summaries: Vec<BusStateSummary> = self
            .bus_states
            .iter()
            .map(|(&state, &count)| BusStateSummary {
                state,
                name: Symbol::<BusState>::from_raw(state.into()).name().into_owned(),
                count,
            })
            .collect();
        summaries.sort_by_key(|summary| summary.state);
        summaries
    }

    pub(crate) fn bus_changes(&self) -> BusChangeSummary {
        self.bus_changes.clone()
    }

    pub(crate) fn build_api_message_summaries(&self) -> Vec<ApiMessageSummary> {
        let mut summaries: Vec<ApiMessageSummary> = self
            .api_messages
            .iter()
            .map(|(&message_id, &count)| ApiMessageSummary { message_id, count })
            .collect();
        summaries.sort_by_key(|summary| summary.message_id);
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::daemon::decode_pdu;

    #[test]
    fn api_message_id_only_for_bus_packets() {
        assert_eq!(ApiMessageId.decode(CommandId::RxPacket, &[0x42, 0x01]), Some(0x42));
        assert_eq!(ApiMessageId.decode(CommandId::RxPacket, &[]), None);
        assert_eq!(ApiMessageId.decode(CommandId::Unknown(0x99), &[0x42]), None);
    }

    #[test]
    fn commands_and_bus_states_are_counted() {
        let mut stats = PduStats::default();
        stats.record(&decode_pdu(&[0x23, 0x04, 0x00, 0x03]).unwrap());
        stats.record(&decode_pdu(&[0x23, 0x04, 0x00, 0x03]).unwrap());
        stats.record(&decode_pdu(&[0x02, 0x03, 0x00]).unwrap());
        stats.record(&decode_pdu(&[0x23, 0x04, 0x00, 0x09]).unwrap());
        stats.record_error(0x04);

        let commands = stats.build_command_summaries();
        assert_eq!(
            commands.iter().map(|c| c.command).collect::<Vec<_>>(),
            vec![0x02, 0x04, 0x23]
        );
        assert_eq!(commands[1].errors, 1);
        assert_eq!(commands[2].count, 3);
        assert_eq!(commands[2].name, "query bus state");

        let states = stats.build_bus_state_summaries();
        assert_eq!(states.len(), 2);
        assert_eq!(states[0].name, "connected");
        assert_eq!(states[0].count, 2);
        assert_eq!(states[1].name, "unknown(0x09)");
    }
}
