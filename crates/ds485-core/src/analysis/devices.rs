use std::collections::HashMap;

use crate::DeviceSummary;
use crate::protocols::daemon::{DecodedPdu, PduFields};
use crate::protocols::ds485::Dsuid;

const KIND_DSID: &str = "dsid";
const KIND_DSUID: &str = "dsuid";

/// Device identifiers observed in query responses and packet sources.
#[derive(Debug, Default)]
pub(crate) struct DeviceStats {
    seen: HashMap<(&'static str, String), u64>,
}

impl DeviceStats {
    pub(crate) fn record(&mut self, pdu: &DecodedPdu) {
        match &pdu.fields {
            Some(PduFields::Devices { dsids }) => {
                for dsid in dsids {
                    self.add(KIND_DSID, dsid.to_string());
                }
            }
            Some(PduFields::DeviceId { dsid }) => self.add(KIND_DSID, dsid.to_string()),
            Some(PduFields::Container(header)) => self.add_dsuid(&header.source_id),
            Some(PduFields::LongPacket(header)) => self.add_dsuid(&header.source_id),
            Some(PduFields::BusChange { container, .. })
            | Some(PduFields::BusStateEvent { container, .. }) => {
                self.add_dsuid(&container.source_id)
            }
            _ => {}
        }
    }

    /// Sentinel ids name no particular device.
    fn add_dsuid(&mut self, dsuid: &Dsuid) {
        if !dsuid.is_null() && !dsuid.is_broadcast() {
            self.add(KIND_DSUID, dsuid.to_string());
        }
    }

    fn add(&mut self, kind: &'static str, id: String) {
        *self.seen.entry((kind, id)).or_default() += 1;
    }

    pub(crate) fn build_summaries(&self) -> Vec<DeviceSummary> {
        let mut devices: Vec<DeviceSummary> = self
            .seen
            .iter()
            .map(|((kind, id), &count)| DeviceSummary {
                kind: kind.to_string(),
                id: id.clone(),
                count,
            })
            .collect();
        devices.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));
        devices
    }
}
