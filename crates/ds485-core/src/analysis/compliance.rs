use std::collections::HashMap;

use crate::protocols::daemon::{DaemonError, DecodeWarning, DecodedPdu};
use crate::protocols::ds485::Ds485Error;
use crate::{ComplianceSummary, Violation};

pub(crate) const PROTOCOL: &str = "ds485";

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ViolationKind {
    Truncated,
    InvalidPduLength,
    ContainerLength,
    UnknownCommand,
    DevicesTrailing,
    TrailingBytes,
    InvalidField,
    DeprecatedCommand,
    StreamIncomplete,
}

impl ViolationKind {
    pub(crate) fn id(self) -> &'static str {
        match self {
            ViolationKind::Truncated => "DS-TRUNCATED",
            ViolationKind::InvalidPduLength => "DS-INVALID-PDU-LENGTH",
            ViolationKind::ContainerLength => "DS-CONTAINER-LENGTH",
            ViolationKind::UnknownCommand => "DS-UNKNOWN-COMMAND",
            ViolationKind::DevicesTrailing => "DS-DEVICES-TRAILING",
            ViolationKind::TrailingBytes => "DS-TRAILING-BYTES",
            ViolationKind::InvalidField => "DS-INVALID-FIELD",
            ViolationKind::DeprecatedCommand => "DS-DEPRECATED-COMMAND",
            ViolationKind::StreamIncomplete => "DS-STREAM-INCOMPLETE",
        }
    }

    fn severity(self) -> &'static str {
        match self {
            ViolationKind::Truncated
            | ViolationKind::InvalidPduLength
            | ViolationKind::ContainerLength => "error",
            _ => "warning",
        }
    }

    fn message(self) -> &'static str {
        match self {
            ViolationKind::Truncated => "PDU or container shorter than its structure requires",
            ViolationKind::InvalidPduLength => "Declared PDU length below the 3-byte header",
            ViolationKind::ContainerLength => "Container length exceeds payload capacity",
            ViolationKind::UnknownCommand => "Unknown daemon command byte",
            ViolationKind::DevicesTrailing => {
                "Device list length is not a multiple of the dSID size"
            }
            ViolationKind::TrailingBytes => "Extra bytes after a fixed-size response",
            ViolationKind::InvalidField => "Field value outside its defined range",
            ViolationKind::DeprecatedCommand => "Deprecated daemon command",
            ViolationKind::StreamIncomplete => "Stream ended inside a PDU",
        }
    }

    pub(crate) fn of_error(err: &DaemonError) -> Self {
        match err {
            DaemonError::TruncatedPacket { .. }
            | DaemonError::Container(Ds485Error::TruncatedPacket { .. }) => {
                ViolationKind::Truncated
            }
            DaemonError::InvalidPduLength { .. } | DaemonError::PayloadTooLarge { .. } => {
                ViolationKind::InvalidPduLength
            }
            DaemonError::Container(Ds485Error::InvalidLength { .. }) => {
                ViolationKind::ContainerLength
            }
            DaemonError::Container(_) => ViolationKind::InvalidField,
        }
    }

    pub(crate) fn of_warning(warning: &DecodeWarning) -> Self {
        match warning {
            DecodeWarning::TrailingDeviceBytes { .. } => ViolationKind::DevicesTrailing,
            DecodeWarning::TrailingBytes { .. } => ViolationKind::TrailingBytes,
            DecodeWarning::InvalidFieldValue { .. } => ViolationKind::InvalidField,
        }
    }
}

#[derive(Debug, Default)]
struct ViolationCounts {
    count: u64,
    examples: Vec<String>,
}

/// Violation counters plus the PDU totals behind the compliance percentage.
#[derive(Debug)]
pub(crate) struct ComplianceStats {
    max_examples: usize,
    pdus_total: u64,
    pdus_flagged: u64,
    violations: HashMap<ViolationKind, ViolationCounts>,
}

impl ComplianceStats {
    pub(crate) fn new(max_examples: usize) -> Self {
        Self {
            max_examples,
            pdus_total: 0,
            pdus_flagged: 0,
            violations: HashMap::new(),
        }
    }

    /// Account for a decoded PDU. Returns the violations it raised.
    pub(crate) fn record_pdu(&mut self, pdu: &DecodedPdu, context: &str) -> Vec<ViolationKind> {
        let mut kinds = Vec::new();
        if pdu.command.is_unknown() {
            kinds.push(ViolationKind::UnknownCommand);
        }
        if pdu.command.is_deprecated() {
            kinds.push(ViolationKind::DeprecatedCommand);
        }
        kinds.extend(pdu.warnings.iter().map(ViolationKind::of_warning));
        kinds.sort();
        kinds.dedup();

        self.pdus_total += 1;
        if !kinds.is_empty() {
            self.pdus_flagged += 1;
        }
        for kind in &kinds {
            self.add(*kind, context);
        }
        kinds
    }

    /// Account for a PDU that could not be decoded.
    pub(crate) fn record_error(&mut self, err: &DaemonError, context: &str) {
        self.pdus_total += 1;
        self.pdus_flagged += 1;
        self.add(ViolationKind::of_error(err), context);
    }

    /// Not tied to a PDU; leaves the percentage unchanged.
    pub(crate) fn record_stream_incomplete(&mut self, context: &str) {
        self.add(ViolationKind::StreamIncomplete, context);
    }

    fn add(&mut self, kind: ViolationKind, context: &str) {
        let entry = self.violations.entry(kind).or_default();
        entry.count += 1;
        if entry.examples.len() < self.max_examples {
            entry.examples.push(context.to_string());
        }
    }

    pub(crate) fn build_summaries(self) -> Vec<ComplianceSummary> {
        if self.pdus_total == 0 && self.violations.is_empty() {
            return Vec::new();
        }
        let compliance_percentage = if self.pdus_total == 0 {
            100.0
        } else {
            (self.pdus_total - self.pdus_flagged) as f64 / self.pdus_total as f64 * 100.0
        };

        let mut violations: Vec<(ViolationKind, ViolationCounts)> =
            self.violations.into_iter().collect();
        violations.sort_by(|(a, _), (b, _)| {
            a.severity()
                .cmp(b.severity())
                .then_with(|| a.id().cmp(b.id()))
        });

        vec![ComplianceSummary {
            protocol: PROTOCOL.to_string(),
            compliance_percentage,
            violations: violations
                .into_iter()
                .map(|(kind, counts)| Violation {
                    id: kind.id().to_string(),
                    severity: kind.severity().to_string(),
                    message: kind.message().to_string(),
                    count: counts.count,
                    examples: counts.examples,
                })
                .collect(),
        }]
    }
}
