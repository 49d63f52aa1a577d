use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::protocols::daemon::layout::DEFAULT_PORTS;
use crate::protocols::daemon::{DaemonError, decode_pdu};
use crate::source::{PacketEvent, PacketSource, PcapFileSource, SourceError};
use crate::{CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod commands;
mod compliance;
mod devices;
mod streams;
mod tcp;

use commands::PduStats;
use compliance::{ComplianceStats, ViolationKind};
use devices::DeviceStats;
use streams::{StreamKey, StreamState, build_stream_summaries};
use tcp::{TcpSegment, parse_tcp_segment};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Analysis knobs.
///
/// # Examples
/// ```
/// use ds485_core::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert!(config.ports.contains(&8440));
/// assert_eq!(config.max_examples, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// A segment is daemon traffic when either port is listed. Empty means
    /// every TCP segment.
    pub ports: Vec<u16>,
    /// Example contexts kept per violation.
    pub max_examples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            max_examples: 3,
        }
    }
}

impl AnalysisConfig {
    fn matches(&self, segment: &TcpSegment<'_>) -> bool {
        self.ports.is_empty()
            || self.ports.contains(&segment.src_port)
            || self.ports.contains(&segment.dst_port)
    }
}

pub fn analyze_pcap_file(path: &Path) -> Result<Report, AnalysisError> {
    analyze_pcap_file_with(path, &AnalysisConfig::default())
}

pub fn analyze_pcap_file_with(
    path: &Path,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let source = PcapFileSource::open(path)?;
    analyze_source(path, source, config)
}

pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    config: &AnalysisConfig,
) -> Result<Report, AnalysisError> {
    let mut packets_total = 0u64;
    let mut ds485_segments = 0u64;
    let mut first_ts = None;
    let mut last_ts = None;
    let mut streams: HashMap<StreamKey, StreamState> = HashMap::new();
    let mut aggregates = Aggregates::new(config.max_examples);

    while let Some(PacketEvent { ts, linktype, data }) = source.next_packet()? {
        packets_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);
        let segment = match parse_tcp_segment(linktype, &data) {
            Ok(Some(segment)) if config.matches(&segment) => segment,
            Ok(_) => continue,
            Err(err) => {
                tracing::debug!(packet = packets_total, error = %err, "skipping packet");
                continue;
            }
        };
        ds485_segments += 1;

        let key = StreamKey::of(&segment);
        let state = streams.entry(key).or_insert_with(|| {
            tracing::debug!(stream = %key, "new daemon stream");
            StreamState::default()
        });
        let results: Vec<_> = match state.accept(&segment) {
            Some(pdus) => pdus.collect(),
            None => continue,
        };
        for result in results {
            match result {
                Ok(pdu) => {
                    state.pdus += 1;
                    if !aggregates.on_pdu(&pdu, &key, ts) {
                        state.decode_errors += 1;
                    }
                }
                Err(err) => {
                    state.decode_errors += 1;
                    aggregates.on_stream_error(&err, &key, ts);
                }
            }
        }
    }

    for (key, state) in &streams {
        let leftover = state.reassembler.buffered_len();
        if leftover > 0 {
            tracing::warn!(stream = %key, leftover, "capture ended inside a daemon PDU");
            aggregates
                .compliance
                .record_stream_incomplete(&example_context(key, last_ts));
        }
    }

    let mut report = make_stub_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        ds485_segments,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());

    report.streams = build_stream_summaries(&streams);
    report.commands = aggregates.pdus.build_command_summaries();
    report.bus_states = aggregates.pdus.build_bus_state_summaries();
    report.bus_changes = aggregates.pdus.bus_changes();
    report.api_messages = aggregates.pdus.build_api_message_summaries();
    report.devices = aggregates.devices.build_summaries();
    report.compliance = aggregates.compliance.build_summaries();
    Ok(report)
}

/// Everything derived from decoded PDUs, across streams.
struct Aggregates {
    pdus: PduStats,
    devices: DeviceStats,
    compliance: ComplianceStats,
}

impl Aggregates {
    fn new(max_examples: usize) -> Self {
        Self {
            pdus: PduStats::default(),
            devices: DeviceStats::default(),
            compliance: ComplianceStats::new(max_examples),
        }
    }

    /// Decode one reassembled PDU. Returns false when decoding failed.
    fn on_pdu(&mut self, bytes: &[u8], key: &StreamKey, ts: Option<f64>) -> bool {
        match decode_pdu(bytes) {
            Ok(pdu) => {
                tracing::debug!(
                    stream = %key,
                    command = %pdu.command,
                    length = pdu.raw_length,
                    "daemon PDU"
                );
                let kinds = self
                    .compliance
                    .record_pdu(&pdu, &example_context(key, ts));
                if kinds.contains(&ViolationKind::DevicesTrailing) {
                    tracing::warn!(
                        stream = %key,
                        "device list ends in a partial dSID entry"
                    );
                }
                self.pdus.record(&pdu);
                self.devices.record(&pdu);
                true
            }
            Err(err) => {
                let command = bytes.first().copied().unwrap_or_default();
                tracing::warn!(stream = %key, command, error = %err, "daemon PDU decode failed");
                self.pdus.record_error(command);
                self.compliance.record_error(&err, &example_context(key, ts));
                false
            }
        }
    }

    /// Reassembler-level failure: no PDU boundary to attribute it to.
    fn on_stream_error(&mut self, err: &DaemonError, key: &StreamKey, ts: Option<f64>) {
        self.compliance.record_error(err, &example_context(key, ts));
    }
}

fn example_context(key: &StreamKey, ts: Option<f64>) -> String {
    let ts = ts_to_rfc3339(ts).unwrap_or_else(|| "unknown".to_string());
    format!("stream {key} @ {ts}")
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let ts = match ts {
        Some(ts) => ts,
        None => return,
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
