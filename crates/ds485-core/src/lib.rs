//! ds485shark core library: dS485 daemon-socket decoding and offline capture
//! analysis.
//!
//! The protocol layer (`protocols`) is pure: bytes in, structured records
//! out, no I/O and no logging. Packet sources (`source`) own all file I/O.
//! The analysis layer ties them together: TCP segments from a capture are
//! reassembled into daemon PDUs per direction, decoded, and aggregated into a
//! deterministic [`Report`].
//!
//! Invariants:
//! - Report outputs are deterministic and stable across runs.
//! - One PDU reassembler per TCP direction; never shared.
//! - A malformed PDU is counted and reported, never fatal to the analysis.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use ds485_core::analyze_pcap_file;
//!
//! let report = analyze_pcap_file(Path::new("capture.pcapng"))?;
//! println!("streams: {}", report.streams.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod analysis;
pub mod protocols;
pub mod source;

pub use analysis::{
    AnalysisConfig, AnalysisError, analyze_pcap_file, analyze_pcap_file_with, analyze_source,
};
pub use source::{ChunkSource, PacketEvent, PacketSource, PcapFileSource, ReaderSource, SourceError};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";
/// Tool name embedded in reports.
pub const TOOL_NAME: &str = "ds485shark";

/// Aggregated analysis report with deterministic ordering.
///
/// # Examples
/// ```
/// use ds485_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.report_version, ds485_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    pub tool: ToolInfo,
    /// RFC3339 timestamp: the last capture timestamp, or the epoch.
    pub generated_at: String,
    pub input: InputInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_summary: Option<CaptureSummary>,
    /// One entry per TCP direction carrying daemon traffic, sorted by
    /// `src` then `dst`.
    pub streams: Vec<StreamSummary>,
    /// Sorted by command byte.
    pub commands: Vec<CommandSummary>,
    /// Sorted by kind then id.
    pub devices: Vec<DeviceSummary>,
    /// Sorted by state value.
    pub bus_states: Vec<BusStateSummary>,
    pub bus_changes: BusChangeSummary,
    /// Sorted by message id.
    pub api_messages: Vec<ApiMessageSummary>,
    pub compliance: Vec<ComplianceSummary>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
///
/// # Examples
/// ```
/// use ds485_core::InputInfo;
///
/// let input = InputInfo {
///     path: "capture.pcapng".to_string(),
///     bytes: 1024,
/// };
/// assert_eq!(input.bytes, 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    pub bytes: u64,
}

/// Basic capture summary (timestamps may be absent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Total packet count observed in the capture.
    pub packets_total: u64,
    /// TCP segments on a daemon port, payload or not.
    pub ds485_segments: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Per-direction daemon stream counters.
///
/// # Examples
/// ```
/// use ds485_core::StreamSummary;
///
/// let stream = StreamSummary {
///     src: "10.0.0.1:8440".to_string(),
///     dst: "10.0.0.2:50000".to_string(),
///     segments: 2,
///     bytes: 7,
///     pdus: 2,
///     decode_errors: 0,
///     retransmitted_bytes: 0,
///     gaps: 0,
///     leftover_bytes: 0,
/// };
/// assert_eq!(stream.pdus, 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Source endpoint in `ip:port` form.
    pub src: String,
    /// Destination endpoint in `ip:port` form.
    pub dst: String,
    /// Segments carrying payload.
    pub segments: u64,
    /// Payload bytes fed to the reassembler.
    pub bytes: u64,
    pub pdus: u64,
    pub decode_errors: u64,
    /// Payload bytes dropped because they were already delivered.
    pub retransmitted_bytes: u64,
    /// Sequence jumps forward; each one resets the reassembler.
    pub gaps: u64,
    /// Bytes still buffered at the end of the capture.
    pub leftover_bytes: u64,
}

/// Per-command PDU counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandSummary {
    /// Raw command byte.
    pub command: u8,
    /// Symbolic name, `unknown(0xNN)` when unmapped.
    pub name: String,
    pub count: u64,
    /// PDUs that failed to decode.
    pub errors: u64,
    pub deprecated: bool,
}

/// A device identifier seen on the wire.
///
/// # Examples
/// ```
/// use ds485_core::DeviceSummary;
///
/// let device = DeviceSummary {
///     kind: "dsid".to_string(),
///     id: "00".repeat(12),
///     count: 1,
/// };
/// assert_eq!(device.id.len(), 24);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    /// `dsid` (12-byte, from device queries) or `dsuid` (17-byte, from
    /// container source ids).
    pub kind: String,
    /// Lowercase hex.
    pub id: String,
    pub count: u64,
}

/// Bus state observations from query responses and state events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusStateSummary {
    pub state: u8,
    pub name: String,
    pub count: u64,
}

/// dSM join/leave events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusChangeSummary {
    pub joins: u64,
    pub leaves: u64,
}

/// dSM API message ids found in nested container payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessageSummary {
    pub message_id: u8,
    pub count: u64,
}

/// Compliance summary for a protocol.
///
/// # Examples
/// ```
/// use ds485_core::{ComplianceSummary, Violation};
///
/// let summary = ComplianceSummary {
///     protocol: "ds485".to_string(),
///     compliance_percentage: 50.0,
///     violations: vec![Violation {
///         id: "DS-TRUNCATED".to_string(),
///         severity: "error".to_string(),
///         message: "Truncated PDU".to_string(),
///         count: 1,
///         examples: Vec::new(),
///     }],
/// };
/// assert_eq!(summary.violations.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceSummary {
    pub protocol: String,
    /// Share of PDUs without any violation (0.0–100.0).
    pub compliance_percentage: f64,
    /// Violations sorted by severity and ID.
    pub violations: Vec<Violation>,
}

/// Single compliance violation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Stable violation identifier (e.g., `DS-TRUNCATED`).
    pub id: String,
    /// Severity label (`error` or `warning`).
    pub severity: String,
    pub message: String,
    /// Number of occurrences aggregated into this violation.
    pub count: u64,
    /// A bounded number of example contexts, formatted as
    /// `stream src -> dst @ ts`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Build a stub report with base fields filled and empty aggregates.
///
/// # Examples
/// ```
/// use ds485_core::make_stub_report;
///
/// let report = make_stub_report("capture.pcapng", 123);
/// assert_eq!(report.tool.name, "ds485shark");
/// assert!(report.streams.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        capture_summary: None,
        streams: vec![],
        commands: vec![],
        devices: vec![],
        bus_states: vec![],
        bus_changes: BusChangeSummary::default(),
        api_messages: vec![],
        compliance: vec![],
    }
}
