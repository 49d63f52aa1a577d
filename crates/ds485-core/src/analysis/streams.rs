use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use crate::StreamSummary;
use crate::protocols::daemon::{PduReassembler, Pdus};

use super::tcp::TcpSegment;

/// One TCP direction.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub(crate) struct StreamKey {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
}

impl StreamKey {
    pub(crate) fn of(segment: &TcpSegment<'_>) -> Self {
        Self {
            src_ip: segment.src_ip,
            src_port: segment.src_port,
            dst_ip: segment.dst_ip,
            dst_port: segment.dst_port,
        }
    }

    pub(crate) fn src(&self) -> String {
        format_endpoint(self.src_ip, self.src_port)
    }

    pub(crate) fn dst(&self) -> String {
        format_endpoint(self.dst_ip, self.dst_port)
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src(), self.dst())
    }
}

/// Reassembly state and counters for one direction.
#[derive(Debug, Default)]
pub(crate) struct StreamState {
    pub reassembler: PduReassembler,
    next_seq: Option<u32>,
    pub segments: u64,
    pub bytes: u64,
    pub pdus: u64,
    pub decode_errors: u64,
    pub retransmitted_bytes: u64,
    pub gaps: u64,
}

impl StreamState {
    /// Trim `segment` to the bytes not yet delivered and feed them to the
    /// reassembler.
    ///
    /// SYN starts a new stream and drops whatever was buffered. A sequence
    /// jump forward means lost bytes; the buffer can no longer be trusted and
    /// is dropped too.
    pub(crate) fn accept<'s>(&'s mut self, segment: &TcpSegment<'_>) -> Option<Pdus<'s>> {
        let mut start = segment.sequence;
        if segment.syn {
            if self.reassembler.buffered_len() > 0 {
                tracing::debug!(
                    buffered = self.reassembler.buffered_len(),
                    "SYN on active stream; resetting"
                );
            }
            self.reassembler.reset();
            start = start.wrapping_add(1);
            self.next_seq = Some(start);
        }

        let payload = segment.payload;
        if payload.is_empty() {
            return None;
        }
        let end = start.wrapping_add(payload.len() as u32);

        let fresh = match self.next_seq {
            None => payload,
            Some(expected) => {
                let delta = start.wrapping_sub(expected) as i32;
                if delta < 0 {
                    let overlap = (delta as i64).unsigned_abs() as usize;
                    if overlap >= payload.len() {
                        self.retransmitted_bytes += payload.len() as u64;
                        return None;
                    }
                    self.retransmitted_bytes += overlap as u64;
                    &payload[overlap..]
                } else {
                    if delta > 0 {
                        tracing::warn!(
                            missing = delta,
                            dropped = self.reassembler.buffered_len(),
                            "sequence gap in daemon stream; resetting reassembler"
                        );
                        self.gaps += 1;
                        self.reassembler.reset();
                    }
                    payload
                }
            }
        };

        self.next_seq = Some(end);
        self.segments += 1;
        self.bytes += fresh.len() as u64;
        Some(self.reassembler.push(fresh))
    }
}

pub(crate) fn build_stream_summaries(streams: &HashMap<StreamKey, StreamState>) -> Vec<StreamSummary> {
    let mut summaries: Vec<StreamSummary> = streams
        .iter()
        .map(|(key, state)| StreamSummary {
            src: key.src(),
            dst: key.dst(),
            segments: state.segments,
            bytes: state.bytes,
            pdus: state.pdus,
            decode_errors: state.decode_errors,
            retransmitted_bytes: state.retransmitted_bytes,
            gaps: state.gaps,
            leftover_bytes: state.reassembler.buffered_len() as u64,
        })
        .collect();

    summaries.sort_by(|a, b| a.src.cmp(&b.src).then_with(|| a.dst.cmp(&b.dst)));
    summaries
}

fn format_endpoint(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(addr) => format!("{}:{}", addr, port),
        IpAddr::V6(addr) => format!("[{}]:{}", addr, port),
    }
}
