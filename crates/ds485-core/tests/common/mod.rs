#![allow(dead_code)]

use std::fs;
use std::path::Path;

use etherparse::PacketBuilder;

/// Write an Ethernet PCAPNG capture; timestamps in microseconds.
pub fn write_pcapng(path: &Path, packets: &[(u64, Vec<u8>)]) {
    let mut output = Vec::new();
    output.extend_from_slice(&pcapng_block(0x0A0D0D0A, &section_header_body()));
    output.extend_from_slice(&pcapng_block(1, &interface_desc_body()));
    for (ts_us, data) in packets {
        output.extend_from_slice(&pcapng_block(6, &enhanced_packet_body(*ts_us, data)));
    }
    fs::write(path, output).expect("write pcapng");
}

fn pcapng_block(block_type: u32, body: &[u8]) -> Vec<u8> {
    let total_len = (8 + body.len() + 4) as u32;
    let mut block = Vec::with_capacity(total_len as usize);
    block.extend_from_slice(&block_type.to_be_bytes());
    block.extend_from_slice(&total_len.to_be_bytes());
    block.extend_from_slice(body);
    block.extend_from_slice(&total_len.to_be_bytes());
    block
}

fn section_header_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&0x1A2B3C4Du32.to_be_bytes());
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&(-1i64).to_be_bytes());
    body
}

fn interface_desc_body() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&1u16.to_be_bytes());
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend_from_slice(&65535u32.to_be_bytes());
    body
}

fn enhanced_packet_body(ts_us: u64, data: &[u8]) -> Vec<u8> {
    let ts_high = (ts_us >> 32) as u32;
    let ts_low = (ts_us & 0xFFFF_FFFF) as u32;
    let cap_len = data.len() as u32;
    let mut body = Vec::new();
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&ts_high.to_be_bytes());
    body.extend_from_slice(&ts_low.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(&cap_len.to_be_bytes());
    body.extend_from_slice(data);
    let pad_len = (4 - (data.len() % 4)) % 4;
    body.extend(std::iter::repeat_n(0u8, pad_len));
    body
}

/// One TCP direction; tracks the next sequence number.
pub struct TcpFlow {
    pub src: [u8; 4],
    pub dst: [u8; 4],
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
}

impl TcpFlow {
    pub fn new(src_port: u16, dst_port: u16, seq: u32) -> Self {
        Self {
            src: [10, 0, 0, 1],
            dst: [10, 0, 0, 2],
            src_port,
            dst_port,
            seq,
        }
    }

    pub fn syn(&mut self) -> Vec<u8> {
        let packet = self.build(self.seq, &[], true);
        self.seq = self.seq.wrapping_add(1);
        packet
    }

    pub fn data(&mut self, payload: &[u8]) -> Vec<u8> {
        let packet = self.build(self.seq, payload, false);
        self.seq = self.seq.wrapping_add(payload.len() as u32);
        packet
    }

    /// Segment at an explicit sequence number, leaving the flow untouched.
    pub fn at(&self, seq: u32, payload: &[u8]) -> Vec<u8> {
        self.build(seq, payload, false)
    }

    fn build(&self, seq: u32, payload: &[u8], syn: bool) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2([1, 2, 3, 4, 5, 6], [7, 8, 9, 10, 11, 12])
            .ipv4(self.src, self.dst, 64)
            .tcp(self.src_port, self.dst_port, seq, 4096);
        let builder = if syn { builder.syn() } else { builder.psh() };
        let mut packet = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut packet, payload).expect("build tcp packet");
        packet
    }
}

/// Packed 171-byte container with the given source id byte and data.
pub fn container(source: u8, container_type: u32, data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 171];
    out[17..34].fill(source);
    out[34..38].copy_from_slice(&container_type.to_le_bytes());
    out[38..42].copy_from_slice(&1u32.to_le_bytes());
    out[42] = data.len() as u8;
    out[43] = 7;
    out[44..44 + data.len()].copy_from_slice(data);
    out
}

/// Daemon envelope around `payload`.
pub fn pdu(command: u8, payload: &[u8]) -> Vec<u8> {
    let total = (3 + payload.len()) as u16;
    let mut out = vec![command];
    out.extend_from_slice(&total.to_le_bytes());
    out.extend_from_slice(payload);
    out
}
