use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::TcpError;
use super::reader::TcpReader;

/// Parsed TCP segment with endpoints and the flags stream tracking needs.
pub struct TcpSegment<'a> {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub sequence: u32,
    pub syn: bool,
    pub payload: &'a [u8],
}

/// Parse a TCP segment from a link-layer frame.
///
/// Returns `Ok(None)` when the packet does not carry TCP.
pub fn parse_tcp_segment(
    linktype: Linktype,
    data: &[u8],
) -> Result<Option<TcpSegment<'_>>, TcpError> {
    let sliced = match linktype {
        Linktype::ETHERNET => {
            SlicedPacket::from_ethernet(data).map_err(|e| TcpError::Slice(e.to_string()))?
        }
        Linktype::RAW => SlicedPacket::from_ip(data).map_err(|e| TcpError::Slice(e.to_string()))?,
        _ => return Ok(None),
    };

    let net = sliced.net.ok_or(TcpError::MissingNetworkLayer)?;
    let tcp = match sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => tcp,
        _ => return Ok(None),
    };

    let (src_ip, dst_ip) = match net {
        NetSlice::Ipv4(ref ipv4) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        NetSlice::Ipv6(ref ipv6) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
    };

    let ip_payload = net.ip_payload_ref().ok_or(TcpError::MissingIpPayload)?;
    let payload = TcpReader::new(ip_payload.payload).payload_without_header()?;

    Ok(Some(TcpSegment {
        src_ip,
        src_port: tcp.source_port(),
        dst_ip,
        dst_port: tcp.destination_port(),
        sequence: tcp.sequence_number(),
        syn: tcp.syn(),
        payload,
    }))
}
