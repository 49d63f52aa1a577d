use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    is_pcapng_magic, legacy_ts_to_seconds, linktype_for_interface, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

const LEGACY: &str = "pcap";
const NG: &str = "pcapng";

/// `PacketSource` over a PCAP or PCAPNG file, detected from the magic bytes.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
        nanosecond: bool,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        Ok(next_packet(&mut self.inner)?)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::parse(NG, "init", e))?;
        Ok(PcapReader::Ng {
            reader,
            linktypes: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| PcapSourceError::parse(LEGACY, "init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
            nanosecond: false,
        })
    }
}

fn next_packet(reader: &mut PcapReader) -> Result<Option<PacketEvent>, PcapSourceError> {
    match reader {
        PcapReader::Legacy {
            reader,
            linktype,
            nanosecond,
        } => drive(reader, LEGACY, |block| match block {
            PcapBlockOwned::LegacyHeader(header) => {
                tracing::debug!(linktype = ?header.network, "pcap header");
                *linktype = Some(header.network);
                *nanosecond = header.is_nanosecond_precision();
                None
            }
            PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                ts: Some(legacy_ts_to_seconds(
                    packet.ts_sec,
                    packet.ts_usec,
                    *nanosecond,
                )),
                linktype: linktype.unwrap_or(Linktype::ETHERNET),
                data: packet.data.to_vec(),
            }),
            _ => None,
        }),
        PcapReader::Ng { reader, linktypes } => drive(reader, NG, |block| match block {
            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                tracing::debug!(linktype = ?intf.linktype, "pcapng interface");
                linktypes.push(intf.linktype);
                None
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(PacketEvent {
                ts: Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low)),
                linktype: linktype_for_interface(linktypes, packet.if_id),
                data: packet.data.to_vec(),
            }),
            _ => None,
        }),
    }
}

/// Pull blocks until `on_block` turns one into a packet, refilling the
/// reader buffer as needed.
fn drive<R, F>(
    reader: &mut R,
    format: &'static str,
    mut on_block: F,
) -> Result<Option<PacketEvent>, PcapSourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| PcapSourceError::parse(format, "refill", e))?;
            }
            Err(e) => return Err(PcapSourceError::parse(format, "next", e)),
        }
    }
}
