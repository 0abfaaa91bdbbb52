//! Packet acquisition via rtshark and helpers that turn tshark fields into [PacketRecord]s.
use rtshark::{Packet, RTShark};
use std::net::IpAddr;
use crate::error::{CaptureError, Result};
use super::containers::{Direction, PacketRecord};

/// Capture topology of the obfuscation test harness.
pub const DEFAULT_CLIENT_IP: &str = "172.25.0.20";

fn spawn(filepath: &str) -> Result<RTShark> {
    let builder = rtshark::RTSharkBuilder::builder().input_path(filepath);

    match builder.spawn() {
        Err(err) => {
            log::error!("Error spawning tshark: {err}");
            Err(CaptureError::Spawn(err))
        }
        Ok(rtshark) => {
            log::info!("Reading from {}", filepath);
            Ok(rtshark)
        }
    }
}

/// Source address of a packet's IPv4 or IPv6 layer, if it has one.
fn source_address(packet: &Packet) -> Option<IpAddr> {
    let src = match packet.layer_name("ip") {
        Some(ip) => ip.metadata("ip.src"),
        None => packet.layer_name("ipv6")?.metadata("ipv6.src"),
    }?;

    src.value().parse().ok()
}

/// Builds a [PacketRecord] from the raw tshark fields of one frame.
///
/// Frames without a timestamp or a parseable length are dropped. Anything not sent by
/// `client_ip`, including frames without an IP layer, counts as inbound.
pub fn to_record(
    timestamp_micros: Option<i64>,
    frame_len: Option<&str>,
    source: Option<IpAddr>,
    client_ip: IpAddr,
) -> Option<PacketRecord> {
    let timestamp = timestamp_micros? as f64 / 1_000_000.0;
    let size = frame_len?.trim().parse::<u32>().ok()?;
    let direction = if source == Some(client_ip) {
        Direction::Outbound
    } else {
        Direction::Inbound
    };

    Some(PacketRecord::new(timestamp, size, direction))
}

/// Loads every frame of a PCAP/PCAPNG file as a [PacketRecord], in capture order.
///
/// Direction is decided by comparing the IP source against `client_ip`.
pub fn load_file(filepath: &str, client_ip: IpAddr) -> Result<Vec<PacketRecord>> {
    log::info!("Loading capture file.");
    let mut rtshark = spawn(filepath)?;
    let mut records = Vec::new();
    let mut frame = 0;

    while let Some(packet) = rtshark.read().map_err(|e| {
        log::error!("Error parsing TShark output when collecting packets: {e}");
        CaptureError::Read(e)
    })? {
        frame += 1;
        let frame_len = packet
            .layer_name("frame")
            .and_then(|layer| layer.metadata("frame.len"))
            .map(|len| len.value());

        match to_record(
            packet.timestamp_micros(),
            frame_len,
            source_address(&packet),
            client_ip,
        ) {
            Some(record) => records.push(record),
            None => log::warn!("Skipping frame {frame}: missing timestamp or length"),
        }
    }
    rtshark.kill();

    log::info!("Collected {} packets.", records.len());
    Ok(records)
}

/// Decodes a tshark payload field, which may be plain or colon separated hex.
pub fn decode_payload(field: &str) -> std::result::Result<Vec<u8>, hex::FromHexError> {
    let compact: String = field.chars().filter(|c| *c != ':').collect();
    hex::decode(compact)
}

/// Concatenates the TCP and UDP payload bytes of every frame in the capture.
///
/// Only used for the optional entropy measurement; detection never looks at payloads.
pub fn load_payload_bytes(filepath: &str) -> Result<Vec<u8>> {
    log::info!("Collecting payload bytes.");
    let mut rtshark = spawn(filepath)?;
    let mut payload = Vec::new();
    let mut frame = 0;

    while let Some(packet) = rtshark.read().map_err(|e| {
        log::error!("Error parsing TShark output when collecting payloads: {e}");
        CaptureError::Read(e)
    })? {
        frame += 1;
        let field = packet
            .layer_name("tcp")
            .and_then(|tcp| tcp.metadata("tcp.payload"))
            .or_else(|| {
                packet
                    .layer_name("udp")
                    .and_then(|udp| udp.metadata("udp.payload"))
            });

        if let Some(field) = field {
            let bytes = decode_payload(field.value())
                .map_err(|source| CaptureError::Payload { frame, source })?;
            payload.extend_from_slice(&bytes);
        }
    }
    rtshark.kill();

    log::info!("Collected {} payload bytes.", payload.len());
    Ok(payload)
}
