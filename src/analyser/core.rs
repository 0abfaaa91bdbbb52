use super::bursts;
use super::containers::{Analysis, PacketRecord};
use super::detect::{self, DetectorConfig};
use super::stats;

/// Runs every analysis stage over one ordered packet sequence.
///
/// Burst statistics cover the whole sequence; detection only looks at the handshake window.
pub fn analyse(packets: &[PacketRecord], config: &DetectorConfig) -> Analysis {
    log::info!("Starting analysis of {} packets.", packets.len());

    let sizes = stats::size_and_ngram_stats(packets);
    let timing = stats::interarrival_stats(packets);
    let burst_summary = bursts::burst_stats(&bursts::segment(packets, config.gap_threshold));
    let detection = detect::detect(packets, config);

    Analysis {
        sizes,
        timing,
        bursts: burst_summary,
        detection,
        payload_entropy: None,
        config: config.clone(),
    }
}
