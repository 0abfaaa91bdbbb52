//! Burst segmentation: splitting a packet sequence wherever the inter-arrival gap exceeds a threshold.
use super::containers::{Burst, BurstStats, PacketRecord};
use super::stats::population_stddev;

/// Default gap separating two bursts, in seconds (50 ms).
pub const DEFAULT_GAP_THRESHOLD: f64 = 0.05;

/// Groups an ordered packet sequence into bursts.
///
/// A new burst starts whenever a packet arrives more than `gap_threshold` seconds after the
/// packet immediately before it (not after the start of the current burst). The returned
/// bursts are non-empty and partition `packets` in order; an empty input yields no bursts.
pub fn segment(packets: &[PacketRecord], gap_threshold: f64) -> Vec<Burst<'_>> {
    let mut bursts = Vec::new();
    let Some(first) = packets.first() else {
        return bursts;
    };

    let mut start = 0;
    let mut last_time = first.timestamp;

    for (index, packet) in packets.iter().enumerate().skip(1) {
        if packet.timestamp - last_time > gap_threshold {
            bursts.push(Burst {
                packets: &packets[start..index],
            });
            start = index;
        }
        last_time = packet.timestamp;
    }
    bursts.push(Burst {
        packets: &packets[start..],
    });

    bursts
}

/// Summarises a burst partition: count, mean bytes and packets per burst, spread of burst sizes.
pub fn burst_stats(bursts: &[Burst]) -> BurstStats {
    if bursts.is_empty() {
        return BurstStats::default();
    }

    let sizes: Vec<f64> = bursts.iter().map(|b| b.total_size() as f64).collect();
    let count = bursts.len() as f64;
    let packets: usize = bursts.iter().map(|b| b.packets.len()).sum();

    for (index, burst) in bursts.iter().enumerate() {
        log::debug!(
            "Burst {index}: {} packets, {} bytes, {:.3}s - {:.3}s",
            burst.packets.len(),
            burst.total_size(),
            burst.first().timestamp,
            burst.last().timestamp
        );
    }

    BurstStats {
        total_bursts: bursts.len(),
        avg_burst_size: sizes.iter().sum::<f64>() / count,
        avg_packets_per_burst: packets as f64 / count,
        burst_size_stddev: if sizes.len() > 1 {
            population_stddev(&sizes)
        } else {
            0.0
        },
    }
}
