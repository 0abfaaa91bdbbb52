//! Distribution statistics over packet sizes and inter-arrival times.
//!
//! All variances are population variances (divide by n). Inputs too short to summarise yield the
//! `Default` summary instead of an error.
use std::collections::HashMap;
use super::containers::{Direction, PacketRecord, SizeStats, TimingStats, Trigram};

/// How many of the most frequent size 3-grams are reported.
pub const TOP_TRIGRAMS: usize = 5;

/// Arithmetic mean. Callers guarantee a non-empty slice.
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Callers guarantee a non-empty slice.
pub fn population_stddev(values: &[f64]) -> f64 {
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Counts every sliding 3-gram of `sizes` and ranks them by frequency.
///
/// Equal counts keep the order in which the 3-grams were first seen.
fn rank_trigrams(sizes: &[u32]) -> Vec<(Trigram, usize)> {
    let mut counts: Vec<(Trigram, usize)> = Vec::new();
    let mut positions: HashMap<Trigram, usize> = HashMap::new();

    for window in sizes.windows(3) {
        let trigram = (window[0], window[1], window[2]);
        match positions.get(&trigram) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                positions.insert(trigram, counts.len());
                counts.push((trigram, 1));
            }
        }
    }

    // sort_by is stable, which is what keeps first-seen order on ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Packet size distribution plus size 3-gram patterns over the whole sequence.
pub fn size_and_ngram_stats(packets: &[PacketRecord]) -> SizeStats {
    if packets.is_empty() {
        return SizeStats::default();
    }
    log::info!("Analysing packet sizes.");

    let sizes: Vec<u32> = packets.iter().map(|p| p.size).collect();
    let as_float: Vec<f64> = sizes.iter().map(|s| f64::from(*s)).collect();
    let outbound_packets = packets
        .iter()
        .filter(|p| p.direction == Direction::Outbound)
        .count();

    let mut ranked = rank_trigrams(&sizes);
    let unique_trigrams = ranked.len();
    ranked.truncate(TOP_TRIGRAMS);

    SizeStats {
        total_packets: sizes.len(),
        min_size: sizes.iter().copied().min().unwrap_or(0),
        max_size: sizes.iter().copied().max().unwrap_or(0),
        avg_size: mean(&as_float),
        size_stddev: population_stddev(&as_float),
        unique_trigrams,
        most_common_trigrams: ranked,
        outbound_packets,
        inbound_packets: packets.len() - outbound_packets,
    }
}

/// Inter-arrival times in milliseconds between each packet and its predecessor.
pub fn interarrival_times(packets: &[PacketRecord]) -> Vec<f64> {
    packets
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp) * 1000.0)
        .collect()
}

/// Inter-arrival time distribution. Needs at least two packets.
pub fn interarrival_stats(packets: &[PacketRecord]) -> TimingStats {
    if packets.len() < 2 {
        return TimingStats::default();
    }
    log::info!("Analysing inter-arrival times.");

    let iats = interarrival_times(packets);

    TimingStats {
        samples: iats.len(),
        min_iat_ms: iats.iter().copied().fold(f64::INFINITY, f64::min),
        max_iat_ms: iats.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        avg_iat_ms: mean(&iats),
        iat_stddev_ms: population_stddev(&iats),
    }
}
