use serde::Serialize;
use std::fmt;
use super::detect::DetectorConfig;

/// Which side of the subject host a packet travelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Sent by the subject (client -> server)
    Outbound,
    /// Received by the subject (server -> client)
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A single observed packet, normalised from the capture.
///
/// Sequences of these are expected to be sorted by `timestamp` ascending. Nothing in the
/// analyser re-sorts them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PacketRecord {
    /// Seconds since the epoch
    pub timestamp: f64,
    /// Frame length in bytes
    pub size: u32,
    pub direction: Direction,
}

impl PacketRecord {
    pub fn new(timestamp: f64, size: u32, direction: Direction) -> Self {
        Self {
            timestamp,
            size,
            direction,
        }
    }
}

/// A run of packets whose consecutive gaps stay within the burst threshold.
///
/// Borrows a contiguous, non-empty slice of the segmented sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Burst<'a> {
    pub packets: &'a [PacketRecord],
}

impl<'a> Burst<'a> {
    /// Sum of the packet sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.packets.iter().map(|p| u64::from(p.size)).sum()
    }

    pub fn first(&self) -> &'a PacketRecord {
        &self.packets[0]
    }

    pub fn last(&self) -> &'a PacketRecord {
        &self.packets[self.packets.len() - 1]
    }
}

/// Three consecutive packet sizes.
pub type Trigram = (u32, u32, u32);

/// Packet size distribution and size 3-gram patterns.
///
/// `total_packets == 0` marks the empty summary; every other field is then zero or empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SizeStats {
    pub total_packets: usize,
    pub min_size: u32,
    pub max_size: u32,
    pub avg_size: f64,
    pub size_stddev: f64,
    pub unique_trigrams: usize,
    pub most_common_trigrams: Vec<(Trigram, usize)>,
    pub outbound_packets: usize,
    pub inbound_packets: usize,
}

impl SizeStats {
    pub fn is_empty(&self) -> bool {
        self.total_packets == 0
    }
}

/// Inter-arrival time distribution, in milliseconds.
///
/// `samples == 0` marks the empty summary (fewer than two packets).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub samples: usize,
    pub min_iat_ms: f64,
    pub max_iat_ms: f64,
    pub avg_iat_ms: f64,
    pub iat_stddev_ms: f64,
}

impl TimingStats {
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }
}

/// Aggregate view over a burst partition.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BurstStats {
    pub total_bursts: usize,
    /// Mean bytes per burst
    pub avg_burst_size: f64,
    pub avg_packets_per_burst: f64,
    /// Population standard deviation of bytes per burst, 0 with fewer than two bursts
    pub burst_size_stddev: f64,
}

impl BurstStats {
    pub fn is_empty(&self) -> bool {
        self.total_bursts == 0
    }
}

/// Outcome of the tunnel-in-tunnel classifier for one packet sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionResult {
    pub detected: bool,
    /// Score clamped to [0, 1]
    pub confidence: f64,
    pub score: f64,
    /// Human readable explanation per criterion that fired, in evaluation order
    pub reasons: Vec<String>,
    pub avg_handshake_size: f64,
}

impl DetectionResult {
    /// Result for sequences too short to contain a full handshake window.
    pub fn insufficient(packets: usize, required: usize) -> Self {
        Self {
            detected: false,
            confidence: 0.0,
            score: 0.0,
            reasons: vec![format!(
                "Insufficient packets: {packets} captured, {required} required"
            )],
            avg_handshake_size: 0.0,
        }
    }
}

/// Everything the report needs for one capture.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub sizes: SizeStats,
    pub timing: TimingStats,
    pub bursts: BurstStats,
    pub detection: DetectionResult,
    /// Only present when payload entropy was requested
    pub payload_entropy: Option<f64>,
    /// Thresholds and weights that produced `detection`
    pub config: DetectorConfig,
}
