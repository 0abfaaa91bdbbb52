//! Tunnel-in-tunnel classification of the handshake window.
//!
//! Single-layer TLS usually settles in one round trip with a ~200-350 byte initial burst. A
//! transport nested inside another needs 2-3 extra round trips and its initial burst grows to
//! roughly 500-900 bytes. The detector scores those traits over the first packets of a session.
use serde::Serialize;
use super::bursts::{self, DEFAULT_GAP_THRESHOLD};
use super::containers::{BurstStats, DetectionResult, PacketRecord};

/// Tunable thresholds and weights for [detect].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectorConfig {
    /// Gap in seconds that separates two bursts
    pub gap_threshold: f64,
    /// Number of leading packets treated as the handshake
    pub handshake_window_size: usize,
    /// Score added for a large average handshake size
    pub size_burst_weight: f64,
    /// Score added for extra round trips
    pub rtt_weight: f64,
    /// Score added for uneven burst sizes
    pub variability_weight: f64,
    /// Minimum score for a positive detection
    pub detection_cutoff: f64,
    /// Inclusive byte range of a tunnel-in-tunnel handshake average
    pub large_handshake_range: (f64, f64),
    /// Inclusive byte range of a plain HTTPS handshake average
    pub normal_handshake_range: (f64, f64),
    /// Burst counts strictly above this indicate extra round trips
    pub min_rtt_bursts: usize,
    /// Burst size stddev strictly above this indicates high variability
    pub variability_threshold: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            handshake_window_size: 10,
            size_burst_weight: 0.3,
            rtt_weight: 0.3,
            variability_weight: 0.2,
            detection_cutoff: 0.5,
            large_handshake_range: (500.0, 900.0),
            normal_handshake_range: (200.0, 350.0),
            min_rtt_bursts: 2,
            variability_threshold: 300.0,
        }
    }
}

/// How the average handshake size was classified.
///
/// `Normal` is informational only and never contributes to the score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HandshakeSize {
    Large(f64),
    Normal(f64),
    Unremarkable(f64),
}

impl HandshakeSize {
    pub fn classify(avg: f64, config: &DetectorConfig) -> Self {
        let within = |(lo, hi): (f64, f64)| lo <= avg && avg <= hi;

        if within(config.large_handshake_range) {
            HandshakeSize::Large(avg)
        } else if within(config.normal_handshake_range) {
            HandshakeSize::Normal(avg)
        } else {
            HandshakeSize::Unremarkable(avg)
        }
    }

    pub fn weight(&self, config: &DetectorConfig) -> f64 {
        match self {
            HandshakeSize::Large(_) => config.size_burst_weight,
            HandshakeSize::Normal(_) | HandshakeSize::Unremarkable(_) => 0.0,
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            HandshakeSize::Large(avg) => Some(format!("Large handshake burst: {avg:.0} bytes")),
            HandshakeSize::Normal(avg) => Some(format!(
                "Normal handshake burst: {avg:.0} bytes (HTTPS-like)"
            )),
            HandshakeSize::Unremarkable(_) => None,
        }
    }
}

/// Scores the handshake window of `packets` for the tunnel-in-tunnel signature.
///
/// Sequences shorter than the handshake window are never flagged.
pub fn detect(packets: &[PacketRecord], config: &DetectorConfig) -> DetectionResult {
    let window = config.handshake_window_size;
    if window == 0 || packets.len() < window {
        log::warn!(
            "Only {} packets captured, detection needs {}.",
            packets.len(),
            window
        );
        return DetectionResult::insufficient(packets.len(), window);
    }
    log::info!("Scoring handshake window of {window} packets.");

    let handshake = &packets[..window];
    let avg_handshake_size =
        handshake.iter().map(|p| f64::from(p.size)).sum::<f64>() / window as f64;
    let burst_analysis: BurstStats =
        bursts::burst_stats(&bursts::segment(handshake, config.gap_threshold));

    let mut score = 0.0;
    let mut reasons = Vec::new();

    // Initial burst size
    let size_class = HandshakeSize::classify(avg_handshake_size, config);
    score += size_class.weight(config);
    if let Some(reason) = size_class.reason() {
        reasons.push(reason);
    }
    log::debug!("Handshake size class: {:?}", size_class);

    // Extra round trips
    if burst_analysis.total_bursts > config.min_rtt_bursts {
        score += config.rtt_weight;
        reasons.push(format!(
            "Multiple RTT rounds: {} bursts",
            burst_analysis.total_bursts
        ));
    }

    // Burst size variability
    if burst_analysis.burst_size_stddev > config.variability_threshold {
        score += config.variability_weight;
        reasons.push(format!(
            "High variability: stddev={:.0}",
            burst_analysis.burst_size_stddev
        ));
    }

    log::debug!("Detection score {score:.2} from {} criteria", reasons.len());

    DetectionResult {
        detected: score >= config.detection_cutoff,
        confidence: score.clamp(0.0, 1.0),
        score,
        reasons,
        avg_handshake_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::containers::Direction;

    const EPSILON: f64 = 1e-9;

    /// Builds packets from (burst, size) pairs; bursts are 1 s apart, packets 1 ms apart.
    fn session(layout: &[(u32, u32)]) -> Vec<PacketRecord> {
        let mut packets = Vec::new();
        let mut last_burst = None;
        let mut t = 0.0;
        for (i, (burst, size)) in layout.iter().enumerate() {
            if i > 0 {
                t += if last_burst == Some(*burst) { 0.001 } else { 1.0 };
            }
            last_burst = Some(*burst);
            let direction = if i % 2 == 0 {
                Direction::Outbound
            } else {
                Direction::Inbound
            };
            packets.push(PacketRecord::new(t, *size, direction));
        }
        packets
    }

    fn uniform(count: usize, size: u32) -> Vec<PacketRecord> {
        session(&vec![(0, size); count])
    }

    #[test]
    fn too_few_packets() {
        for count in 0..10 {
            let result = detect(&uniform(count, 700), &DetectorConfig::default());
            assert!(!result.detected);
            assert_eq!(result.confidence, 0.0);
            assert_eq!(result.score, 0.0);
            assert!(result.reasons[0].starts_with("Insufficient packets"));
        }
    }

    #[test]
    fn tunnel_signature_scores_all_criteria() {
        // Bursts of 2, 3 and 5 packets at 600 bytes: 1200, 1800, 3000 bytes, stddev ~748
        let mut layout = vec![(0, 600); 2];
        layout.extend(vec![(1, 600); 3]);
        layout.extend(vec![(2, 600); 5]);
        let result = detect(&session(&layout), &DetectorConfig::default());

        assert!(result.detected);
        assert!((result.score - 0.8).abs() < EPSILON);
        assert!((result.confidence - 0.8).abs() < EPSILON);
        assert!((result.avg_handshake_size - 600.0).abs() < EPSILON);
        assert_eq!(result.reasons.len(), 3);
        assert_eq!(result.reasons[0], "Large handshake burst: 600 bytes");
        assert_eq!(result.reasons[1], "Multiple RTT rounds: 3 bursts");
        assert!(result.reasons[2].starts_with("High variability: stddev="));
    }

    #[test]
    fn normal_https_handshake() {
        let result = detect(&uniform(10, 250), &DetectorConfig::default());

        assert!(!result.detected);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(
            result.reasons,
            vec!["Normal handshake burst: 250 bytes (HTTPS-like)".to_string()]
        );
    }

    #[test]
    fn unremarkable_size_leaves_no_reason() {
        let result = detect(&uniform(10, 1200), &DetectorConfig::default());
        assert!(!result.detected);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn only_handshake_window_is_scored() {
        // Ten quiet HTTPS-like packets, then traffic that would otherwise trip every criterion
        let mut layout = vec![(0, 250); 10];
        layout.extend(vec![(1, 1400); 3]);
        layout.extend(vec![(2, 60); 1]);
        layout.extend(vec![(3, 1400); 6]);
        let result = detect(&session(&layout), &DetectorConfig::default());

        assert!(!result.detected);
        assert!((result.avg_handshake_size - 250.0).abs() < EPSILON);
    }

    #[test]
    fn two_criteria_reach_cutoff() {
        // Large average over three bursts, with the last burst one packet heavier
        let mut layout = vec![(0, 700); 3];
        layout.extend(vec![(1, 700); 3]);
        layout.extend(vec![(2, 700); 4]);
        let result = detect(&session(&layout), &DetectorConfig::default());

        // Bursts 2100, 2100, 2800 -> stddev ~330, so all three fire
        assert!(result.detected);
        assert_eq!(result.reasons.len(), 3);

        let mut relaxed = DetectorConfig::default();
        relaxed.variability_threshold = 1000.0;
        let result = detect(&session(&layout), &relaxed);
        assert!(result.detected);
        assert!((result.score - 0.6).abs() < EPSILON);
        assert_eq!(result.reasons.len(), 2);
    }

    #[test]
    fn single_criterion_is_not_enough() {
        // Large average, one burst
        let result = detect(&uniform(10, 600), &DetectorConfig::default());
        assert!(!result.detected);
        assert!((result.score - 0.3).abs() < EPSILON);
        assert_eq!(result.reasons, vec!["Large handshake burst: 600 bytes".to_string()]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let config = DetectorConfig::default();
        assert_eq!(HandshakeSize::classify(500.0, &config), HandshakeSize::Large(500.0));
        assert_eq!(HandshakeSize::classify(900.0, &config), HandshakeSize::Large(900.0));
        assert_eq!(HandshakeSize::classify(200.0, &config), HandshakeSize::Normal(200.0));
        assert_eq!(HandshakeSize::classify(350.0, &config), HandshakeSize::Normal(350.0));
        assert_eq!(
            HandshakeSize::classify(400.0, &config),
            HandshakeSize::Unremarkable(400.0)
        );
        assert_eq!(HandshakeSize::Normal(250.0).weight(&config), 0.0);
    }

    #[test]
    fn custom_window_size() {
        let config = DetectorConfig {
            handshake_window_size: 4,
            ..DetectorConfig::default()
        };
        let result = detect(&uniform(4, 600), &config);
        assert!((result.score - 0.3).abs() < EPSILON);

        let empty_window = DetectorConfig {
            handshake_window_size: 0,
            ..DetectorConfig::default()
        };
        assert!(!detect(&uniform(4, 600), &empty_window).detected);
    }

    #[test]
    fn confidence_is_clamped() {
        let config = DetectorConfig {
            size_burst_weight: 0.9,
            rtt_weight: 0.9,
            ..DetectorConfig::default()
        };
        let mut layout = vec![(0, 600); 3];
        layout.extend(vec![(1, 600); 3]);
        layout.extend(vec![(2, 600); 4]);
        let result = detect(&session(&layout), &config);
        assert!(result.score > 1.0);
        assert_eq!(result.confidence, 1.0);
    }
}
