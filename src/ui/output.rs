use crate::analyser::containers::{Analysis, BurstStats, DetectionResult, SizeStats, TimingStats};
use ansi_term::Colour;
use chrono::{DateTime, Utc};
use std::{fs, io, path::Path};

/// Converts capture seconds to a UTC time for display.
fn capture_time(timestamp: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros((timestamp * 1_000_000.0).round() as i64)
}

pub fn print_results(file: &str, first_timestamp: Option<f64>, analysis: &Analysis) {
    println!("\n\u{250F}\u{2501}\u{2501}\u{2501}\u{2501} Results");
    println!("\u{2503}");
    println!("\u{2503} Capture          : {}", Colour::Fixed(226).paint(file));
    println!("\u{2503} Packets          : {}", Colour::Fixed(226).paint(analysis.sizes.total_packets.to_string()));
    if let Some(start) = first_timestamp.and_then(capture_time) {
        println!("\u{2503} Capture start    : {}", Colour::Fixed(226).paint(start.to_rfc3339()));
    }
    print_sizes(&analysis.sizes);
    print_timing(&analysis.timing);
    print_bursts(&analysis.bursts);
    print_detection(&analysis.detection);
    print_assessment(&analysis.detection);
    if let Some(entropy) = analysis.payload_entropy {
        print_entropy(entropy);
    }
    println!("\u{2517}\u{2501}\u{2501}\u{2501}\u{2501}");
}

fn section(title: &str) {
    println!("\u{2503}");
    println!("\u{2523}\u{2501}\u{2501} {}", Colour::Cyan.bold().paint(title));
}

pub fn print_sizes(sizes: &SizeStats) {
    section("Packet Size Analysis");
    if sizes.is_empty() {
        println!("\u{2503} No packets");
        return;
    }
    println!("\u{2503} Total packets    : {}", sizes.total_packets);
    println!("\u{2503} Outbound/Inbound : {} / {}", sizes.outbound_packets, sizes.inbound_packets);
    println!("\u{2503} Size range       : {} - {} bytes", sizes.min_size, sizes.max_size);
    println!("\u{2503} Average size     : {:.2} \u{00B1} {:.2} bytes", sizes.avg_size, sizes.size_stddev);
    println!("\u{2503} Unique 3-grams   : {}", sizes.unique_trigrams);
    for ((a, b, c), count) in &sizes.most_common_trigrams {
        println!("\u{2503}   ({a}, {b}, {c}) x{count}");
    }
}

pub fn print_timing(timing: &TimingStats) {
    section("Timing Analysis");
    if timing.is_empty() {
        println!("\u{2503} Not enough packets for inter-arrival times");
        return;
    }
    println!("\u{2503} IAT range        : {:.2} - {:.2} ms", timing.min_iat_ms, timing.max_iat_ms);
    println!("\u{2503} Average IAT      : {:.2} \u{00B1} {:.2} ms", timing.avg_iat_ms, timing.iat_stddev_ms);
}

pub fn print_bursts(bursts: &BurstStats) {
    section("Burst Pattern Analysis");
    if bursts.is_empty() {
        println!("\u{2503} No bursts");
        return;
    }
    println!("\u{2503} Total bursts     : {}", bursts.total_bursts);
    println!("\u{2503} Avg burst size   : {:.2} bytes", bursts.avg_burst_size);
    println!("\u{2503} Avg packets/burst: {:.2}", bursts.avg_packets_per_burst);
    println!("\u{2503} Burst size stddev: {:.2}", bursts.burst_size_stddev);
}

pub fn print_detection(detection: &DetectionResult) {
    section("Tunnel-in-Tunnel Detection");
    let verdict = if detection.detected {
        Colour::Red.bold().paint("true")
    } else {
        Colour::Green.paint("false")
    };
    println!("\u{2503} Detected         : {}", verdict);
    println!("\u{2503} Confidence       : {:.2}%", detection.confidence * 100.0);
    println!("\u{2503} Score            : {:.2}", detection.score);
    if !detection.reasons.is_empty() {
        println!("\u{2503} Reasons:");
        for reason in &detection.reasons {
            println!("\u{2503}   - {reason}");
        }
    }
}

/// Operator-facing verdict lines for a detection result.
pub fn assessment(detection: &DetectionResult) -> Vec<String> {
    if detection.detected {
        vec![
            "Tunnel-in-tunnel pattern DETECTED - obfuscation may be INSUFFICIENT".to_string(),
            "Recommendation: increase padding, adjust burst patterns".to_string(),
        ]
    } else {
        vec![
            "No clear tunnel-in-tunnel signature detected".to_string(),
            format!(
                "Handshake burst size: {:.0} bytes (target: 200-350)",
                detection.avg_handshake_size
            ),
            "Traffic appears similar to normal HTTPS".to_string(),
        ]
    }
}

pub fn print_assessment(detection: &DetectionResult) {
    section("Overall Assessment");
    let colour = if detection.detected { Colour::Red } else { Colour::Green };
    for line in assessment(detection) {
        println!("\u{2503} {}", colour.paint(line));
    }
}

pub fn print_entropy(entropy: f64) {
    section("Payload Entropy");
    println!("\u{2503} Shannon entropy  : {:.4} bits/byte", entropy);
}

/// Serialises the full analysis as pretty JSON.
pub fn data_as_json(analysis: &Analysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}

pub fn data_to_file(json: String, path: &Path) -> io::Result<()> {
    log::info!("Writing analysis to {}", path.display());
    fs::write(path, json)
}
