//! Shannon entropy of raw bytes, in bits per byte.

/// Computes `-sum(p * log2(p))` over the byte value frequencies of `data`.
///
/// Ranges from 0.0 (one repeated value, or no data at all) to 8.0 (all 256 values equally often).
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 256];
    for byte in data {
        counts[usize::from(*byte)] += 1;
    }

    let length = data.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / length;
            -p * p.log2()
        })
        .sum()
}
