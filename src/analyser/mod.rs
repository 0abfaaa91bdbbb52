//! The core of tunnel-in-tunnel traffic analysis.
//! Leverage metadata like packet sizes and timing to summarise a capture and score its handshake.
pub mod bursts;
pub mod containers;
pub mod core;
pub mod detect;
pub mod entropy;
pub mod stats;
pub mod utils;
