//! Human and machine readable rendering of analysis results.
pub mod output;
