//! Errors raised while acquiring packets from a capture file.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CaptureError>;

#[derive(Error, Debug)]
pub enum CaptureError {
    /// tshark is missing or refused to start
    #[error("failed to spawn tshark: {0}")]
    Spawn(#[source] std::io::Error),

    /// tshark started but its output could not be parsed
    #[error("failed to read tshark output: {0}")]
    Read(#[source] std::io::Error),

    #[error("invalid payload hex in frame {frame}: {source}")]
    Payload {
        frame: usize,
        #[source]
        source: hex::FromHexError,
    },
}
