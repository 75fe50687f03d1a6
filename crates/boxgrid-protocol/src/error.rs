//! Error types for the protocol layer.
//!
//! Each crate in Boxgrid defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in the 3-byte wire format,
//! not in networking or the shared store.

use crate::types::FRAME_LEN;

/// Errors that can occur while packing or unpacking frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The input is not exactly [`FRAME_LEN`] bytes.
    ///
    /// The server recovers from this locally: the message is dropped
    /// and the connection stays alive.
    #[error("malformed frame: expected {FRAME_LEN} bytes, got {0}")]
    MalformedFrame(usize),

    /// A frame field doesn't fit its bit width at encode time.
    ///
    /// This is a programming error in the caller — offsets and counts
    /// that pass range checks never produce it.
    #[error("{field} out of range: {value} exceeds max {max}")]
    ValueOutOfRange {
        /// Which field overflowed ("payload" or "kind").
        field: &'static str,
        /// The offending value.
        value: u32,
        /// The largest value the field can carry.
        max: u32,
    },
}
