//! Core protocol types: the frame that travels on the wire.
//!
//! Every message in Boxgrid — client to server, server to client, and
//! process to process over the bus — is one [`Frame`]: a 24-bit value
//! packed into 3 bytes, big-endian:
//!
//! ```text
//!  bit 23        21 20 19                                    0
//!  ┌──────────────┬──┬──────────────────────────────────────┐
//!  │ kind (3 bit) │fl│            payload (20 bit)          │
//!  └──────────────┴──┴──────────────────────────────────────┘
//! ```
//!
//! For a toggle, `flag` is the new box value and `payload` is the box
//! offset. For a player-count notification, `flag` is unused (sent as
//! 0, ignored on receive) and `payload` is the live count.

use std::fmt;

/// Exact length of an encoded frame, in bytes.
pub const FRAME_LEN: usize = 3;

/// Largest value the 20-bit payload field can carry (2^20 - 1).
///
/// Doubles as the payload bit mask.
pub const PAYLOAD_MAX: u32 = (1 << 20) - 1;

/// Largest value the 3-bit kind field can carry; doubles as its mask.
pub(crate) const KIND_MAX: u8 = 0b111;

// ---------------------------------------------------------------------------
// FrameKind
// ---------------------------------------------------------------------------

/// What a frame means — the top 3 bits of the 24-bit value.
///
/// Only two kinds are assigned today. The remaining six values decode
/// as [`FrameKind::Reserved`] rather than failing: an unknown kind is
/// not a wire error, callers simply ignore frames they don't handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// A box changed value. `flag` = new value, `payload` = box offset.
    Toggle,

    /// The live player count changed. `payload` = current count.
    PlayerCount,

    /// One of the six unassigned kind values (2–7).
    Reserved(u8),
}

impl FrameKind {
    /// Maps the raw 3-bit field to a kind. Only the low 3 bits are read.
    pub fn from_bits(bits: u8) -> Self {
        match bits & KIND_MAX {
            0 => Self::Toggle,
            1 => Self::PlayerCount,
            other => Self::Reserved(other),
        }
    }

    /// The raw value of the kind field.
    ///
    /// For `Reserved`, this returns whatever was stored — values above
    /// 7 don't fit in the field and are rejected at encode time.
    pub fn bits(&self) -> u8 {
        match self {
            Self::Toggle => 0,
            Self::PlayerCount => 1,
            Self::Reserved(bits) => *bits,
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toggle => write!(f, "toggle"),
            Self::PlayerCount => write!(f, "player-count"),
            Self::Reserved(bits) => write!(f, "reserved-{bits}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One wire message, decoded.
///
/// Immutable once constructed — the server never patches a frame in
/// place, it builds a new one. `Copy` because it's 8 bytes of plain
/// data; frames are passed around by value everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// What this frame means.
    pub kind: FrameKind,
    /// The 1-bit flag. Toggle: the new box value. PlayerCount: unused.
    pub flag: bool,
    /// The 20-bit payload. Toggle: box offset. PlayerCount: live count.
    pub payload: u32,
}

impl Frame {
    /// Builds a toggle frame: box `offset` was set to `value`.
    pub fn toggle(offset: u32, value: bool) -> Self {
        Self {
            kind: FrameKind::Toggle,
            flag: value,
            payload: offset,
        }
    }

    /// Builds a player-count frame. The flag is always 0 on send.
    pub fn player_count(count: u32) -> Self {
        Self {
            kind: FrameKind::PlayerCount,
            flag: false,
            payload: count,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(flag={}, payload={})",
            self.kind, self.flag as u8, self.payload
        )
    }
}
