//! Packed-result protocol codec
//!
//! The oracle returns one signed 64-bit word per screenshot. Layout of the
//! current protocol, low bits first:
//!
//! ```text
//!  bit 0..=2   heart count (0..=7)
//!  bit 3       bandage flag, doubling as the heart count's high bit when clear
//!  bit 4..     turn field: low four bits are the ones digit, bit 4 selects
//!              the 20s band (and shifts the stored ones digit by ten)
//! ```
//!
//! The bandage flag and the heart count's top bit share bit 3 on purpose; a
//! set flag removes that bit from the heart count. The turn field encodes
//! exactly two ten-turn bands (10..=19 and 20..=29). The decoder performs no
//! range validation and no clamping: the producer is trusted to stay inside
//! the bands, and out-of-band words pass through arithmetically.
//!
//! An earlier protocol revision returned an 8-bit word with no turn field at
//! all (sentinel, bandage bit, 3-bit heart count). Entries cached under that
//! revision are still in circulation, so both decoders remain supported and
//! the caller selects one with an explicit [`Protocol`] tag resolved at
//! module load time, never guessed from the data.

use crate::types::ScreenshotResult;

/// The reserved word meaning "not a recognizable outcome screenshot".
pub const SENTINEL: i64 = -1;

const BANDAGE_BIT: i64 = 0b1000;
const LOW_FIELD_MASK: i64 = 0b1111;
const BAND_BIT: i64 = 0b10000;

/// Wire-protocol revision, resolved once when the oracle module is loaded
/// (by inspecting which entry points it exports or by configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// 8-bit word: sentinel, bandage bit, 3-bit heart count. No turn field.
    Legacy,
    /// Current revision with the two-band turn field in the high bits.
    TurnCount,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Legacy => "legacy",
            Protocol::TurnCount => "turn_count",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded form of one raw word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The sentinel: the bytes were not an outcome screenshot.
    NotScreenshot,
    /// A recognized win.
    Win {
        heart_count: u8,
        has_bandage: bool,
        /// `None` under [`Protocol::Legacy`]
        turn_count: Option<u8>,
    },
}

impl Outcome {
    /// Materialize a cacheable result for a file.
    pub fn into_result(self, file_key: String) -> ScreenshotResult {
        match self {
            Outcome::NotScreenshot => ScreenshotResult::invalid(file_key),
            Outcome::Win {
                heart_count,
                has_bandage,
                turn_count: Some(turn),
            } => ScreenshotResult::win(file_key, heart_count, has_bandage, turn),
            Outcome::Win {
                heart_count,
                has_bandage,
                turn_count: None,
            } => ScreenshotResult::legacy_win(file_key, heart_count, has_bandage),
        }
    }
}

/// Decode a raw oracle word under the given protocol revision.
pub fn decode(raw: i64, protocol: Protocol) -> Outcome {
    if raw == SENTINEL {
        return Outcome::NotScreenshot;
    }

    let mut heart_count = raw & LOW_FIELD_MASK;
    let has_bandage = raw & BANDAGE_BIT != 0;
    if has_bandage {
        // The flag and the heart count's high bit share bit 3; with the
        // flag set, the bit no longer contributes to the count.
        heart_count &= !BANDAGE_BIT;
    }

    let turn_count = match protocol {
        Protocol::Legacy => None,
        Protocol::TurnCount => {
            // Arithmetic shift over the high bits.
            let mut raw_turn = raw >> 4;
            let mut base = 10;
            if raw_turn & BAND_BIT != 0 {
                base = 20;
                // Compensates the stored ones digit before the final mask.
                raw_turn -= 10;
            }
            Some((base + (raw_turn & LOW_FIELD_MASK)) as u8)
        }
    };

    Outcome::Win {
        heart_count: heart_count as u8,
        has_bandage,
        turn_count,
    }
}

/// Encode fields into a raw word under the current protocol.
///
/// `heart_count` must be 0..=7 and `turn_count` 10..=29; values outside
/// those ranges are not representable.
pub fn encode(heart_count: u8, has_bandage: bool, turn_count: u8) -> i64 {
    debug_assert!(heart_count <= 7);
    debug_assert!((10..=29).contains(&turn_count));

    let mut low = heart_count as i64;
    if has_bandage {
        low |= BANDAGE_BIT;
    }

    let turn = turn_count as i64;
    let raw_turn = if turn >= 20 {
        BAND_BIT | (turn - 10)
    } else {
        turn - 10
    };

    (raw_turn << 4) | low
}
