//! Core domain types for sapscope
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Oracle** | The external binary module that turns raw image bytes into a packed outcome word |
//! | **Arena** | The oracle's shared linear memory, grown once and bump-allocated with no free |
//! | **Sentinel** | The reserved word `-1`: the bytes are not a recognizable outcome screenshot |
//! | **Bandage** | One-time shield flag that shares a bit position with the heart count |
//! | **DateToken** | Calendar date embedded in a file name (`_YYYYMMDD-`) |

use serde::{Deserialize, Serialize};

/// One classified outcome per screenshot file.
///
/// `file_key` is the primary key; a result is never mutated after creation
/// and never recomputed once cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotResult {
    /// Unique identifier (the file name)
    pub file_key: String,
    /// False when the oracle returned the sentinel: the file is not a
    /// recognizable outcome screenshot. The remaining fields are then
    /// fixed zeros.
    pub valid: bool,
    /// Hearts remaining, 0..=7, exclusive of the bandage flag bit
    pub heart_count: u8,
    /// Whether the one-time shield power-up was active
    pub has_bandage: bool,
    /// Turn on which the win occurred.
    ///
    /// `None` only for entries produced under the legacy protocol, which
    /// had no turn-count bits. The absence of this field in a persisted
    /// entry is the only signal that it predates the current protocol, so
    /// it must round-trip as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_count: Option<u8>,
}

impl ScreenshotResult {
    /// A win decoded under the current protocol.
    pub fn win(file_key: String, heart_count: u8, has_bandage: bool, turn_count: u8) -> Self {
        Self {
            file_key,
            valid: true,
            heart_count,
            has_bandage,
            turn_count: Some(turn_count),
        }
    }

    /// A win decoded under the legacy protocol (no turn-count bits).
    pub fn legacy_win(file_key: String, heart_count: u8, has_bandage: bool) -> Self {
        Self {
            file_key,
            valid: true,
            heart_count,
            has_bandage,
            turn_count: None,
        }
    }

    /// The sentinel outcome: not a screenshot. Cached so the file is never
    /// reprocessed.
    pub fn invalid(file_key: String) -> Self {
        Self {
            file_key,
            valid: false,
            heart_count: 0,
            has_bandage: false,
            turn_count: Some(0),
        }
    }

    /// Whether this entry was produced under the legacy protocol.
    pub fn is_legacy(&self) -> bool {
        self.turn_count.is_none()
    }
}
