//! Oracle module interface and arena management
//!
//! The image-recognition oracle is an external binary module. It exports a
//! growable linear memory, a bump allocation entry point, the classifier
//! itself, and a diagnostic byte-summing entry point. This module models
//! that ABI as the [`OracleModule`] trait and layers the arena discipline
//! on top in [`ArenaBridge`]:
//!
//! - memory is grown to a fixed ceiling once at startup, not per file;
//! - allocations only ever come from the module's own bump allocator;
//! - nothing is ever freed, so the bump offset is monotonic for the life
//!   of the process and exhaustion is a modeled end state.

mod bridge;
pub mod builtin;

pub use bridge::{ArenaBridge, ArenaState};
pub use builtin::BuiltinOracle;

use crate::codec::Protocol;
use crate::error::Result;

/// Size of one linear-memory page in bytes.
pub const PAGE_SIZE: usize = 64 * 1024;

/// The binary module's exported surface.
///
/// Pointers are offsets into the module's linear memory, which is why the
/// bridge, not the caller, owns all bookkeeping about what is live.
pub trait OracleModule {
    /// Protocol revision this module speaks, resolved from its exports
    /// when it is loaded. Never inferred from result values.
    fn protocol(&self) -> Protocol;

    /// Current linear memory size in bytes.
    fn memory_size(&self) -> usize;

    /// Grow linear memory by whole pages.
    fn grow(&mut self, additional_pages: u32) -> Result<()>;

    /// Bump-allocate a region of at least `size` bytes. There is no
    /// corresponding free.
    fn alloc(&mut self, size: usize) -> Result<u32>;

    /// Copy bytes into linear memory at `ptr`.
    fn write(&mut self, ptr: u32, bytes: &[u8]) -> Result<()>;

    /// Classify the image at `ptr..ptr+len`. Returns the packed outcome
    /// word, or the sentinel `-1` for bytes that are not an outcome
    /// screenshot.
    fn classify(&mut self, ptr: u32, len: usize) -> Result<i64>;

    /// Diagnostic entry point: sum of the bytes at `ptr..ptr+len`. Used
    /// only by the startup self-test.
    fn debug_sum(&mut self, ptr: u32, len: usize) -> Result<u64>;
}
