//! Built-in oracle module
//!
//! An in-process implementation of the module ABI used when no external
//! classifier module is configured. It keeps a real linear memory with
//! page-granular growth and a bump allocator, so the arena discipline is
//! exercised exactly as it is against the production module.
//!
//! The classifier here is the same placeholder the tool originally shipped
//! with: it validates the PNG container and emits the image width as the
//! raw outcome word (or the sentinel for anything that is not a PNG).
//! Actual pixel recognition lives in the external module and is not
//! reproduced here.

use super::{OracleModule, PAGE_SIZE};
use crate::codec::{Protocol, SENTINEL};
use crate::error::{Error, Result};

/// Pages instantiated before the bridge grows the memory.
pub const INITIAL_PAGES: u32 = 10;
/// Default growth ceiling in pages.
pub const DEFAULT_MAX_PAGES: u32 = 200;

/// Allocations start above the module's bookkeeping region.
const HEAP_BASE: usize = 1024;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub struct BuiltinOracle {
    memory: Vec<u8>,
    max_pages: u32,
    bump: usize,
}

impl BuiltinOracle {
    pub fn new(max_pages: u32) -> Self {
        Self::with_layout(INITIAL_PAGES, max_pages)
    }

    pub fn with_layout(initial_pages: u32, max_pages: u32) -> Self {
        Self {
            memory: vec![0; initial_pages as usize * PAGE_SIZE],
            max_pages,
            bump: HEAP_BASE,
        }
    }

    fn pages(&self) -> u32 {
        (self.memory.len() / PAGE_SIZE) as u32
    }

    fn region(&self, ptr: u32, len: usize) -> Result<&[u8]> {
        let start = ptr as usize;
        let end = start
            .checked_add(len)
            .filter(|&e| e <= self.memory.len())
            .ok_or_else(|| Error::Oracle(format!("region {}+{} out of bounds", start, len)))?;
        Ok(&self.memory[start..end])
    }
}

impl Default for BuiltinOracle {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl OracleModule for BuiltinOracle {
    fn protocol(&self) -> Protocol {
        Protocol::TurnCount
    }

    fn memory_size(&self) -> usize {
        self.memory.len()
    }

    fn grow(&mut self, additional_pages: u32) -> Result<()> {
        if self.pages() + additional_pages > self.max_pages {
            return Err(Error::Oracle(format!(
                "cannot grow past {} pages",
                self.max_pages
            )));
        }
        self.memory
            .resize(self.memory.len() + additional_pages as usize * PAGE_SIZE, 0);
        Ok(())
    }

    fn alloc(&mut self, size: usize) -> Result<u32> {
        let ptr = self.bump;
        let end = ptr
            .checked_add(size)
            .ok_or_else(|| Error::Oracle("allocation size overflow".to_string()))?;
        if end > self.memory.len() {
            return Err(Error::Oracle(format!(
                "out of linear memory: need {} bytes at offset {}",
                size, ptr
            )));
        }
        self.bump = end;
        Ok(ptr as u32)
    }

    fn write(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        let start = ptr as usize;
        let end = start
            .checked_add(bytes.len())
            .filter(|&e| e <= self.memory.len())
            .ok_or_else(|| Error::Oracle(format!("write at {} out of bounds", start)))?;
        self.memory[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn classify(&mut self, ptr: u32, len: usize) -> Result<i64> {
        let bytes = self.region(ptr, len)?;
        Ok(png_width(bytes).map(|w| w as i64).unwrap_or(SENTINEL))
    }

    fn debug_sum(&mut self, ptr: u32, len: usize) -> Result<u64> {
        let bytes = self.region(ptr, len)?;
        Ok(bytes.iter().map(|&b| b as u64).sum())
    }
}

/// Width from the IHDR chunk of a PNG, or `None` if the container is not
/// a PNG.
fn png_width(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    Some(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]))
}
