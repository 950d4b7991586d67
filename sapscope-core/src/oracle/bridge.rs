//! Arena bridge over a loaded oracle module
//!
//! The bridge is the only code that talks to the module. It mirrors the
//! module's bump allocator in [`ArenaState`] so exhaustion is detected on
//! this side as a first-class error instead of surfacing as a trap inside
//! the module.

use super::{OracleModule, PAGE_SIZE};
use crate::codec::Protocol;
use crate::error::{Error, Result};

/// Byte pattern written at offset 0 for the one-time startup self-test.
const SELF_TEST_PATTERN: [u8; 10] = [2, 1, 1, 1, 1, 1, 1, 1, 1, 1];
/// Expected `debug_sum` over [`SELF_TEST_PATTERN`].
const SELF_TEST_SUM: u64 = 11;

/// Mirror of the oracle's shared linear memory.
///
/// `bump_offset` only increases; there is no free operation. Repeated
/// classification of many large files exhausts the arena, which is a known
/// resource boundary of the batch, not a bug.
#[derive(Debug, Clone, Copy)]
pub struct ArenaState {
    /// Fixed capacity after the one-time startup growth.
    pub capacity_bytes: usize,
    /// High-water mark of all allocations handed out so far.
    pub bump_offset: usize,
}

/// Manages the oracle's linear memory and presents one synchronous
/// classification call per file.
pub struct ArenaBridge {
    module: Box<dyn OracleModule>,
    state: ArenaState,
    self_test: u64,
}

impl ArenaBridge {
    /// Load-time setup: grow memory to the ceiling once, then run the
    /// fixed self-test.
    ///
    /// Any trap here means the module is unusable and classification is
    /// disabled for the whole run ([`Error::OracleLoad`]). An unexpected
    /// self-test *value* is only surfaced, the returned value is kept for
    /// diagnostic display either way.
    pub fn new(mut module: Box<dyn OracleModule>, max_pages: u32) -> Result<Self> {
        let target = max_pages as usize * PAGE_SIZE;
        let current = module.memory_size();
        if current < target {
            let missing_pages = ((target - current) / PAGE_SIZE) as u32;
            module
                .grow(missing_pages)
                .map_err(|e| Error::OracleLoad(format!("failed to grow linear memory: {}", e)))?;
        }

        module
            .write(0, &SELF_TEST_PATTERN)
            .map_err(|e| Error::OracleLoad(format!("self-test write failed: {}", e)))?;
        let self_test = module
            .debug_sum(0, SELF_TEST_PATTERN.len())
            .map_err(|e| Error::OracleLoad(format!("self-test call failed: {}", e)))?;

        if self_test == SELF_TEST_SUM {
            tracing::info!(value = self_test, "Oracle self-test passed");
        } else {
            tracing::warn!(
                value = self_test,
                expected = SELF_TEST_SUM,
                "Oracle self-test returned unexpected value"
            );
        }

        let state = ArenaState {
            capacity_bytes: module.memory_size(),
            bump_offset: 0,
        };

        Ok(Self {
            module,
            state,
            self_test,
        })
    }

    /// Protocol revision the loaded module speaks.
    pub fn protocol(&self) -> Protocol {
        self.module.protocol()
    }

    /// Value the self-test returned, for diagnostic display.
    pub fn self_test_value(&self) -> u64 {
        self.self_test
    }

    pub fn arena(&self) -> ArenaState {
        self.state
    }

    /// Request a fresh region from the module's bump allocator.
    pub fn allocate(&mut self, size: usize) -> Result<u32> {
        if self.state.bump_offset + size > self.state.capacity_bytes {
            return Err(Error::ArenaExhausted {
                requested: size,
                offset: self.state.bump_offset,
                capacity: self.state.capacity_bytes,
            });
        }

        let ptr = self.module.alloc(size)?;
        let end = ptr as usize + size;
        if end > self.state.capacity_bytes {
            return Err(Error::Oracle(format!(
                "allocator returned out-of-range region {}..{}",
                ptr, end
            )));
        }
        if end > self.state.bump_offset {
            self.state.bump_offset = end;
        }
        Ok(ptr)
    }

    /// Copy file bytes into an allocated region.
    pub fn write_bytes(&mut self, ptr: u32, bytes: &[u8]) -> Result<()> {
        self.module.write(ptr, bytes)
    }

    /// Invoke the classifier on a written region.
    pub fn invoke_classifier(&mut self, ptr: u32, len: usize) -> Result<i64> {
        self.module.classify(ptr, len)
    }

    /// Allocate, write, and classify one file's bytes.
    pub fn classify_bytes(&mut self, bytes: &[u8]) -> Result<i64> {
        let ptr = self.allocate(bytes.len())?;
        self.write_bytes(ptr, bytes)?;
        self.invoke_classifier(ptr, bytes.len())
    }
}
