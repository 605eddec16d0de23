//! # Aging Block Cache
//!
//! Fixed pool of block-sized slots in front of a [`Storage`]. Byte-range reads
//! are split into block-aligned accesses; each access is served from a
//! resident slot (hit) or loaded into a reused slot (miss).
//!
//! Recency is approximated with bounded per-slot ages instead of an ordered
//! list: a hit or load bumps the touched slot, a miss decays every other
//! slot, and the victim on a full pool is the first slot with the smallest
//! age. See [`crate::slot`] for the floor policy.

use std::io::SeekFrom;

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::slot::CacheSlot;
use crate::stats::CacheStats;
use crate::storage::Storage;

/// Why a read stopped
#[derive(Debug)]
pub enum ReadStatus {
    /// Every requested byte was copied
    Complete,
    /// Storage has no data at the current position
    EndOfStorage,
    /// A seek or read failed while loading a block
    StorageError(CacheError),
}

/// Result of [`AgingBlockCache::read`]
///
/// `bytes` is always the number of bytes copied into the caller's buffer,
/// including when the read stopped early.
#[derive(Debug)]
#[must_use]
pub struct ReadOutcome {
    pub bytes: usize,
    pub status: ReadStatus,
}

impl ReadOutcome {
    fn new(bytes: usize, status: ReadStatus) -> Self {
        Self { bytes, status }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, ReadStatus::Complete)
    }

    pub fn is_end_of_storage(&self) -> bool {
        matches!(self.status, ReadStatus::EndOfStorage)
    }

    pub fn error(&self) -> Option<&CacheError> {
        match &self.status {
            ReadStatus::StorageError(e) => Some(e),
            _ => None,
        }
    }

    /// Byte count, or the storage error if one stopped the read
    pub fn into_result(self) -> Result<usize> {
        match self.status {
            ReadStatus::StorageError(e) => Err(e),
            _ => Ok(self.bytes),
        }
    }
}

/// Block cache with age-based replacement
///
/// Not thread-safe: every call runs the storage operations on the caller's
/// thread and concurrent use must be serialized externally.
#[derive(Debug)]
pub struct AgingBlockCache<S: Storage> {
    config: CacheConfig,
    storage: S,
    slots: Vec<CacheSlot>,
    stats: CacheStats,
}

impl<S: Storage> AgingBlockCache<S> {
    /// Create a cache over `storage`
    ///
    /// # Panics
    ///
    /// Panics if `config` is invalid (zero or non-power-of-two block size,
    /// zero slots). Use [`AgingBlockCache::try_new`] to get an error instead.
    pub fn new(config: CacheConfig, storage: S) -> Self {
        match Self::try_new(config, storage) {
            Ok(cache) => cache,
            Err(e) => panic!("block cache contract violation: {}", e),
        }
    }

    /// Create a cache over `storage`, rejecting an invalid configuration
    pub fn try_new(config: CacheConfig, storage: S) -> Result<Self> {
        config.validate()?;

        let slots = (0..config.slot_count)
            .map(|_| CacheSlot::new(config.block_size))
            .collect();

        log::debug!(
            "Created block cache: {} slots x {} bytes",
            config.slot_count,
            config.block_size
        );

        Ok(Self {
            config,
            storage,
            slots,
            stats: CacheStats::default(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn block_size(&self) -> usize {
        self.config.block_size
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Copy up to `buf.len()` bytes starting at `pos` into `buf`
    ///
    /// Stops at the first block that cannot be loaded; the outcome carries
    /// the bytes copied before that point and the reason.
    pub fn read(&mut self, pos: u64, buf: &mut [u8]) -> ReadOutcome {
        if buf.is_empty() {
            return ReadOutcome::new(0, ReadStatus::Complete);
        }

        let mut pos = pos;
        let mut copied = 0usize;

        while copied < buf.len() {
            let idx = match self.find_block(pos) {
                Some(idx) => {
                    self.stats.hits += 1;
                    self.slots[idx].touch();
                    log::trace!(
                        "Cache hit at {:#x}, age = {}",
                        pos,
                        self.slots[idx].age().get()
                    );
                    idx
                }
                None => {
                    self.stats.misses += 1;
                    log::trace!("Cache miss at {:#x}", pos);
                    match self.load_block(pos) {
                        Ok(Some(idx)) => {
                            self.slots[idx].touch();
                            self.decay_others(idx);
                            idx
                        }
                        Ok(None) => {
                            self.stats.load_failures += 1;
                            return ReadOutcome::new(copied, ReadStatus::EndOfStorage);
                        }
                        Err(e) => {
                            self.stats.load_failures += 1;
                            log::warn!("Block load at {:#x} failed: {}", pos, e);
                            return ReadOutcome::new(copied, ReadStatus::StorageError(e));
                        }
                    }
                }
            };

            let slot = &self.slots[idx];
            let offset = (pos - slot.block_start()) as usize;
            let available = slot.data_from(offset);
            if available.is_empty() {
                // short final block: nothing past its valid bytes
                return ReadOutcome::new(copied, ReadStatus::EndOfStorage);
            }

            let n = available.len().min(buf.len() - copied);
            buf[copied..copied + n].copy_from_slice(&available[..n]);
            copied += n;
            pos = pos.saturating_add(n as u64);
        }

        ReadOutcome::new(copied, ReadStatus::Complete)
    }

    /// Reserved: writes through the cache are not supported yet
    ///
    /// Always fails without touching the cache or the storage.
    pub fn write(&mut self, pos: u64, buf: &[u8]) -> Result<usize> {
        log::debug!("Rejected write of {} bytes at {:#x}", buf.len(), pos);
        Err(CacheError::Unsupported("write"))
    }

    /// Write every resident block back to storage and release its slot
    ///
    /// Failures are logged and the slot is left resident; the sweep always
    /// visits every slot. Returns the number of blocks written.
    pub fn flush(&mut self) -> usize {
        let mut written = 0;

        for (i, slot) in self.slots.iter_mut().enumerate() {
            if !slot.is_valid() {
                continue;
            }

            match write_back(&mut self.storage, slot) {
                Ok(()) => {
                    slot.invalidate();
                    written += 1;
                }
                Err(e) => {
                    log::warn!("Flush of slot[{}] failed: {}", i, e);
                }
            }
        }

        self.stats.flushed_blocks += written as u64;
        log::debug!("Flushed {} blocks", written);
        written
    }

    pub fn hit_count(&self) -> u64 {
        self.stats.hits
    }

    pub fn reset_hit_count(&mut self) {
        self.stats.hits = 0;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// Start offsets of all resident blocks, ascending
    pub fn resident_blocks(&self) -> Vec<u64> {
        let mut blocks: Vec<u64> = self
            .slots
            .iter()
            .filter(|slot| slot.is_valid())
            .map(CacheSlot::block_start)
            .collect();
        blocks.sort_unstable();
        blocks
    }

    /// Whether the block covering `pos` is resident
    pub fn is_resident(&self, pos: u64) -> bool {
        self.find_block(pos).is_some()
    }

    /// Index of the valid slot holding the block that covers `pos`
    fn find_block(&self, pos: u64) -> Option<usize> {
        let block_start = self.config.align_down(pos);
        self.slots.iter().position(|slot| slot.holds(block_start))
    }

    /// Slot to load into: the first free slot, else the first slot with
    /// the smallest age
    fn get_reuse(&self) -> usize {
        let mut victim = 0;
        let mut min_age = None;

        for (i, slot) in self.slots.iter().enumerate() {
            if !slot.is_valid() {
                return i;
            }
            if min_age.is_none_or(|age| slot.age() < age) {
                min_age = Some(slot.age());
                victim = i;
            }
        }

        victim
    }

    /// Load the block covering `pos` into a reused slot
    ///
    /// `Ok(None)` means storage returned no data for the block. The reused
    /// slot stays free if the load does not complete.
    fn load_block(&mut self, pos: u64) -> Result<Option<usize>> {
        let block_start = self.config.align_down(pos);
        let idx = self.get_reuse();

        if self.slots[idx].is_valid() {
            self.stats.evictions += 1;
            log::debug!(
                "Evicting block {:#x} from slot[{}] (age {})",
                self.slots[idx].block_start(),
                idx,
                self.slots[idx].age().get()
            );
        }

        let buf = self.slots[idx].begin_load(block_start);

        self.storage
            .seek(SeekFrom::Start(block_start))
            .map_err(|source| CacheError::Seek {
                offset: block_start,
                source,
            })?;

        let n = self
            .storage
            .read(buf)
            .map_err(|source| CacheError::Read {
                offset: block_start,
                source,
            })?;

        if n == 0 {
            log::debug!("No data at block {:#x}", block_start);
            return Ok(None);
        }

        self.slots[idx].fill(n);
        log::debug!(
            "Loaded block {:#x} into slot[{}], {} bytes",
            block_start,
            idx,
            n
        );

        Ok(Some(idx))
    }

    fn decay_others(&mut self, loaded: usize) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if i != loaded {
                slot.decay();
            }
        }
    }
}

impl<S: Storage> Drop for AgingBlockCache<S> {
    fn drop(&mut self) {
        for (i, slot) in self.slots.iter().enumerate() {
            log::debug!(
                "Releasing slot[{}]: block {:#x}, age = {}",
                i,
                slot.block_start(),
                slot.age().get()
            );
        }
    }
}

fn write_back<S: Storage>(storage: &mut S, slot: &CacheSlot) -> Result<()> {
    let offset = slot.block_start();

    storage
        .seek(SeekFrom::Start(offset))
        .map_err(|source| CacheError::Seek { offset, source })?;

    let written = storage
        .write(slot.data())
        .map_err(|source| CacheError::Write { offset, source })?;

    if written != slot.valid_len() {
        return Err(CacheError::ShortWrite {
            offset,
            expected: slot.valid_len(),
            written,
        });
    }

    Ok(())
}
