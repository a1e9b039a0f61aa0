use log::debug;
use serde::{Deserialize, Serialize};
use crate::config::{CacheConfig, MemoryConfig, WritePolicy};
use crate::error::ConfigError;
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed, Random, ReplacementPolicy};

/// The kind of a memory access
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Read,
    Write,
}

/// A single cache slot. Only metadata is modelled, there is no data payload
///
/// An invalid line is never dirty, and its tag is meaningless
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u64,
    /// Set when the line was written under write-back and not yet written to memory
    pub dirty: bool,
    /// Accesses to the set since this line was last touched, 0 is most recently used
    pub recency: u64,
    /// Accesses since this line was loaded, including the load
    pub frequency: u64,
}

/// What a single access did. Produced for the caller and not retained by the cache
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AccessOutcome {
    pub hit: bool,
    pub latency: u64,
    /// A dirty line was written back to make room for the new block
    pub evicted_dirty: bool,
    /// Block loads issued to main memory
    pub memory_reads: u64,
    /// Writes issued to main memory, both write-through writes and write-backs
    pub memory_writes: u64,
}

/// A generic trait for caches
///
/// The simulator dispatches through GenericCache rather than dyn CacheTrait, but the trait keeps
/// the shape of every cache the same and lets tests drive any instantiation
pub trait CacheTrait {

    /// Converts an address into a set index and a tag
    ///
    /// Both come from the same block number, `address / block_size`: the set is the block number
    /// modulo the set count and the tag is the block number divided by the set count. Two
    /// addresses therefore share a (set, tag) pair exactly when they fall in the same block
    ///
    /// # Arguments
    ///
    /// * `address`:
    ///
    /// returns: (u64, u64)
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64);

    /// Performs a read or a write, returning whether it hit along with the latency and memory
    /// traffic it caused
    ///
    /// Only the set the address maps to is modified
    ///
    /// # Arguments
    ///
    /// * `address`: The byte address of the access
    /// * `operation`: Read or write
    ///
    /// returns: AccessOutcome
    fn access(&mut self, address: u64, operation: Operation) -> AccessOutcome;

    /// Gets a read-only view of the lines of one set
    fn get_set(&self, set: u64) -> &[Line];

    /// Gets the block size used by this cache
    fn get_block_size(&self) -> u64;

    /// Gets the number of lines that have never been loaded. Useful for analysing cache
    /// performance or debugging
    fn get_uninitialised_line_count(&self) -> usize;
}

/// A set-associative cache, parameterised by a replacement policy
///
/// Lines are stored in one flat vector, set `s` occupies `s * lines_per_set..(s + 1) * lines_per_set`
pub struct Cache<R: ReplacementPolicy> {
    set_count: u64,
    lines_per_set: usize,
    block_size: u64,
    hit_time: u64,
    miss_penalty: u64,
    write_policy: WritePolicy,
    lines: Vec<Line>,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    /// Creates a cache with every line invalid
    ///
    /// The miss penalty is the read time of main memory
    ///
    /// # Arguments
    ///
    /// * `config`: The cache geometry and policies. Rejected if any dimension is zero
    /// * `memory`: Main memory timings
    /// * `policy`: The replacement policy, which should match `config.replacement_policy`
    ///
    /// returns: Result<Cache<R>, ConfigError>
    pub fn new(config: &CacheConfig, memory: &MemoryConfig, policy: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            set_count: config.set_count,
            lines_per_set: config.lines_per_set as usize,
            block_size: config.block_size,
            hit_time: config.hit_time,
            miss_penalty: memory.read_time,
            write_policy: config.write_policy,
            lines: vec![Line::default(); config.total_lines() as usize],
            replacement_policy: policy,
        })
    }

    /// Marks `index` as the most recently used line of the set and ages the other valid lines
    fn touch(set: &mut [Line], index: usize) {
        for (i, line) in set.iter_mut().enumerate() {
            if i == index {
                line.recency = 0;
            } else if line.valid {
                line.recency = line.recency.saturating_add(1);
            }
        }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {

    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64) {
        let block = address / self.block_size;
        (block % self.set_count, block / self.set_count)
    }

    fn access(&mut self, address: u64, operation: Operation) -> AccessOutcome {
        let (set, tag) = self.address_to_set_and_tag(address);
        let set_lower_bound = set as usize * self.lines_per_set;
        let set_upper_bound = set_lower_bound + self.lines_per_set;
        let is_write = operation == Operation::Write;
        let set_lines = &mut self.lines[set_lower_bound..set_upper_bound];

        // Only search the relevant set
        if let Some(index) = set_lines.iter().position(|line| line.valid && line.tag == tag) {
            let line = &mut set_lines[index];
            line.frequency += 1;
            let mut memory_writes = 0;
            if is_write {
                match self.write_policy {
                    WritePolicy::WriteThrough => memory_writes += 1,
                    WritePolicy::WriteBack => line.dirty = true,
                }
            }
            Self::touch(set_lines, index);
            return AccessOutcome {
                hit: true,
                latency: self.hit_time,
                evicted_dirty: false,
                memory_reads: 0,
                memory_writes,
            };
        }

        // Cache miss, fill an empty line before evicting anything
        let victim = match set_lines.iter().position(|line| !line.valid) {
            Some(index) => index,
            None => self.replacement_policy.select_victim(set_lines),
        };
        let line = &mut set_lines[victim];
        // Dirty bits are only ever set under write-back
        let evicted_dirty = line.valid && line.dirty;
        let mut memory_writes = 0;
        if evicted_dirty {
            debug!("set {set}: writing back dirty line {victim} (tag {:#x})", line.tag);
            memory_writes += 1;
        } else if line.valid {
            debug!("set {set}: evicting clean line {victim} (tag {:#x})", line.tag);
        }
        line.valid = true;
        line.tag = tag;
        line.frequency = 1;
        line.dirty = is_write && self.write_policy == WritePolicy::WriteBack;
        if is_write && self.write_policy == WritePolicy::WriteThrough {
            memory_writes += 1;
        }
        Self::touch(set_lines, victim);
        AccessOutcome {
            hit: false,
            latency: self.miss_penalty,
            evicted_dirty,
            memory_reads: 1,
            memory_writes,
        }
    }

    fn get_set(&self, set: u64) -> &[Line] {
        let set_lower_bound = set as usize * self.lines_per_set;
        &self.lines[set_lower_bound..set_lower_bound + self.lines_per_set]
    }

    fn get_block_size(&self) -> u64 {
        self.block_size
    }

    fn get_uninitialised_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}

/// Enum for the three replacement policies provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but every access would go through a vtable,
/// which the compiler can't see through
///
/// It's much faster to explicitly branch on all implementations, as the compiler can reason about
/// the concrete types, perform function inlining etc
pub enum GenericCache {
    LeastFrequentlyUsed(Cache<LeastFrequentlyUsed>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    Random(Cache<Random>),
}

impl From<Cache<LeastFrequentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastFrequentlyUsed>) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<Random>> for GenericCache {
    fn from(value: Cache<Random>) -> Self {
        Self::Random(value)
    }
}

impl CacheTrait for GenericCache {
    fn address_to_set_and_tag(&self, address: u64) -> (u64, u64) {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.address_to_set_and_tag(address),
            GenericCache::LeastRecentlyUsed(c) => c.address_to_set_and_tag(address),
            GenericCache::Random(c) => c.address_to_set_and_tag(address),
        }
    }

    fn access(&mut self, address: u64, operation: Operation) -> AccessOutcome {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.access(address, operation),
            GenericCache::LeastRecentlyUsed(c) => c.access(address, operation),
            GenericCache::Random(c) => c.access(address, operation),
        }
    }

    fn get_set(&self, set: u64) -> &[Line] {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.get_set(set),
            GenericCache::LeastRecentlyUsed(c) => c.get_set(set),
            GenericCache::Random(c) => c.get_set(set),
        }
    }

    fn get_block_size(&self) -> u64 {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.get_block_size(),
            GenericCache::LeastRecentlyUsed(c) => c.get_block_size(),
            GenericCache::Random(c) => c.get_block_size(),
        }
    }

    fn get_uninitialised_line_count(&self) -> usize {
        match self {
            GenericCache::LeastFrequentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::LeastRecentlyUsed(c) => c.get_uninitialised_line_count(),
            GenericCache::Random(c) => c.get_uninitialised_line_count(),
        }
    }
}
