use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// A full simulation configuration, the cache geometry plus main memory timings
///
/// Every field has a default, so a JSON file only needs to name the values it changes
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    pub cache: CacheConfig,
    pub memory: MemoryConfig,
}

/// A configuration for a single set-associative cache
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub set_count: u64,
    pub lines_per_set: u64,
    /// Bytes per block. Powers of two are usual but not required
    pub block_size: u64,
    pub hit_time: u64,
    pub write_policy: WritePolicy,
    pub replacement_policy: ReplacementPolicyConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            set_count: 8,
            lines_per_set: 4,
            block_size: 16,
            hit_time: 10,
            write_policy: WritePolicy::WriteBack,
            replacement_policy: ReplacementPolicyConfig::LeastRecentlyUsed,
        }
    }
}

impl CacheConfig {
    /// Checks that the geometry describes a cache with at least one line
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::config::CacheConfig;
    /// use cachelib::error::ConfigError;
    /// let config = CacheConfig { block_size: 0, ..CacheConfig::default() };
    /// assert_eq!(config.validate(), Err(ConfigError::InvalidConfiguration { field: "block_size" }));
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.set_count == 0 {
            return Err(ConfigError::InvalidConfiguration { field: "set_count" });
        }
        if self.lines_per_set == 0 {
            return Err(ConfigError::InvalidConfiguration { field: "lines_per_set" });
        }
        if self.block_size == 0 {
            return Err(ConfigError::InvalidConfiguration { field: "block_size" });
        }
        // Every line is indexed with usize
        let total_lines = self.set_count.checked_mul(self.lines_per_set);
        if total_lines.and_then(|lines| usize::try_from(lines).ok()).is_none() {
            return Err(ConfigError::InvalidConfiguration { field: "lines_per_set" });
        }
        Ok(())
    }

    /// The number of lines in the cache. Exact for any configuration which passes `validate`,
    /// saturates otherwise
    pub fn total_lines(&self) -> u64 {
        self.set_count.saturating_mul(self.lines_per_set)
    }
}

/// Fixed latencies of the backing store
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct MemoryConfig {
    pub read_time: u64,
    pub write_time: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            read_time: 100,
            write_time: 100,
        }
    }
}

/// When writes reach main memory - immediately, or when a dirty line is evicted
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
pub enum WritePolicy {
    #[serde(alias = "wt", alias = "write-through")]
    #[value(name = "wt", alias = "write-through")]
    WriteThrough,
    #[serde(alias = "wb", alias = "write-back")]
    #[value(name = "wb", alias = "write-back")]
    WriteBack,
}

/// Legacy integer codes, 0 is write-through and 1 is write-back
impl TryFrom<u8> for WritePolicy {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WritePolicy::WriteThrough),
            1 => Ok(WritePolicy::WriteBack),
            code => Err(ConfigError::UnknownWritePolicy(code)),
        }
    }
}

/// The replacement policy used once a set is full - lfu, lru, or random
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq, ValueEnum)]
pub enum ReplacementPolicyConfig {
    #[serde(alias = "lfu")]
    #[value(name = "lfu")]
    LeastFrequentlyUsed,
    #[serde(alias = "lru")]
    #[value(name = "lru")]
    LeastRecentlyUsed,
    #[serde(alias = "random")]
    #[value(name = "random")]
    Random,
}

/// Legacy integer codes, 0 is LFU, 1 is LRU and 2 is Random
impl TryFrom<u8> for ReplacementPolicyConfig {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReplacementPolicyConfig::LeastFrequentlyUsed),
            1 => Ok(ReplacementPolicyConfig::LeastRecentlyUsed),
            2 => Ok(ReplacementPolicyConfig::Random),
            code => Err(ConfigError::UnknownReplacementPolicy(code)),
        }
    }
}
