use std::time::{Duration, Instant};
use log::{info, log_enabled, trace, warn, Level};
use serde::{Deserialize, Serialize};
use crate::cache::{AccessOutcome, Cache, CacheTrait, GenericCache, Operation};
use crate::config::{ReplacementPolicyConfig, SimulationConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed, Random};
use crate::trace::{TraceFormat, TraceReader, TraceRecord};

/// The simulator feeds trace records to the cache, and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
pub struct Simulator {
    config: SimulationConfig,
    cache: GenericCache,
    result: SimulationResult,
    simulation_time: Duration,
}

/// Aggregate counters for a run. Updated after every access and never reset
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct SimulationResult {
    pub total_addresses: u64,
    pub total_reads: u64,
    pub total_writes: u64,
    pub hits: u64,
    pub misses: u64,
    pub read_hits: u64,
    pub write_hits: u64,
    pub write_backs: u64,
    pub memory_reads: u64,
    pub memory_writes: u64,
    /// Trace lines which did not match the grammar and were ignored
    pub skipped_records: u64,
}

/// Divides, reporting 0.0 instead of NaN when nothing was counted
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl SimulationResult {
    /// Applies the outcome of one access to the counters
    pub fn record(&mut self, operation: Operation, outcome: &AccessOutcome) {
        self.total_addresses += 1;
        match operation {
            Operation::Read => self.total_reads += 1,
            Operation::Write => self.total_writes += 1,
        }
        if outcome.hit {
            self.hits += 1;
            match operation {
                Operation::Read => self.read_hits += 1,
                Operation::Write => self.write_hits += 1,
            }
        } else {
            self.misses += 1;
        }
        if outcome.evicted_dirty {
            self.write_backs += 1;
        }
        self.memory_reads += outcome.memory_reads;
        self.memory_writes += outcome.memory_writes;
    }

    /// All hits over the number of reads, as reported next to the read count
    ///
    /// Hits of both kinds are counted, so this exceeds 1.0 on write-heavy traces. See
    /// `read_hit_ratio_by_kind` for the fraction of reads which hit
    pub fn read_hit_rate(&self) -> f64 {
        ratio(self.hits, self.total_reads)
    }

    /// All hits over the number of writes, the counterpart of `read_hit_rate`
    pub fn write_hit_rate(&self) -> f64 {
        ratio(self.hits, self.total_writes)
    }

    /// The fraction of reads which hit
    pub fn read_hit_ratio_by_kind(&self) -> f64 {
        ratio(self.read_hits, self.total_reads)
    }

    /// The fraction of writes which hit
    pub fn write_hit_ratio_by_kind(&self) -> f64 {
        ratio(self.write_hits, self.total_writes)
    }

    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.total_addresses)
    }

    /// Mean latency per access, a miss costs the memory read time on top of the hit time
    ///
    /// Computed in floating point, so large latencies lose precision rather than overflow
    ///
    /// # Examples
    ///
    /// ```
    /// use cachelib::simulator::SimulationResult;
    /// let result = SimulationResult { total_addresses: 4, hits: 3, misses: 1, ..Default::default() };
    /// assert_eq!(result.average_access_time(10, 100), 35.0);
    /// assert_eq!(SimulationResult::default().average_access_time(10, 100), 0.0);
    /// ```
    pub fn average_access_time(&self, hit_time: u64, memory_read_time: u64) -> f64 {
        if self.total_addresses == 0 {
            return 0.0;
        }
        let hit_time = hit_time as f64;
        let total_time = self.hits as f64 * hit_time + self.misses as f64 * (memory_read_time as f64 + hit_time);
        total_time / self.total_addresses as f64
    }
}

impl Simulator {

    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON
    /// * `seed`: Seed for the random replacement policy, ignored by the others. None seeds from
    /// the operating system
    ///
    /// returns: Result<Simulator, ConfigError>
    pub fn new(config: &SimulationConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let cache = Self::config_to_cache(config, seed)?;
        Ok(Self {
            config: config.clone(),
            cache,
            result: SimulationResult::default(),
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Performs a single access and updates the counters
    pub fn access(&mut self, address: u64, operation: Operation) -> AccessOutcome {
        let outcome = self.cache.access(address, operation);
        if log_enabled!(Level::Trace) {
            let (set, tag) = self.cache.address_to_set_and_tag(address);
            let kind = if outcome.hit { "hit" } else { "miss" };
            trace!("{operation:?} {address:#x} (set {set}, tag {tag:#x}): {kind} in {} ns", outcome.latency);
        }
        self.result.record(operation, &outcome);
        outcome
    }

    /// Simulates a sequence of already validated records
    pub fn simulate_records<I: IntoIterator<Item = TraceRecord>>(&mut self, records: I) -> &SimulationResult {
        let start = Instant::now();
        for record in records {
            self.access(record.address, record.operation);
        }
        self.simulation_time += Instant::now() - start;
        &self.result
    }

    /// Simulates the cache using a reference to a trace held in memory
    ///
    /// Records are processed strictly in file order. Lines which don't match the grammar are
    /// logged, counted as skipped, and otherwise ignored
    ///
    /// # Arguments
    ///
    /// * `bytes`: The trace, usually a memory mapped file
    /// * `format`: The grammar the trace is written in
    ///
    /// returns: &SimulationResult
    pub fn simulate(&mut self, bytes: &[u8], format: TraceFormat) -> &SimulationResult {
        let start = Instant::now();
        for record in TraceReader::new(bytes, format) {
            match record {
                Ok(record) => {
                    self.access(record.address, record.operation);
                }
                Err(e) => {
                    warn!("skipping record: {e}");
                    self.result.skipped_records += 1;
                }
            }
        }
        self.simulation_time += Instant::now() - start;
        info!(
            "simulated {} accesses ({} hits, {} misses, {} skipped)",
            self.result.total_addresses, self.result.hits, self.result.misses, self.result.skipped_records
        );
        &self.result
    }

    pub fn get_result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn get_config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn get_cache(&self) -> &GenericCache {
        &self.cache
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of lines which were never loaded
    pub fn get_uninitialised_line_count(&self) -> u64 {
        self.cache.get_uninitialised_line_count() as u64
    }

    /// Creates a new cache from a simulation configuration
    fn config_to_cache(config: &SimulationConfig, seed: Option<u64>) -> Result<GenericCache, ConfigError> {
        let (cache, memory) = (&config.cache, &config.memory);
        Ok(match cache.replacement_policy {
            ReplacementPolicyConfig::LeastFrequentlyUsed => {
                GenericCache::from(Cache::new(cache, memory, LeastFrequentlyUsed)?)
            }
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(Cache::new(cache, memory, LeastRecentlyUsed)?)
            }
            ReplacementPolicyConfig::Random => {
                GenericCache::from(Cache::new(cache, memory, Random::new(seed))?)
            }
        })
    }
}
