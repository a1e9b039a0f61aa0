use std::fmt;
use serde::Serialize;
use crate::config::{ReplacementPolicyConfig, SimulationConfig, WritePolicy};
use crate::simulator::SimulationResult;

/// The final report of a run: the configuration echo, the raw counters, and derived rates
///
/// Serialises to JSON, and displays as a plain text report
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub config: &'a SimulationConfig,
    pub result: &'a SimulationResult,
    pub read_hit_rate: f64,
    pub write_hit_rate: f64,
    pub read_hit_ratio_by_kind: f64,
    pub write_hit_ratio_by_kind: f64,
    pub hit_rate: f64,
    pub average_access_time: f64,
}

impl<'a> Report<'a> {
    pub fn new(config: &'a SimulationConfig, result: &'a SimulationResult) -> Self {
        Self {
            config,
            result,
            read_hit_rate: result.read_hit_rate(),
            write_hit_rate: result.write_hit_rate(),
            read_hit_ratio_by_kind: result.read_hit_ratio_by_kind(),
            write_hit_ratio_by_kind: result.write_hit_ratio_by_kind(),
            hit_rate: result.hit_rate(),
            average_access_time: result.average_access_time(config.cache.hit_time, config.memory.read_time),
        }
    }
}

fn write_policy_name(policy: WritePolicy) -> &'static str {
    match policy {
        WritePolicy::WriteThrough => "write-through",
        WritePolicy::WriteBack => "write-back",
    }
}

fn replacement_policy_name(policy: ReplacementPolicyConfig) -> &'static str {
    match policy {
        ReplacementPolicyConfig::LeastFrequentlyUsed => "LFU",
        ReplacementPolicyConfig::LeastRecentlyUsed => "LRU",
        ReplacementPolicyConfig::Random => "random",
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (cache, memory, result) = (&self.config.cache, &self.config.memory, self.result);
        writeln!(f, "Configuration:")?;
        writeln!(f, "Set count: {}", cache.set_count)?;
        writeln!(f, "Lines per set: {}", cache.lines_per_set)?;
        writeln!(f, "Block size: {} bytes", cache.block_size)?;
        writeln!(f, "Write policy: {}", write_policy_name(cache.write_policy))?;
        writeln!(f, "Hit time: {} ns", cache.hit_time)?;
        writeln!(f, "Replacement policy: {}", replacement_policy_name(cache.replacement_policy))?;
        writeln!(f, "Main memory read time: {} ns", memory.read_time)?;
        writeln!(f, "Main memory write time: {} ns", memory.write_time)?;
        writeln!(f)?;
        writeln!(f, "Results:")?;
        writeln!(f, "Total addresses: {}", result.total_addresses)?;
        writeln!(f, "Total reads: {}", result.total_reads)?;
        writeln!(f, "Total writes: {}", result.total_writes)?;
        writeln!(f, "Main memory writes: {}", result.memory_writes)?;
        writeln!(f, "Main memory reads: {}", result.memory_reads)?;
        writeln!(f, "Write-backs: {}", result.write_backs)?;
        writeln!(f, "Read hit rate: {:.4} ({})", self.read_hit_rate, result.total_reads)?;
        writeln!(f, "Write hit rate: {:.4} ({})", self.write_hit_rate, result.total_writes)?;
        writeln!(f, "Hit rate: {:.4} ({})", self.hit_rate, result.total_addresses)?;
        writeln!(f, "Reads that hit: {:.4} ({} of {})", self.read_hit_ratio_by_kind, result.read_hits, result.total_reads)?;
        writeln!(f, "Writes that hit: {:.4} ({} of {})", self.write_hit_ratio_by_kind, result.write_hits, result.total_writes)?;
        write!(f, "Average access time: {:.4} ns", self.average_access_time)?;
        if result.skipped_records > 0 {
            write!(f, "\nSkipped trace records: {}", result.skipped_records)?;
        }
        Ok(())
    }
}
