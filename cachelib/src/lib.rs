//! # CacheLib
//!
//! Cachelib is a library for set-associative cache simulation
//!
//! It provides a cache model which can be parameterised by a replacement policy (LFU, LRU or
//! Random) and a write policy (write-through or write-back), and a simulator which replays
//! read/write traces against it while collecting hit, miss and memory traffic counters
//!
//! Only tags, valid bits and dirty bits are modelled, data payloads are never stored

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains definitions for the JSON configuration format, shared with the command line
pub mod config;

/// Error types for configuration and trace parsing
pub mod error;

/// Memory maps trace files
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Formats simulation results together with the configuration that produced them
pub mod report;

/// Contains the simulator used to replay a trace with a given cache configuration
pub mod simulator;

/// Parsing for the supported trace grammars
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for running tests and benchmarks.
pub mod util;
