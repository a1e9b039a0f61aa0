use std::collections::HashSet;
use crate::cache::{Cache, CacheTrait, Line, Operation};
use crate::config::{CacheConfig, MemoryConfig, ReplacementPolicyConfig, SimulationConfig, WritePolicy};
use crate::error::ConfigError;
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed, Random, ReplacementPolicy};
use crate::simulator::Simulator;
use crate::util::random_records;

const BLOCK_SIZE: u64 = 16;
const SET_COUNT: u64 = 4;

fn cache_config(lines_per_set: u64, write_policy: WritePolicy, replacement_policy: ReplacementPolicyConfig) -> CacheConfig {
    CacheConfig {
        set_count: SET_COUNT,
        lines_per_set,
        block_size: BLOCK_SIZE,
        hit_time: 10,
        write_policy,
        replacement_policy,
    }
}

fn new_cache<R: ReplacementPolicy>(lines_per_set: u64, write_policy: WritePolicy, policy: R) -> Cache<R> {
    // The policy enum only matters to the simulator, the cache uses the instance it is given
    let config = cache_config(lines_per_set, write_policy, ReplacementPolicyConfig::LeastRecentlyUsed);
    Cache::new(&config, &MemoryConfig::default(), policy).unwrap()
}

/// An address in set 0 carrying the given tag
fn set_zero_address(tag: u64) -> u64 {
    tag * SET_COUNT * BLOCK_SIZE
}

fn valid_tags<C: CacheTrait>(cache: &C, set: u64) -> Vec<u64> {
    let mut tags: Vec<u64> = cache.get_set(set).iter().filter(|l| l.valid).map(|l| l.tag).collect();
    tags.sort();
    tags
}

#[test]
fn address_decomposition_uses_one_block_number() {
    let cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    assert_eq!(cache.address_to_set_and_tag(0), (0, 0));
    assert_eq!(cache.address_to_set_and_tag(15), (0, 0));
    assert_eq!(cache.address_to_set_and_tag(16), (1, 0));
    assert_eq!(cache.address_to_set_and_tag(63), (3, 0));
    assert_eq!(cache.address_to_set_and_tag(64), (0, 1));
    assert_eq!(cache.address_to_set_and_tag(0x1234), (3, 72));
    for address in [0, 7, 100, 4096, u64::MAX] {
        assert_eq!(cache.address_to_set_and_tag(address), cache.address_to_set_and_tag(address));
    }
}

#[test]
fn addresses_collide_only_within_a_block() {
    let cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    for a in 0..512u64 {
        for b in (a..512u64).step_by(7) {
            let same_block = a / BLOCK_SIZE == b / BLOCK_SIZE;
            assert_eq!(cache.address_to_set_and_tag(a) == cache.address_to_set_and_tag(b), same_block, "{a} {b}");
        }
    }
}

#[test]
fn non_power_of_two_geometry() {
    let config = CacheConfig { set_count: 3, block_size: 12, ..CacheConfig::default() };
    let cache = Cache::new(&config, &MemoryConfig::default(), LeastRecentlyUsed).unwrap();
    // Block 10, set 10 % 3, tag 10 / 3
    assert_eq!(cache.address_to_set_and_tag(125), (1, 3));
}

#[test]
fn rejects_empty_geometry() {
    let memory = MemoryConfig::default();
    let base = cache_config(2, WritePolicy::WriteBack, ReplacementPolicyConfig::LeastRecentlyUsed);
    let cases = [
        (CacheConfig { set_count: 0, ..base.clone() }, "set_count"),
        (CacheConfig { lines_per_set: 0, ..base.clone() }, "lines_per_set"),
        (CacheConfig { block_size: 0, ..base.clone() }, "block_size"),
    ];
    for (config, field) in cases {
        let result = Cache::new(&config, &memory, LeastFrequentlyUsed);
        assert_eq!(result.err(), Some(ConfigError::InvalidConfiguration { field }));
    }
}

#[test]
fn rejects_overflowing_geometry() {
    let memory = MemoryConfig::default();
    let config = CacheConfig {
        set_count: 1 << 32,
        lines_per_set: 1 << 32,
        ..cache_config(2, WritePolicy::WriteBack, ReplacementPolicyConfig::LeastRecentlyUsed)
    };
    let expected = Some(ConfigError::InvalidConfiguration { field: "lines_per_set" });
    assert_eq!(config.validate().err(), expected);
    assert_eq!(Cache::new(&config, &memory, LeastRecentlyUsed).err(), expected);
    let simulation = SimulationConfig { cache: config.clone(), memory };
    assert_eq!(Simulator::new(&simulation, None).err(), expected);
    assert_eq!(config.total_lines(), u64::MAX);
    let largest = CacheConfig { set_count: u64::MAX, lines_per_set: 2, ..config };
    assert!(largest.validate().is_err());
}

#[test]
fn starts_with_every_line_invalid() {
    let cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    assert_eq!(cache.get_uninitialised_line_count(), 8);
    for set in 0..SET_COUNT {
        assert!(cache.get_set(set).iter().all(|l| !l.valid && !l.dirty));
    }
}

#[test]
fn miss_then_hit_latencies() {
    let mut cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    let first = cache.access(40, Operation::Read);
    assert!(!first.hit);
    assert_eq!(first.latency, 100);
    assert_eq!(first.memory_reads, 1);
    let second = cache.access(47, Operation::Read);
    assert!(second.hit);
    assert_eq!(second.latency, 10);
    assert_eq!(second.memory_reads, 0);
}

#[test]
fn repeated_reads_hit_for_every_policy() {
    fn check<R: ReplacementPolicy>(mut cache: Cache<R>) {
        assert!(!cache.access(0x2a0, Operation::Read).hit);
        for _ in 0..50 {
            let outcome = cache.access(0x2a0, Operation::Read);
            assert!(outcome.hit);
            assert_eq!(outcome.latency, 10);
        }
    }
    check(new_cache(1, WritePolicy::WriteBack, LeastFrequentlyUsed));
    check(new_cache(2, WritePolicy::WriteThrough, LeastRecentlyUsed));
    check(new_cache(4, WritePolicy::WriteBack, Random::new(Some(3))));
}

#[test]
fn empty_lines_are_filled_in_order() {
    let mut cache = new_cache(4, WritePolicy::WriteBack, LeastFrequentlyUsed);
    for tag in 0..4 {
        cache.access(set_zero_address(tag), Operation::Read);
        assert_eq!(cache.get_set(0)[tag as usize].tag, tag);
        assert!(cache.get_set(0)[tag as usize].valid);
    }
    assert_eq!(cache.get_uninitialised_line_count(), 12);
}

#[test]
fn only_the_target_set_changes() {
    let mut cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    cache.access(16, Operation::Write);
    for set in [0, 2, 3] {
        assert!(cache.get_set(set).iter().all(|l| !l.valid));
    }
    assert_eq!(valid_tags(&cache, 1), vec![0]);
}

#[test]
fn lru_evicts_least_recently_used() {
    let mut cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    let (t1, t2, t3) = (set_zero_address(1), set_zero_address(2), set_zero_address(3));
    assert!(!cache.access(t1, Operation::Read).hit);
    assert!(!cache.access(t2, Operation::Read).hit);
    assert!(cache.access(t1, Operation::Read).hit);
    assert!(!cache.access(t3, Operation::Read).hit);
    assert_eq!(valid_tags(&cache, 0), vec![1, 3]);
    // T3 took T2's slot
    assert_eq!(cache.get_set(0)[1].tag, 3);
    assert!(cache.access(t1, Operation::Read).hit);
    assert!(!cache.access(t2, Operation::Read).hit);
}

#[test]
fn lru_recency_ages_other_lines() {
    let mut cache = new_cache(3, WritePolicy::WriteBack, LeastRecentlyUsed);
    for tag in 0..3 {
        cache.access(set_zero_address(tag), Operation::Read);
    }
    let recency: Vec<u64> = cache.get_set(0).iter().map(|l| l.recency).collect();
    assert_eq!(recency, vec![2, 1, 0]);
    cache.access(set_zero_address(0), Operation::Read);
    let recency: Vec<u64> = cache.get_set(0).iter().map(|l| l.recency).collect();
    assert_eq!(recency, vec![0, 2, 1]);
    // Line 1 is now the oldest
    cache.access(set_zero_address(7), Operation::Read);
    assert_eq!(cache.get_set(0)[1].tag, 7);
}

#[test]
fn lfu_evicts_least_frequently_used() {
    let mut cache = new_cache(2, WritePolicy::WriteBack, LeastFrequentlyUsed);
    let (t1, t2, t3) = (set_zero_address(1), set_zero_address(2), set_zero_address(3));
    cache.access(t1, Operation::Read);
    for _ in 0..3 {
        cache.access(t2, Operation::Read);
    }
    assert_eq!(cache.get_set(0)[0].frequency, 1);
    assert_eq!(cache.get_set(0)[1].frequency, 3);
    assert!(!cache.access(t3, Operation::Read).hit);
    assert_eq!(valid_tags(&cache, 0), vec![2, 3]);
    assert_eq!(cache.get_set(0)[0].frequency, 1);
}

#[test]
fn lfu_ties_go_to_the_lowest_index() {
    let mut cache = new_cache(3, WritePolicy::WriteBack, LeastFrequentlyUsed);
    for tag in 0..3 {
        cache.access(set_zero_address(tag), Operation::Read);
    }
    cache.access(set_zero_address(9), Operation::Read);
    assert_eq!(cache.get_set(0)[0].tag, 9);
    cache.access(set_zero_address(9), Operation::Read);
    // Lines 1 and 2 tie below line 0
    cache.access(set_zero_address(10), Operation::Read);
    assert_eq!(cache.get_set(0)[1].tag, 10);
    // The line just loaded is still the first minimum
    cache.access(set_zero_address(11), Operation::Read);
    assert_eq!(cache.get_set(0)[0].tag, 9);
    assert_eq!(cache.get_set(0)[1].tag, 11);
    assert_eq!(cache.get_set(0)[2].tag, 2);
}

#[test]
fn write_back_defers_memory_writes() {
    let mut cache = new_cache(2, WritePolicy::WriteBack, LeastRecentlyUsed);
    cache.access(set_zero_address(1), Operation::Read);
    let write = cache.access(set_zero_address(1), Operation::Write);
    assert!(write.hit);
    assert_eq!(write.memory_writes, 0);
    assert!(cache.get_set(0)[0].dirty);

    cache.access(set_zero_address(2), Operation::Read);
    // Tag 1 is least recently used and dirty
    let eviction = cache.access(set_zero_address(3), Operation::Read);
    assert!(!eviction.hit);
    assert!(eviction.evicted_dirty);
    assert_eq!(eviction.memory_writes, 1);
    assert_eq!(eviction.memory_reads, 1);
    assert!(!cache.get_set(0)[0].dirty);
}

#[test]
fn write_back_write_miss_loads_dirty_line() {
    let mut cache = new_cache(1, WritePolicy::WriteBack, LeastRecentlyUsed);
    let outcome = cache.access(set_zero_address(5), Operation::Write);
    assert!(!outcome.hit);
    assert!(!outcome.evicted_dirty);
    assert_eq!(outcome.memory_reads, 1);
    assert_eq!(outcome.memory_writes, 0);
    assert!(cache.get_set(0)[0].dirty);
    assert_eq!(cache.get_set(0)[0].frequency, 1);

    let dirty_eviction = cache.access(set_zero_address(6), Operation::Read);
    assert!(dirty_eviction.evicted_dirty);
    assert!(!cache.access(set_zero_address(7), Operation::Read).evicted_dirty);
}

#[test]
fn write_through_writes_every_time() {
    let mut cache = new_cache(1, WritePolicy::WriteThrough, LeastRecentlyUsed);
    let miss = cache.access(set_zero_address(1), Operation::Write);
    assert!(!miss.hit);
    assert_eq!(miss.memory_reads, 1);
    assert_eq!(miss.memory_writes, 1);
    for _ in 0..3 {
        let hit = cache.access(set_zero_address(1), Operation::Write);
        assert!(hit.hit);
        assert_eq!(hit.memory_writes, 1);
        assert!(!cache.get_set(0)[0].dirty);
    }
    let eviction = cache.access(set_zero_address(2), Operation::Read);
    assert!(!eviction.evicted_dirty);
    assert_eq!(eviction.memory_writes, 0);
}

#[test]
fn random_policy_keeps_sets_consistent() {
    for seed in 0..32 {
        let config = SimulationConfig {
            cache: CacheConfig {
                set_count: 4,
                lines_per_set: 4,
                block_size: 8,
                hit_time: 1,
                write_policy: WritePolicy::WriteBack,
                replacement_policy: ReplacementPolicyConfig::Random,
            },
            memory: MemoryConfig::default(),
        };
        let mut simulator = Simulator::new(&config, Some(seed)).unwrap();
        let mut evicted_dirty = 0;
        for record in random_records(2000, 1024, 0.4, seed) {
            if simulator.access(record.address, record.operation).evicted_dirty {
                evicted_dirty += 1;
            }
            let cache = simulator.get_cache();
            let (set, _) = cache.address_to_set_and_tag(record.address);
            let lines = cache.get_set(set);
            let tags: HashSet<u64> = lines.iter().filter(|l| l.valid).map(|l| l.tag).collect();
            assert_eq!(tags.len(), lines.iter().filter(|l| l.valid).count());
            assert!(lines.iter().all(|l| l.valid || !l.dirty));
        }
        let result = simulator.get_result();
        assert_eq!(result.write_backs, evicted_dirty);
        assert_eq!(result.memory_reads, result.misses);
        assert_eq!(result.memory_writes, result.write_backs);
        assert_eq!(result.hits + result.misses, 2000);
    }
}

#[test]
fn random_victim_stays_in_range() {
    let mut policy = Random::new(None);
    let set = vec![Line::default(); 5];
    for _ in 0..1000 {
        assert!(policy.select_victim(&set) < 5);
    }
}
