use std::fmt::Write;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::cache::Operation;
use crate::trace::{TraceFormat, TraceRecord};

/// Generates a reproducible stream of random accesses
///
/// # Arguments
///
/// * `length`: The number of records
/// * `address_space`: Addresses are drawn uniformly from `0..address_space`
/// * `write_ratio`: The probability of each record being a write. Clamped to 0..=1, NaN is
/// treated as 0
/// * `seed`: Seed for the generator
///
/// returns: Vec<TraceRecord>
pub fn random_records(length: usize, address_space: u64, write_ratio: f64, seed: u64) -> Vec<TraceRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let write_ratio = if write_ratio.is_nan() { 0.0 } else { write_ratio.clamp(0.0, 1.0) };
    (0..length)
        .map(|_| TraceRecord {
            address: rng.random_range(0..address_space.max(1)),
            operation: if rng.random_bool(write_ratio) { Operation::Write } else { Operation::Read },
        })
        .collect()
}

/// Renders a single record in the given grammar, without a line terminator
///
/// # Examples
///
/// ```
/// use cachelib::cache::Operation;
/// use cachelib::trace::{TraceFormat, TraceRecord};
/// use cachelib::util::format_record;
/// let record = TraceRecord { address: 255, operation: Operation::Write };
/// assert_eq!(format_record(&record, TraceFormat::HexSuffix), "ff W");
/// assert_eq!(format_record(&record, TraceFormat::DecimalPrefix), "1 255");
/// ```
pub fn format_record(record: &TraceRecord, format: TraceFormat) -> String {
    match (format, record.operation) {
        (TraceFormat::HexSuffix, Operation::Read) => format!("{:x} R", record.address),
        (TraceFormat::HexSuffix, Operation::Write) => format!("{:x} W", record.address),
        (TraceFormat::DecimalPrefix, Operation::Read) => format!("0 {}", record.address),
        (TraceFormat::DecimalPrefix, Operation::Write) => format!("1 {}", record.address),
    }
}

/// Renders records as the contents of a trace file
pub fn render_trace(records: &[TraceRecord], format: TraceFormat) -> Vec<u8> {
    let mut out = String::with_capacity(records.len() * 12);
    for record in records {
        // Writing to a String can't fail
        let _ = writeln!(out, "{}", format_record(record, format));
    }
    out.into_bytes()
}
