use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::cache::Operation;
use crate::error::TraceError;

lazy_static! {
    static ref HEX_SUFFIX: Regex =
        Regex::new(r"^\s*(?:0[xX])?(?P<address>[0-9a-fA-F]{1,16})\s+(?P<operation>[RrWw])\s*$").unwrap();
    static ref DECIMAL_PREFIX: Regex =
        Regex::new(r"^\s*(?P<operation>[01])\s+(?P<address>[0-9]{1,20})\s*$").unwrap();
}

/// The grammar of a trace file. A run uses exactly one, they are never mixed
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum TraceFormat {
    /// `<hex address> <R|W>`, e.g. `1f40 W`. A `0x` prefix is accepted
    #[default]
    #[value(name = "hex")]
    HexSuffix,
    /// `<0|1> <decimal address>`, 0 is a read and 1 is a write, e.g. `1 8000`
    #[value(name = "decimal")]
    DecimalPrefix,
}

/// A single validated trace entry
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub address: u64,
    pub operation: Operation,
}

/// Parses one line of a trace
///
/// Returns None for lines which carry no record, blank lines and `#` comments
///
/// # Arguments
///
/// * `line`: The text of the line, without the line terminator
/// * `line_number`: 1-based, used for error reporting
/// * `format`: The grammar in use
///
/// returns: Result<Option<TraceRecord>, TraceError>
///
/// # Examples
///
/// ```
/// use cachelib::cache::Operation;
/// use cachelib::trace::{parse_record, TraceFormat, TraceRecord};
/// let record = parse_record("0x1F W", 1, TraceFormat::HexSuffix).unwrap();
/// assert_eq!(record, Some(TraceRecord { address: 31, operation: Operation::Write }));
/// let record = parse_record("0 48", 2, TraceFormat::DecimalPrefix).unwrap();
/// assert_eq!(record, Some(TraceRecord { address: 48, operation: Operation::Read }));
/// ```
pub fn parse_record(line: &str, line_number: usize, format: TraceFormat) -> Result<Option<TraceRecord>, TraceError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let malformed = || TraceError::MalformedRecord {
        line: line_number,
        content: trimmed.to_string(),
    };
    let (pattern, radix) = match format {
        TraceFormat::HexSuffix => (&*HEX_SUFFIX, 16),
        TraceFormat::DecimalPrefix => (&*DECIMAL_PREFIX, 10),
    };
    let captures = pattern.captures(trimmed).ok_or_else(malformed)?;
    // The digit count is bounded by the pattern but a decimal value can still overflow
    let address = u64::from_str_radix(&captures["address"], radix).map_err(|_| malformed())?;
    let operation = match &captures["operation"] {
        "R" | "r" | "0" => Operation::Read,
        _ => Operation::Write,
    };
    Ok(Some(TraceRecord { address, operation }))
}

/// Iterates the records of an in-memory trace in file order
///
/// Lines which are not valid UTF-8 are reported as malformed rather than ending the iteration
pub struct TraceReader<'a> {
    lines: std::iter::Enumerate<std::slice::Split<'a, u8, fn(&u8) -> bool>>,
    format: TraceFormat,
}

impl<'a> TraceReader<'a> {
    pub fn new(bytes: &'a [u8], format: TraceFormat) -> Self {
        let is_newline: fn(&u8) -> bool = |b| *b == b'\n';
        Self {
            lines: bytes.split(is_newline).enumerate(),
            format,
        }
    }
}

impl<'a> Iterator for TraceReader<'a> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let line_number = index + 1;
            let record = match std::str::from_utf8(raw) {
                Ok(line) => parse_record(line, line_number, self.format),
                Err(_) => Err(TraceError::MalformedRecord {
                    line: line_number,
                    content: String::from_utf8_lossy(raw).trim().to_string(),
                }),
            };
            match record {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
