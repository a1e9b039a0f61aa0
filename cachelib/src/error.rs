use thiserror::Error;

/// Errors raised while building a cache from a configuration
///
/// These are fatal, a cache is never constructed from a configuration which fails validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid cache configuration: `{field}` is zero, or the cache has too many lines")]
    InvalidConfiguration { field: &'static str },
    #[error("unknown write policy code `{0}`, expected 0 (write-through) or 1 (write-back)")]
    UnknownWritePolicy(u8),
    #[error("unknown replacement policy code `{0}`, expected 0 (lfu), 1 (lru) or 2 (random)")]
    UnknownReplacementPolicy(u8),
}

/// Errors raised while reading a trace
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TraceError {
    #[error("malformed trace record on line {line}: `{content}`")]
    MalformedRecord { line: usize, content: String },
}
