//! Partition transform specifications.
//!
//! Engines that lay data out by derived values (day buckets, hash buckets,
//! truncated prefixes) report an ordered transform spec instead of simple
//! equality partitioning. Absence of a spec means no transform.

use std::fmt;

use crate::error::{Error, Result};

/// A derivation rule mapping logical column values to physical partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionTransform {
    /// Partition on the raw column value.
    Identity,
    /// Partition on the year of a temporal column.
    Year,
    /// Partition on the month of a temporal column.
    Month,
    /// Partition on the day of a temporal column.
    Day,
    /// Partition on the hour of a temporal column.
    Hour,
    /// Partition on a hash bucket of the column value.
    Bucket(u32),
    /// Partition on a truncated prefix of the column value.
    Truncate(u32),
}

impl PartitionTransform {
    /// Parses a transform using case-insensitive matching.
    ///
    /// Accepted values: `identity`, `year`, `month`, `day`, `hour`,
    /// `bucket[N]`, `truncate[N]` (any casing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `raw` is unknown or a
    /// parameterized transform carries a malformed width.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "identity" => return Ok(Self::Identity),
            "year" => return Ok(Self::Year),
            "month" => return Ok(Self::Month),
            "day" => return Ok(Self::Day),
            "hour" => return Ok(Self::Hour),
            _ => {}
        }

        for (name, ctor) in [
            ("bucket", Self::Bucket as fn(u32) -> Self),
            ("truncate", Self::Truncate as fn(u32) -> Self),
        ] {
            if let Some(rest) = normalized.strip_prefix(name) {
                let width = rest
                    .strip_prefix('[')
                    .and_then(|r| r.strip_suffix(']'))
                    .and_then(|r| r.parse::<u32>().ok())
                    .filter(|w| *w > 0)
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "malformed partition transform '{raw}'; expected {name}[N] with N > 0"
                        ))
                    })?;
                return Ok(ctor(width));
            }
        }

        Err(Error::configuration(format!(
            "unknown partition transform '{raw}'; expected one of: \
             identity, year, month, day, hour, bucket[N], truncate[N]"
        )))
    }
}

impl fmt::Display for PartitionTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Year => f.write_str("year"),
            Self::Month => f.write_str("month"),
            Self::Day => f.write_str("day"),
            Self::Hour => f.write_str("hour"),
            Self::Bucket(n) => write!(f, "bucket[{n}]"),
            Self::Truncate(n) => write!(f, "truncate[{n}]"),
        }
    }
}

/// One (source column, transform) pair in an ordered transform spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTransformSpec {
    /// Logical column the partition value derives from.
    pub source_column: String,
    /// The derivation applied to the column value.
    pub transform: PartitionTransform,
}

impl PartitionTransformSpec {
    /// Creates a transform spec entry.
    #[must_use]
    pub fn new(source_column: impl Into<String>, transform: PartitionTransform) -> Self {
        Self {
            source_column: source_column.into(),
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_transforms() {
        assert_eq!(
            PartitionTransform::parse("Identity").expect("parse"),
            PartitionTransform::Identity
        );
        assert_eq!(
            PartitionTransform::parse(" day ").expect("parse"),
            PartitionTransform::Day
        );
    }

    #[test]
    fn test_parse_parameterized_transforms() {
        assert_eq!(
            PartitionTransform::parse("bucket[16]").expect("parse"),
            PartitionTransform::Bucket(16)
        );
        assert_eq!(
            PartitionTransform::parse("TRUNCATE[4]").expect("parse"),
            PartitionTransform::Truncate(4)
        );
    }

    #[test]
    fn test_parse_rejects_zero_width_bucket() {
        assert!(PartitionTransform::parse("bucket[0]").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = PartitionTransform::parse("void").expect_err("must fail");
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_display_round_trips() {
        for raw in ["identity", "year", "bucket[8]", "truncate[2]"] {
            let parsed = PartitionTransform::parse(raw).expect("parse");
            assert_eq!(parsed.to_string(), raw);
        }
    }
}
