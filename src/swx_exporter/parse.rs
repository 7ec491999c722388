// swx_exporter - Space weather index exporter for GFZ and SILSO data feeds
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Pieces shared by the fixed-width and delimited feed parsers: converting
//! sentinel values to absent ones, deciding what to do with malformed lines,
//! and the errors produced along the way.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upstream feed a record was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Solar,
    Sunspot,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::Sunspot => "sunspot",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a parser does when it encounters a line it cannot turn into a record.
///
/// Both parsers apply the policy the same way: `Skip` drops the line and records
/// it in [`Parsed::skipped`], `Fail` stops at the first bad line and returns a
/// [`ParseError`]. Blank lines are never considered malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    #[default]
    Skip,
    Fail,
}

/// Reason a single line could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("line is {len} bytes, at least {need} required")]
    Truncated { len: usize, need: usize },

    #[error("{field} column at byte {offset} splits a multi-byte character")]
    Encoding { field: &'static str, offset: usize },

    #[error("invalid {field} value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid date {0:?}")]
    InvalidDate(String),

    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("unreadable row: {0}")]
    Delimited(String),
}

/// Failure of an entire parse, only produced under [`MalformedPolicy::Fail`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed {feed} record on line {line}: {source}")]
    Malformed {
        feed: Feed,
        line: u64,
        #[source]
        source: RecordError,
    },
}

/// A line dropped by [`MalformedPolicy::Skip`]. Line numbers start at 1 and count
/// from the top of the raw body, header lines included.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line: u64,
    pub reason: RecordError,
}

/// Output of a parser: the records in feed order and any lines that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Parsed<T> {
    pub(crate) fn new() -> Self {
        Parsed {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Keep the record or handle the error according to `policy`.
    pub(crate) fn accept(
        &mut self,
        feed: Feed,
        policy: MalformedPolicy,
        line: u64,
        res: Result<T, RecordError>,
    ) -> Result<(), ParseError> {
        match (res, policy) {
            (Ok(record), _) => self.records.push(record),
            (Err(reason), MalformedPolicy::Skip) => self.skipped.push(SkippedLine { line, reason }),
            (Err(source), MalformedPolicy::Fail) => return Err(ParseError::Malformed { feed, line, source }),
        }

        Ok(())
    }
}

/// Numeric field types that the feeds encode with a sentinel for missing values.
pub trait Measure: Copy + FromStr {
    fn is_sentinel(self, sentinel: i64) -> bool;

    fn is_finite(self) -> bool;
}

impl Measure for i64 {
    fn is_sentinel(self, sentinel: i64) -> bool {
        self == sentinel
    }

    fn is_finite(self) -> bool {
        true
    }
}

impl Measure for f64 {
    fn is_sentinel(self, sentinel: i64) -> bool {
        self == sentinel as f64
    }

    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

/// Return `None` if `value` is the sentinel marking a missing observation.
pub fn absent_if_sentinel<T: Measure>(value: T, sentinel: i64) -> Option<T> {
    if value.is_sentinel(sentinel) {
        None
    } else {
        Some(value)
    }
}

/// Trim and parse a single numeric field, mapping the sentinel to `None`.
pub fn parse_field<T: Measure>(raw: &str, field: &'static str, sentinel: i64) -> Result<Option<T>, RecordError> {
    let trimmed = raw.trim();
    match trimmed.parse::<T>() {
        Ok(v) if v.is_finite() => Ok(absent_if_sentinel(v, sentinel)),
        _ => Err(RecordError::InvalidNumber {
            field,
            value: trimmed.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_integer_is_absent() {
        assert_eq!(None, absent_if_sentinel(-1i64, -1));
        assert_eq!(Some(0), absent_if_sentinel(0i64, -1));
        assert_eq!(Some(-2), absent_if_sentinel(-2i64, -1));
    }

    #[test]
    fn test_sentinel_decimal_is_absent() {
        assert_eq!(Ok(None), parse_field::<f64>(" -1.000", "kp", -1));
        assert_eq!(Ok(None), parse_field::<f64>("  -1.0", "f107", -1));
        assert_eq!(Ok(Some(-1.5)), parse_field::<f64>("-1.5", "kp", -1));
    }

    #[test]
    fn test_parse_field_trims() {
        assert_eq!(Ok(Some(12)), parse_field::<i64>("  12 ", "ap", -1));
    }

    #[test]
    fn test_parse_field_rejects_garbage() {
        assert_eq!(
            Err(RecordError::InvalidNumber {
                field: "ap",
                value: "x1".to_owned()
            }),
            parse_field::<i64>(" x1", "ap", -1)
        );
        assert!(parse_field::<i64>("    ", "ap", -1).is_err());
        assert!(parse_field::<f64>("NaN", "f107", -1).is_err());
    }

    #[test]
    fn test_accept_skip_policy() {
        let mut parsed: Parsed<i64> = Parsed::new();
        parsed.accept(Feed::Solar, MalformedPolicy::Skip, 1, Ok(3)).unwrap();
        parsed
            .accept(
                Feed::Solar,
                MalformedPolicy::Skip,
                2,
                Err(RecordError::InvalidDate("nope".to_owned())),
            )
            .unwrap();

        assert_eq!(vec![3], parsed.records);
        assert_eq!(1, parsed.skipped.len());
        assert_eq!(2, parsed.skipped[0].line);
    }

    #[test]
    fn test_accept_fail_policy() {
        let mut parsed: Parsed<i64> = Parsed::new();
        let res = parsed.accept(
            Feed::Sunspot,
            MalformedPolicy::Fail,
            7,
            Err(RecordError::InvalidDate("nope".to_owned())),
        );

        match res {
            Err(ParseError::Malformed { feed, line, .. }) => {
                assert_eq!(Feed::Sunspot, feed);
                assert_eq!(7, line);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
