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

//! Parser for the SILSO daily total sunspot number feed (`sndtotcsv.php`).
//!
//! Rows are semicolon separated with no header:
//!
//! ```text
//! year;month;day;fraction of year;sunspot number;std deviation;observations;definitive
//! 2024;05;10;2024.356; 165; 21.2;  37;0
//! ```

use crate::config::Settings;
use crate::parse::{parse_field, Feed, Parsed, ParseError, RecordError};
use chrono::{Datelike, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::str::FromStr;

/// Expected number of columns in a SILSO row.
pub const CSV_ROW_LENGTH: usize = 8;

/// One day of the international sunspot number series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SunspotRecord {
    pub date: NaiveDate,
    pub sunspot_count: Option<i64>,
    pub deviation: Option<f64>,
    pub observation_count: u32,
    /// `false` while the value is still provisional.
    pub definitive: bool,
}

impl SunspotRecord {
    pub fn from_record(record: &StringRecord, sentinel: i64) -> Result<Self, RecordError> {
        if record.len() != CSV_ROW_LENGTH {
            return Err(RecordError::ColumnCount {
                expected: CSV_ROW_LENGTH,
                found: record.len(),
            });
        }

        let year: i32 = required(&record[0], "year")?;
        let month: u32 = required(&record[1], "month")?;
        let day: u32 = required(&record[2], "day")?;
        let _: f64 = required(&record[3], "fraction of year")?;

        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| RecordError::InvalidDate(format!("{}-{}-{}", &record[0], &record[1], &record[2])))?;

        let definitive = match &record[7] {
            "1" => true,
            "0" => false,
            other => {
                return Err(RecordError::InvalidNumber {
                    field: "definitive",
                    value: other.to_owned(),
                })
            }
        };

        Ok(SunspotRecord {
            date,
            sunspot_count: parse_field(&record[4], "sunspot number", sentinel)?,
            deviation: parse_field(&record[5], "deviation", sentinel)?,
            observation_count: required(&record[6], "observations")?,
            definitive,
        })
    }
}

fn required<T: FromStr>(raw: &str, field: &'static str) -> Result<T, RecordError> {
    raw.parse::<T>().map_err(|_| RecordError::InvalidNumber {
        field,
        value: raw.to_owned(),
    })
}

/// Parse the raw body of the SILSO feed into records in feed order, dropping any
/// dated before `settings.min_sunspot_year`.
pub fn parse_sunspots(body: &str, settings: &Settings) -> Result<Parsed<SunspotRecord>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut parsed = Parsed::new();

    for res in reader.records() {
        let (line, res) = match res {
            Ok(record) => {
                if record.len() == 1 && record[0].is_empty() {
                    continue;
                }

                let line = record.position().map(|p| p.line()).unwrap_or(0);
                (line, SunspotRecord::from_record(&record, settings.sentinel_value))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                (line, Err(RecordError::Delimited(e.to_string())))
            }
        };

        if matches!(&res, Ok(r) if r.date.year() < settings.min_sunspot_year) {
            continue;
        }

        parsed.accept(Feed::Sunspot, settings.malformed_policy, line, res)?;
    }

    Ok(parsed)
}
