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

//! Parser for the GFZ Potsdam `Kp_ap_Ap_SN_F107_nowcast.txt` feed.
//!
//! Each data line is fixed-width. Columns used here, as byte offsets:
//!
//! ```text
//! [0,10)    date "YYYY MM DD"
//! [33,39)   Kp1 ... [82,88) Kp8, seven bytes apart
//! [130,134) Ap
//! [135,138) SN
//! [139,147) F10.7
//! ```
//!
//! Missing values are written as `-1` (or `-1.000`, `-1.0`) by the upstream feed.

use crate::config::Settings;
use crate::parse::{parse_field, Feed, Parsed, ParseError, RecordError};
use chrono::NaiveDate;
use serde::Serialize;

const DATE_FORMAT: &str = "%Y %m %d";
const KP_FIELDS: [&str; 8] = ["Kp1", "Kp2", "Kp3", "Kp4", "Kp5", "Kp6", "Kp7", "Kp8"];

/// Half-open byte range `[start, end)` of a field within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub start: usize,
    pub end: usize,
}

impl Column {
    pub const fn new(start: usize, width: usize) -> Self {
        Column {
            start,
            end: start + width,
        }
    }

    fn slice<'a>(&self, line: &'a str, field: &'static str) -> Result<&'a str, RecordError> {
        line.get(self.start..self.end).ok_or_else(|| RecordError::Encoding {
            field,
            offset: if line.is_char_boundary(self.start) { self.end } else { self.start },
        })
    }
}

/// Offset table for the fixed-width feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolarLayout {
    pub date: Column,
    pub kp: [Column; 8],
    pub ap: Column,
    pub sunspots: Column,
    pub flux: Column,
}

/// Layout of the current GFZ nowcast file.
///
/// The flux column is the observed F10.7 value. Older dashboards labelled the same
/// bytes as the adjusted flux, see [`crate::config::FluxLabel`].
pub const GFZ_NOWCAST: SolarLayout = SolarLayout {
    date: Column::new(0, 10),
    kp: [
        Column::new(33, 6),
        Column::new(40, 6),
        Column::new(47, 6),
        Column::new(54, 6),
        Column::new(61, 6),
        Column::new(68, 6),
        Column::new(75, 6),
        Column::new(82, 6),
    ],
    ap: Column::new(130, 4),
    sunspots: Column::new(135, 3),
    flux: Column::new(139, 8),
};

impl SolarLayout {
    /// Shortest line that contains every field of this layout.
    pub fn min_line_len(&self) -> usize {
        self.kp
            .iter()
            .chain([&self.date, &self.ap, &self.sunspots, &self.flux])
            .map(|c| c.end)
            .max()
            .unwrap_or(0)
    }
}

/// One day of geomagnetic and solar indices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolarIndexRecord {
    pub date: NaiveDate,
    pub ap: Option<i64>,
    pub f107: Option<f64>,
    pub sunspot_count: Option<i64>,
    /// Three-hour Kp values, index 0 covering 00-03 UT.
    pub kp: [Option<f64>; 8],
}

impl SolarIndexRecord {
    pub fn from_line(line: &str, layout: &SolarLayout, sentinel: i64) -> Result<Self, RecordError> {
        let need = layout.min_line_len();
        if line.len() < need {
            return Err(RecordError::Truncated { len: line.len(), need });
        }

        let raw_date = layout.date.slice(line, "date")?;
        let date =
            NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| RecordError::InvalidDate(raw_date.to_owned()))?;

        let mut kp: [Option<f64>; 8] = [None; 8];
        for (i, (col, name)) in layout.kp.iter().zip(KP_FIELDS).enumerate() {
            kp[i] = parse_field(col.slice(line, name)?, name, sentinel)?;
        }

        Ok(SolarIndexRecord {
            date,
            ap: parse_field(layout.ap.slice(line, "Ap")?, "Ap", sentinel)?,
            f107: parse_field(layout.flux.slice(line, "F10.7")?, "F10.7", sentinel)?,
            sunspot_count: parse_field(layout.sunspots.slice(line, "SN")?, "SN", sentinel)?,
            kp,
        })
    }
}

/// Parse the raw body of the GFZ nowcast feed into records in feed order.
///
/// The first `settings.header_skip_lines` lines are discarded without being looked
/// at. Blank lines after that are ignored, anything else that doesn't parse is
/// handled per `settings.malformed_policy`.
pub fn parse_solar_indices(body: &str, settings: &Settings) -> Result<Parsed<SolarIndexRecord>, ParseError> {
    parse_with_layout(body, &GFZ_NOWCAST, settings)
}

pub fn parse_with_layout(
    body: &str,
    layout: &SolarLayout,
    settings: &Settings,
) -> Result<Parsed<SolarIndexRecord>, ParseError> {
    let mut parsed = Parsed::new();

    for (idx, line) in body.lines().enumerate().skip(settings.header_skip_lines) {
        if line.trim().is_empty() {
            continue;
        }

        let res = SolarIndexRecord::from_line(line, layout, settings.sentinel_value);
        parsed.accept(Feed::Solar, settings.malformed_policy, idx as u64 + 1, res)?;
    }

    Ok(parsed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parse::MalformedPolicy;

    pub(crate) const LINE_FULL: &str = "2024 05 10 33733 33733.5 2600  1  2.667  3.000  4.333  5.000  6.000  8.667  9.000  8.333   12   15   32   48   80  300  400  300   148 152    228.6    226.8 1";
    pub(crate) const LINE_PARTIAL: &str = "2024 05 11 33734 33734.5 2600  1  7.333  6.667  5.000  4.667 -1.000 -1.000 -1.000 -1.000  100   80   48   39   -1   -1   -1   -1    -1  -1     -1.0     -1.0 0";

    /// Build a feed body with the standard 40 comment lines in front of `lines`.
    pub(crate) fn feed(lines: &[&str]) -> String {
        let mut body = String::new();
        for i in 0..40 {
            body.push_str(&format!("# header line {}\n", i + 1));
        }
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
        body
    }

    /// Write the fields of `record` back at the offsets they were read from.
    fn render(record: &SolarIndexRecord, layout: &SolarLayout) -> String {
        let mut line = " ".repeat(layout.min_line_len());
        let mut put = |col: Column, value: String| {
            line.replace_range(col.start..col.end, &format!("{:>width$}", value, width = col.end - col.start));
        };

        put(layout.date, record.date.format(DATE_FORMAT).to_string());
        for (col, v) in layout.kp.iter().zip(record.kp) {
            put(*col, format!("{:.3}", v.unwrap_or(-1.0)));
        }
        put(layout.ap, record.ap.unwrap_or(-1).to_string());
        put(layout.sunspots, record.sunspot_count.unwrap_or(-1).to_string());
        put(layout.flux, format!("{:.1}", record.f107.unwrap_or(-1.0)));
        line
    }

    #[test]
    fn test_min_line_len() {
        assert_eq!(147, GFZ_NOWCAST.min_line_len());
    }

    #[test]
    fn test_from_line_all_present() {
        let rec = SolarIndexRecord::from_line(LINE_FULL, &GFZ_NOWCAST, -1).unwrap();

        assert_eq!(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), rec.date);
        assert_eq!(Some(148), rec.ap);
        assert_eq!(Some(152), rec.sunspot_count);
        assert_eq!(Some(228.6), rec.f107);
        assert_eq!(
            [
                Some(2.667),
                Some(3.0),
                Some(4.333),
                Some(5.0),
                Some(6.0),
                Some(8.667),
                Some(9.0),
                Some(8.333)
            ],
            rec.kp
        );
    }

    #[test]
    fn test_from_line_sentinels_are_absent() {
        let rec = SolarIndexRecord::from_line(LINE_PARTIAL, &GFZ_NOWCAST, -1).unwrap();

        assert_eq!(None, rec.ap);
        assert_eq!(None, rec.sunspot_count);
        assert_eq!(None, rec.f107);
        assert_eq!([Some(7.333), Some(6.667), Some(5.0), Some(4.667)], rec.kp[..4]);
        assert!(rec.kp[4..].iter().all(Option::is_none));
    }

    #[test]
    fn test_from_line_truncated() {
        let res = SolarIndexRecord::from_line(&LINE_FULL[..100], &GFZ_NOWCAST, -1);
        assert_eq!(Err(RecordError::Truncated { len: 100, need: 147 }), res);
    }

    #[test]
    fn test_from_line_bad_number() {
        let mut line = LINE_FULL.to_owned();
        line.replace_range(130..134, "  x8");
        let res = SolarIndexRecord::from_line(&line, &GFZ_NOWCAST, -1);

        assert_eq!(
            Err(RecordError::InvalidNumber {
                field: "Ap",
                value: "x8".to_owned()
            }),
            res
        );
    }

    #[test]
    fn test_from_line_split_character() {
        let mut line = LINE_FULL.to_owned();
        line.replace_range(129..131, "é");
        let res = SolarIndexRecord::from_line(&line, &GFZ_NOWCAST, -1);

        assert_eq!(Err(RecordError::Encoding { field: "Ap", offset: 130 }), res);
    }

    #[test]
    fn test_from_line_bad_date() {
        let mut line = LINE_FULL.to_owned();
        line.replace_range(5..7, "13");
        let res = SolarIndexRecord::from_line(&line, &GFZ_NOWCAST, -1);

        assert_eq!(Err(RecordError::InvalidDate("2024 13 10".to_owned())), res);
    }

    #[test]
    fn test_render_reproduces_field_bytes() {
        for line in [LINE_FULL, LINE_PARTIAL] {
            let rec = SolarIndexRecord::from_line(line, &GFZ_NOWCAST, -1).unwrap();
            let rendered = render(&rec, &GFZ_NOWCAST);

            let layout = &GFZ_NOWCAST;
            for col in layout.kp.iter().chain([&layout.date, &layout.ap, &layout.sunspots, &layout.flux]) {
                assert_eq!(
                    line[col.start..col.end].trim(),
                    rendered[col.start..col.end].trim(),
                    "field at {:?}",
                    col
                );
            }
        }
    }

    #[test]
    fn test_parse_skips_header() {
        let body = feed(&[LINE_FULL, LINE_PARTIAL]);
        let parsed = parse_solar_indices(&body, &Settings::default()).unwrap();

        assert_eq!(2, parsed.records.len());
        assert!(parsed.skipped.is_empty());
        assert_eq!(NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(), parsed.records[1].date);
    }

    #[test]
    fn test_parse_custom_header_skip() {
        let body = format!("# only one header line\n{}\n", LINE_FULL);
        let settings = Settings {
            header_skip_lines: 1,
            ..Settings::default()
        };
        let parsed = parse_solar_indices(&body, &settings).unwrap();

        assert_eq!(1, parsed.records.len());
    }

    #[test]
    fn test_parse_skip_policy_counts_malformed() {
        let mut bad = LINE_FULL.to_owned();
        bad.replace_range(33..39, " x.xxx");
        let lines = [LINE_FULL, bad.as_str(), "", "end of file", LINE_PARTIAL];
        let body = feed(&lines);
        let parsed = parse_solar_indices(&body, &Settings::default()).unwrap();

        let data_lines = lines.iter().filter(|l| !l.is_empty()).count();
        assert_eq!(2, parsed.skipped.len());
        assert_eq!(data_lines - parsed.skipped.len(), parsed.records.len());
        assert_eq!(42, parsed.skipped[0].line);
        assert_eq!(44, parsed.skipped[1].line);
    }

    #[test]
    fn test_parse_fail_policy() {
        let body = feed(&[LINE_FULL, "garbage"]);
        let settings = Settings {
            malformed_policy: MalformedPolicy::Fail,
            ..Settings::default()
        };

        match parse_solar_indices(&body, &settings) {
            Err(ParseError::Malformed { feed, line, source }) => {
                assert_eq!(Feed::Solar, feed);
                assert_eq!(42, line);
                assert_eq!(RecordError::Truncated { len: 7, need: 147 }, source);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
