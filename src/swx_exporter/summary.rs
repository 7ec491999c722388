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

//! Values derived from parsed feed records: the latest reading of each index,
//! its change from the previous reading, and trailing means of the sunspot number.

use crate::config::Settings;
use crate::solar::SolarIndexRecord;
use crate::sunspot::SunspotRecord;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::ops::Sub;

/// Most recent present value of a series and its difference from the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestChange<T> {
    pub latest: Option<T>,
    pub change: Option<T>,
}

/// Scan `values` (oldest first) from the end, skipping absent entries.
///
/// `change` is absent unless at least two present values exist.
pub fn latest_with_change<T, I>(values: I) -> LatestChange<T>
where
    T: Copy + Sub<Output = T>,
    I: IntoIterator<Item = Option<T>>,
    I::IntoIter: DoubleEndedIterator,
{
    let mut present = values.into_iter().rev().flatten();
    let latest = present.next();
    let previous = present.next();

    LatestChange {
        latest,
        change: latest.zip(previous).map(|(l, p)| l - p),
    }
}

/// A single three-hour Kp value. `slot` runs from 1 (00-03 UT) to 8 (21-24 UT).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpReading {
    pub date: NaiveDate,
    pub slot: u8,
    pub value: f64,
}

/// Last present Kp value when every day's Kp1..Kp8 are laid end to end in date order.
pub fn latest_kp(records: &[SolarIndexRecord]) -> Option<KpReading> {
    records.iter().rev().find_map(|r| {
        r.kp.iter().enumerate().rev().find_map(|(i, v)| {
            v.map(|value| KpReading {
                date: r.date,
                slot: i as u8 + 1,
                value,
            })
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingMean {
    pub date: NaiveDate,
    pub mean: Option<f64>,
}

/// Trailing mean of the sunspot number, one point per record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingSeries {
    pub window_days: u32,
    pub points: Vec<RollingMean>,
}

impl RollingSeries {
    /// Mean on the most recent date of the series, if that window had any values.
    pub fn latest(&self) -> Option<f64> {
        self.points.last().and_then(|p| p.mean)
    }

    /// Points dated within `half_width_days` either side of `focus`, inclusive. Bounds
    /// past the representable date range are clamped to it.
    pub fn around(&self, focus: NaiveDate, half_width_days: u32) -> RollingSeries {
        let width = Duration::days(i64::from(half_width_days));
        let lower = focus.checked_sub_signed(width).unwrap_or(NaiveDate::MIN);
        let upper = focus.checked_add_signed(width).unwrap_or(NaiveDate::MAX);

        RollingSeries {
            window_days: self.window_days,
            points: self
                .points
                .iter()
                .filter(|p| p.date >= lower && p.date <= upper)
                .copied()
                .collect(),
        }
    }
}

/// Mean sunspot number over the calendar-day window `(d - window_days, d]` for each
/// record date `d`. Absent counts are left out of the mean rather than treated as zero,
/// a window with no present counts has no mean.
///
/// `records` must be in ascending date order, as the SILSO feed is.
pub fn rolling_mean(records: &[SunspotRecord], window_days: u32) -> RollingSeries {
    debug_assert!(records.windows(2).all(|w| w[0].date <= w[1].date));

    let width = Duration::days(i64::from(window_days));
    let mut points = Vec::with_capacity(records.len());
    let mut start = 0;
    let mut sum = 0.0;
    let mut count = 0usize;

    for (end, rec) in records.iter().enumerate() {
        if let Some(v) = rec.sunspot_count {
            sum += v as f64;
            count += 1;
        }

        // No lower bound when the window reaches past the earliest representable date.
        if let Some(lower) = rec.date.checked_sub_signed(width) {
            while start <= end && records[start].date <= lower {
                if let Some(v) = records[start].sunspot_count {
                    sum -= v as f64;
                    count -= 1;
                }
                start += 1;
            }
        }

        points.push(RollingMean {
            date: rec.date,
            mean: if count > 0 { Some(sum / count as f64) } else { None },
        });
    }

    RollingSeries { window_days, points }
}

/// Everything computed from one fetch of both feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSummary {
    pub latest_ap: Option<i64>,
    pub ap_change: Option<i64>,
    pub latest_f107: Option<f64>,
    pub f107_change: Option<f64>,
    pub latest_kp: Option<KpReading>,
    pub latest_sunspot_count: Option<i64>,
    pub rolling_short: RollingSeries,
    pub rolling_long: RollingSeries,
}

pub fn summarize(solar: &[SolarIndexRecord], sunspots: &[SunspotRecord], settings: &Settings) -> DerivedSummary {
    let ap = latest_with_change(solar.iter().map(|r| r.ap));
    let f107 = latest_with_change(solar.iter().map(|r| r.f107));
    let sunspot_count = latest_with_change(solar.iter().map(|r| r.sunspot_count));

    DerivedSummary {
        latest_ap: ap.latest,
        ap_change: ap.change,
        latest_f107: f107.latest,
        f107_change: f107.change,
        latest_kp: latest_kp(solar),
        latest_sunspot_count: sunspot_count.latest,
        rolling_short: rolling_mean(sunspots, settings.short_window_days),
        rolling_long: rolling_mean(sunspots, settings.long_window_days),
    }
}
