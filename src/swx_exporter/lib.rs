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

//! Space weather index exporter for GFZ and SILSO data feeds
//!
//! ## Features
//!
//! `swx_exporter` periodically downloads the [GFZ Potsdam] Kp/ap/Ap/SN/F10.7 nowcast file and the
//! [SILSO] daily total sunspot number series, derives a handful of summary values from them, and
//! serves those as Prometheus metrics and JSON. The following metrics are emitted when available
//! (the nowcast file leaves the most recent values blank until they have been computed). A metric
//! without a value emits no sample rather than zero.
//!
//! * `swx_ap_index{feed=solar}` - Planetary Ap index of the most recent day.
//! * `swx_ap_index_change{feed=solar}` - Change in Ap from the previous day with a value.
//! * `swx_f107_sfu{label=$LABEL}` - Solar radio flux at 10.7 cm, in solar flux units.
//! * `swx_f107_sfu_change{label=$LABEL}` - Change in F10.7 from the previous day with a value.
//! * `swx_kp_index{feed=solar}` - Most recent three-hour Kp index.
//! * `swx_sunspot_number{feed=solar}` - Most recent daily sunspot number from the GFZ file.
//! * `swx_sunspot_rolling_mean{window_days=$DAYS}` - Trailing mean of the SILSO sunspot number.
//! * `swx_skipped_lines{feed=$FEED}` - Malformed lines skipped while parsing a feed.
//!
//! [GFZ Potsdam]: https://kp.gfz-potsdam.de/
//! [SILSO]: https://www.sidc.be/SILSO/datafiles
//!
//! ## JSON
//!
//! Dashboards that want to draw charts rather than scrape metrics can use two JSON endpoints.
//!
//! * `/api/summary` - Latest values and changes, the Kp reading with the three-hour slot it belongs
//!   to, the last week of daily records, and image and data source links.
//! * `/api/sunspots?date=YYYY-MM-DD` - The short trailing mean restricted to about one solar cycle
//!   either side of `date` (today if omitted) and the full long trailing mean.
//!
//! Both return `503` until the first fetch of the feeds has succeeded.
//!
//! ## Build
//!
//! ```text
//! cargo build --release
//! ```
//!
//! ## Usage
//!
//! ```text
//! ./swx_exporter --refresh-secs 900
//! ```
//!
//! Metrics are exposed on port `9784` at `/metrics`. Malformed lines in either feed are skipped and
//! counted by default, pass `--strict` to reject a fetch that contains any.
//!

pub mod client;
pub mod config;
pub mod http;
pub mod metrics;
pub mod parse;
pub mod snapshot;
pub mod solar;
pub mod summary;
pub mod sunspot;
