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

use crate::parse::MalformedPolicy;
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_SOLAR_URL: &str = "https://kp.gfz-potsdam.de/app/files/Kp_ap_Ap_SN_F107_nowcast.txt";
pub const DEFAULT_SUNSPOT_URL: &str = "https://www.sidc.be/SILSO/INFO/sndtotcsv.php";
pub const DEFAULT_HEADER_SKIP_LINES: usize = 40;
pub const DEFAULT_SHORT_WINDOW_DAYS: u32 = 27;
pub const DEFAULT_LONG_WINDOW_DAYS: u32 = 81;
pub const DEFAULT_SENTINEL_VALUE: i64 = -1;
pub const DEFAULT_MIN_SUNSPOT_YEAR: i32 = 1850;

/// Display label for the F10.7 column of the GFZ feed.
///
/// Dashboards have shown the flux at offset [139,147) as either the observed or the
/// adjusted value. The parser reads the same bytes either way, only the name attached
/// to the value in metrics and JSON output changes. Those bytes hold the observed flux
/// in the current file format, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
pub enum FluxLabel {
    #[default]
    #[serde(rename = "F10.7obs")]
    Observed,
    #[serde(rename = "F10.7adj")]
    Adjusted,
}

impl FluxLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observed => "F10.7obs",
            Self::Adjusted => "F10.7adj",
        }
    }
}

impl fmt::Display for FluxLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image shown alongside the indices. Passed through to clients untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageLink {
    pub name: String,
    pub caption: String,
    pub url: String,
}

/// Options for parsing the feeds and computing the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub header_skip_lines: usize,
    pub short_window_days: u32,
    pub long_window_days: u32,
    pub sentinel_value: i64,
    /// Sunspot records dated before January 1st of this year are dropped.
    pub min_sunspot_year: i32,
    pub malformed_policy: MalformedPolicy,
    pub flux_label: FluxLabel,
    pub images: Vec<ImageLink>,
    pub sources: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            header_skip_lines: DEFAULT_HEADER_SKIP_LINES,
            short_window_days: DEFAULT_SHORT_WINDOW_DAYS,
            long_window_days: DEFAULT_LONG_WINDOW_DAYS,
            sentinel_value: DEFAULT_SENTINEL_VALUE,
            min_sunspot_year: DEFAULT_MIN_SUNSPOT_YEAR,
            malformed_policy: MalformedPolicy::default(),
            flux_label: FluxLabel::default(),
            images: default_images(),
            sources: default_sources(),
        }
    }
}

fn default_images() -> Vec<ImageLink> {
    vec![
        ImageLink {
            name: "solar_disk".to_owned(),
            caption: "Latest SDO/HMI continuum image of the Sun".to_owned(),
            url: "https://sdo.gsfc.nasa.gov/assets/img/latest/latest_1024_HMIIC.jpg".to_owned(),
        },
        ImageLink {
            name: "global_tec".to_owned(),
            caption: "Near real-time global total electron content map".to_owned(),
            url: "https://impc.dlr.de/SWE/Total_Electron_Content/TEC_Near_Real-Time/DLR_GNSS_GCG_L4_VTEC-NTCM-SCM_NC_GLOBAL/v2.0.0/latest/DLR_GNSS_GCG_L4_VTEC-NTCM-SCM_NC_GLOBAL_latest_I.png".to_owned(),
        },
    ]
}

fn default_sources() -> Vec<String> {
    vec![
        "https://kp.gfz-potsdam.de/".to_owned(),
        "https://www.sidc.be/SILSO/datafiles".to_owned(),
        "https://sdo.gsfc.nasa.gov/data/".to_owned(),
        "https://impc.dlr.de/products/total-electron-content/near-real-time-tec/near-real-time-tec-maps-global".to_owned(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(40, settings.header_skip_lines);
        assert_eq!(27, settings.short_window_days);
        assert_eq!(81, settings.long_window_days);
        assert_eq!(-1, settings.sentinel_value);
        assert_eq!(MalformedPolicy::Skip, settings.malformed_policy);
        assert_eq!(FluxLabel::Observed, settings.flux_label);
    }

    #[test]
    fn test_flux_label_names() {
        assert_eq!("F10.7obs", FluxLabel::Observed.to_string());
        assert_eq!("F10.7adj", FluxLabel::Adjusted.to_string());
    }

    #[test]
    fn test_flux_label_from_flag() {
        assert_eq!(Ok(FluxLabel::Observed), FluxLabel::from_str("observed", true));
        assert_eq!(Ok(FluxLabel::Adjusted), FluxLabel::from_str("Adjusted", true));
        assert!(FluxLabel::from_str("corrected", true).is_err());
    }
}
