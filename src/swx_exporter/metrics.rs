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

use crate::parse::Feed;
use crate::snapshot::Snapshot;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;

type FloatGauge = Gauge<f64, AtomicU64>;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct FluxLabels {
    label: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct WindowLabels {
    window_days: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct FeedLabels {
    feed: String,
}

/// Holder for metrics that can be set from a `Snapshot`.
///
/// All metrics are created and registered upon call to `IndexMetrics::new()`. Metrics
/// all share the prefix of the registry they are registered with (`swx_` for the
/// registry built by the exporter binary).
#[derive(Debug)]
pub struct IndexMetrics {
    ap: Family<FeedLabels, FloatGauge>,
    ap_change: Family<FeedLabels, FloatGauge>,
    f107: Family<FluxLabels, FloatGauge>,
    f107_change: Family<FluxLabels, FloatGauge>,
    kp: Family<FeedLabels, FloatGauge>,
    sunspots: Family<FeedLabels, FloatGauge>,
    sunspots_rolling: Family<WindowLabels, FloatGauge>,
    skipped: Family<FeedLabels, Gauge>,
}

impl IndexMetrics {
    /// Create a new `IndexMetrics` and register each metric with the provided `Registry`.
    pub fn new(reg: &mut Registry) -> Self {
        let ap = Family::<FeedLabels, FloatGauge>::default();
        let ap_change = Family::<FeedLabels, FloatGauge>::default();
        let f107 = Family::<FluxLabels, FloatGauge>::default();
        let f107_change = Family::<FluxLabels, FloatGauge>::default();
        let kp = Family::<FeedLabels, FloatGauge>::default();
        let sunspots = Family::<FeedLabels, FloatGauge>::default();
        let sunspots_rolling = Family::<WindowLabels, FloatGauge>::default();
        let skipped = Family::<FeedLabels, Gauge>::default();

        reg.register("ap_index", "Planetary Ap index of the most recent day", ap.clone());
        reg.register("ap_index_change", "Change in Ap index from the previous day", ap_change.clone());
        reg.register("f107_sfu", "Solar radio flux at 10.7 cm in solar flux units", f107.clone());
        reg.register("f107_sfu_change", "Change in F10.7 from the previous day", f107_change.clone());
        reg.register("kp_index", "Most recent three-hour planetary Kp index", kp.clone());
        reg.register("sunspot_number", "Most recent daily sunspot number", sunspots.clone());
        reg.register(
            "sunspot_rolling_mean",
            "Trailing mean of the daily sunspot number",
            sunspots_rolling.clone(),
        );
        reg.register("skipped_lines", "Malformed lines skipped in the last parse of a feed", skipped.clone());

        Self {
            ap,
            ap_change,
            f107,
            f107_change,
            kp,
            sunspots,
            sunspots_rolling,
            skipped,
        }
    }

    /// Set metrics from the provided snapshot if the relevant value exists.
    ///
    /// If the snapshot doesn't contain a value for a particular metric, the metric will
    /// not be updated. A metric that has never had a value emits no sample at all.
    pub fn update(&self, snapshot: &Snapshot) {
        let summary = &snapshot.summary;
        let solar = FeedLabels {
            feed: Feed::Solar.to_string(),
        };
        let flux = FluxLabels {
            label: snapshot.flux_label.to_string(),
        };

        set_if_present(&self.ap, &solar, summary.latest_ap.map(|v| v as f64));
        set_if_present(&self.ap_change, &solar, summary.ap_change.map(|v| v as f64));
        set_if_present(&self.f107, &flux, summary.latest_f107);
        set_if_present(&self.f107_change, &flux, summary.f107_change);
        set_if_present(&self.kp, &solar, summary.latest_kp.map(|k| k.value));
        set_if_present(&self.sunspots, &solar, summary.latest_sunspot_count.map(|v| v as f64));

        for series in [&summary.rolling_short, &summary.rolling_long] {
            let labels = WindowLabels {
                window_days: series.window_days.to_string(),
            };
            set_if_present(&self.sunspots_rolling, &labels, series.latest());
        }

        for (feed, count) in [(Feed::Solar, snapshot.skipped_solar), (Feed::Sunspot, snapshot.skipped_sunspot)] {
            let labels = FeedLabels {
                feed: feed.to_string(),
            };
            self.skipped.get_or_create(&labels).set(count as i64);
        }
    }
}

fn set_if_present<L>(family: &Family<L, FloatGauge>, labels: &L, value: Option<f64>)
where
    L: Clone + std::hash::Hash + Eq,
{
    if let Some(v) = value {
        family.get_or_create(labels).set(v);
    }
}
