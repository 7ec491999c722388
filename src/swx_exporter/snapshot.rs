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

//! One complete fetch, parse, compute cycle and the cache of its result.

use crate::client::FeedBodies;
use crate::config::{FluxLabel, Settings};
use crate::parse::{Feed, Parsed, ParseError};
use crate::solar::{parse_solar_indices, SolarIndexRecord};
use crate::summary::{summarize, DerivedSummary};
use crate::sunspot::{parse_sunspots, SunspotRecord};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

/// Parsed records of both feeds and everything derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub solar: Vec<SolarIndexRecord>,
    pub sunspots: Vec<SunspotRecord>,
    pub summary: DerivedSummary,
    pub skipped_solar: usize,
    pub skipped_sunspot: usize,
    pub flux_label: FluxLabel,
    /// Hash of the raw bodies this snapshot was built from.
    pub key: u64,
}

impl Snapshot {
    pub fn build(bodies: &FeedBodies, settings: &Settings) -> Result<Self, ParseError> {
        let solar = parse_solar_indices(&bodies.solar, settings)?;
        let sunspots = parse_sunspots(&bodies.sunspot, settings)?;
        log_skipped(Feed::Solar, &solar);
        log_skipped(Feed::Sunspot, &sunspots);

        let summary = summarize(&solar.records, &sunspots.records, settings);

        Ok(Snapshot {
            skipped_solar: solar.skipped.len(),
            skipped_sunspot: sunspots.skipped.len(),
            solar: solar.records,
            sunspots: sunspots.records,
            summary,
            flux_label: settings.flux_label,
            key: content_key(bodies),
        })
    }
}

fn log_skipped<T>(feed: Feed, parsed: &Parsed<T>) {
    for skipped in &parsed.skipped {
        tracing::debug!(message = "skipped malformed line", feed = %feed, line = skipped.line, reason = %skipped.reason);
    }

    if !parsed.skipped.is_empty() {
        tracing::warn!(
            message = "skipped malformed lines in feed",
            feed = %feed,
            skipped = parsed.skipped.len(),
            records = parsed.records.len(),
        );
    }
}

pub fn content_key(bodies: &FeedBodies) -> u64 {
    let mut hasher = DefaultHasher::new();
    bodies.solar.hash(&mut hasher);
    bodies.sunspot.hash(&mut hasher);
    hasher.finish()
}

/// Result of offering new feed bodies to a [`SnapshotStore`].
#[derive(Debug, Clone)]
pub enum Update {
    Unchanged,
    Replaced(Arc<Snapshot>),
}

/// Holds the most recent snapshot, shared between the poller and HTTP handlers.
///
/// A new snapshot is only built when the raw feed content differs from the one the
/// current snapshot came from.
#[derive(Debug)]
pub struct SnapshotStore {
    settings: Settings,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new(settings: Settings) -> Self {
        SnapshotStore {
            settings,
            current: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Rebuild the snapshot from `bodies` unless their content is already cached.
    ///
    /// On a parse error the previous snapshot stays in place.
    pub fn update(&self, bodies: &FeedBodies) -> Result<Update, ParseError> {
        let key = content_key(bodies);
        if self.current().map(|s| s.key) == Some(key) {
            tracing::debug!(message = "feed content unchanged, keeping snapshot", key = key);
            return Ok(Update::Unchanged);
        }

        let snapshot = Arc::new(Snapshot::build(bodies, &self.settings)?);
        let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
        *current = Some(snapshot.clone());
        Ok(Update::Replaced(snapshot))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parse::MalformedPolicy;
    use crate::solar::tests::{feed, LINE_FULL, LINE_PARTIAL};

    pub(crate) const SUNSPOTS: &str = "\
1849;12;31;1849.999;  42;  3.1;   1;1
2024;05;09;2024.353; 150; 20.0;  30;0
2024;05;10;2024.356; 165; 21.2;  37;0
2024;05;11;2024.359;  -1; -1.0;   0;0
";

    pub(crate) fn bodies() -> FeedBodies {
        FeedBodies {
            solar: feed(&[LINE_FULL, LINE_PARTIAL]),
            sunspot: SUNSPOTS.to_owned(),
        }
    }

    #[test]
    fn test_build() {
        let snapshot = Snapshot::build(&bodies(), &Settings::default()).unwrap();

        assert_eq!(2, snapshot.solar.len());
        assert_eq!(3, snapshot.sunspots.len());
        assert_eq!(0, snapshot.skipped_solar);
        assert_eq!(Some(148), snapshot.summary.latest_ap);
        assert_eq!(None, snapshot.summary.ap_change);
        assert_eq!(Some(4.667), snapshot.summary.latest_kp.map(|k| k.value));
        assert_eq!(Some(157.5), snapshot.summary.rolling_short.latest());
    }

    #[test]
    fn test_build_fail_policy() {
        let mut b = bodies();
        b.sunspot.push_str("2024;05;12;oops\n");
        let settings = Settings {
            malformed_policy: MalformedPolicy::Fail,
            ..Settings::default()
        };

        assert!(Snapshot::build(&b, &settings).is_err());
    }

    #[test]
    fn test_store_caches_identical_content() {
        let store = SnapshotStore::new(Settings::default());
        assert!(store.current().is_none());

        assert!(matches!(store.update(&bodies()).unwrap(), Update::Replaced(_)));
        assert!(matches!(store.update(&bodies()).unwrap(), Update::Unchanged));

        let mut changed = bodies();
        changed.sunspot.push_str("2024;05;12;2024.362; 170; 20.0;  35;0\n");
        match store.update(&changed).unwrap() {
            Update::Replaced(s) => assert_eq!(4, s.sunspots.len()),
            other => panic!("unexpected update {:?}", other),
        }
        assert_eq!(Some(4), store.current().map(|s| s.sunspots.len()));
    }

    #[test]
    fn test_store_keeps_previous_on_error() {
        let settings = Settings {
            malformed_policy: MalformedPolicy::Fail,
            ..Settings::default()
        };
        let store = SnapshotStore::new(settings);
        store.update(&bodies()).unwrap();

        let mut broken = bodies();
        broken.solar.push_str("not a record\n");
        assert!(store.update(&broken).is_err());
        assert_eq!(Some(2), store.current().map(|s| s.solar.len()));
    }
}
