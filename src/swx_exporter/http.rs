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

use crate::config::{FluxLabel, ImageLink};
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::solar::SolarIndexRecord;
use crate::summary::{KpReading, RollingSeries};
use axum::extract::{Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const OPENMETRICS_TEXT: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Days either side of the focus date shown for the short rolling series, about one
/// solar cycle.
const FOCUS_HALF_WIDTH_DAYS: u32 = 11 * 365;

/// Number of most recent days of solar index records included in the summary.
const RECENT_DAYS: usize = 7;

/// State shared by all HTTP handlers.
#[derive(Debug)]
pub struct RequestContext {
    registry: Registry,
    store: Arc<SnapshotStore>,
}

impl RequestContext {
    pub fn new(registry: Registry, store: Arc<SnapshotStore>) -> Self {
        Self { registry, store }
    }
}

pub fn router(context: Arc<RequestContext>) -> Router {
    Router::new()
        .route("/metrics", get(text_metrics))
        .route("/api/summary", get(summary))
        .route("/api/sunspots", get(sunspots))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn text_metrics(State(context): State<Arc<RequestContext>>) -> Response {
    let mut buf = String::new();

    match encode(&mut buf, &context.registry) {
        Ok(_) => {
            tracing::debug!(message = "encoded prometheus metrics to text format", num_bytes = buf.len());
            ([(CONTENT_TYPE, OPENMETRICS_TEXT)], buf).into_response()
        }
        Err(e) => {
            tracing::error!(message = "error encoding metrics", error = %e);
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[derive(Debug, Serialize)]
struct SkippedLines {
    solar: usize,
    sunspot: usize,
}

#[derive(Debug, Serialize)]
struct SummaryResponse<'a> {
    flux_label: FluxLabel,
    latest_ap: Option<i64>,
    ap_change: Option<i64>,
    latest_f107: Option<f64>,
    f107_change: Option<f64>,
    latest_kp: Option<KpReading>,
    latest_sunspot_count: Option<i64>,
    recent: &'a [SolarIndexRecord],
    skipped_lines: SkippedLines,
    images: &'a [ImageLink],
    sources: &'a [String],
}

async fn summary(State(context): State<Arc<RequestContext>>) -> Response {
    let snapshot = match context.store.current() {
        Some(s) => s,
        None => return not_ready(),
    };

    let settings = context.store.settings();
    let summary = &snapshot.summary;
    let recent_start = snapshot.solar.len().saturating_sub(RECENT_DAYS);

    Json(SummaryResponse {
        flux_label: snapshot.flux_label,
        latest_ap: summary.latest_ap,
        ap_change: summary.ap_change,
        latest_f107: summary.latest_f107,
        f107_change: summary.f107_change,
        latest_kp: summary.latest_kp,
        latest_sunspot_count: summary.latest_sunspot_count,
        recent: &snapshot.solar[recent_start..],
        skipped_lines: skipped_lines(&snapshot),
        images: &settings.images,
        sources: &settings.sources,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct FocusParams {
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct SunspotResponse<'a> {
    focus: NaiveDate,
    short: RollingSeries,
    long: &'a RollingSeries,
}

async fn sunspots(State(context): State<Arc<RequestContext>>, Query(params): Query<FocusParams>) -> Response {
    let snapshot = match context.store.current() {
        Some(s) => s,
        None => return not_ready(),
    };

    let focus = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Json(SunspotResponse {
        focus,
        short: snapshot.summary.rolling_short.around(focus, FOCUS_HALF_WIDTH_DAYS),
        long: &snapshot.summary.rolling_long,
    })
    .into_response()
}

fn skipped_lines(snapshot: &Snapshot) -> SkippedLines {
    SkippedLines {
        solar: snapshot.skipped_solar,
        sunspot: snapshot.skipped_sunspot,
    }
}

fn not_ready() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "no feed data fetched yet").into_response()
}
