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

use clap::Parser;
use prometheus_client::registry::Registry;
use reqwest::{Client, Url};
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use swx_exporter::client::FeedClient;
use swx_exporter::config::{self, FluxLabel, Settings};
use swx_exporter::http::RequestContext;
use swx_exporter::metrics::IndexMetrics;
use swx_exporter::parse::MalformedPolicy;
use swx_exporter::snapshot::{SnapshotStore, Update};
use swx_exporter::solar::GFZ_NOWCAST;
use tokio::signal::unix::{self, SignalKind};
use tracing::{Instrument, Level};

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9784);
const DEFAULT_REFERSH_SECS: u64 = 900;
const DEFAULT_TIMEOUT_MILLIS: u64 = 30000;
const METRICS_PREFIX: &str = "swx";

#[derive(Debug, Parser)]
#[clap(name = "swx_exporter", version = clap::crate_version!())]
struct SwxExporterApplication {
    /// URL of the GFZ Kp/ap/Ap/SN/F10.7 nowcast file
    #[clap(long, default_value_t = config::DEFAULT_SOLAR_URL.into())]
    solar_url: String,

    /// URL of the SILSO daily total sunspot number file
    #[clap(long, default_value_t = config::DEFAULT_SUNSPOT_URL.into())]
    sunspot_url: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Fetch both feeds at this interval, in seconds.
    #[clap(long, default_value_t = DEFAULT_REFERSH_SECS)]
    refresh_secs: u64,

    /// Timeout for fetching each feed, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Number of header lines at the top of the nowcast file to ignore.
    #[clap(long, default_value_t = config::DEFAULT_HEADER_SKIP_LINES)]
    header_skip_lines: usize,

    /// Width of the short trailing sunspot number mean, in days.
    #[clap(long, default_value_t = config::DEFAULT_SHORT_WINDOW_DAYS)]
    short_window_days: u32,

    /// Width of the long trailing sunspot number mean, in days.
    #[clap(long, default_value_t = config::DEFAULT_LONG_WINDOW_DAYS)]
    long_window_days: u32,

    /// Value both feeds use to mark a missing observation.
    #[clap(long, default_value_t = config::DEFAULT_SENTINEL_VALUE, allow_negative_numbers = true)]
    sentinel_value: i64,

    /// Sunspot numbers dated before this year are ignored.
    #[clap(long, default_value_t = config::DEFAULT_MIN_SUNSPOT_YEAR)]
    min_sunspot_year: i32,

    /// Reject a fetch entirely if either feed contains a malformed line, instead of
    /// skipping the line.
    #[clap(long)]
    strict: bool,

    /// Name to report the F10.7 value under. The value is always read from the observed
    /// flux column of the nowcast file, 'adjusted' only changes the label for dashboards
    /// that have historically called it F10.7adj.
    #[clap(long, value_enum, default_value_t = FluxLabel::Observed)]
    flux_label: FluxLabel,

    /// Address to bind to. By default, swx_exporter will bind to public address since
    /// the purpose is to expose metrics to an external system (Prometheus or another
    /// agent for ingestion)
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

impl SwxExporterApplication {
    fn settings(&self) -> Settings {
        Settings {
            header_skip_lines: self.header_skip_lines,
            short_window_days: self.short_window_days,
            long_window_days: self.long_window_days,
            sentinel_value: self.sentinel_value,
            min_sunspot_year: self.min_sunspot_year,
            malformed_policy: if self.strict {
                MalformedPolicy::Fail
            } else {
                MalformedPolicy::Skip
            },
            flux_label: self.flux_label,
            ..Settings::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = SwxExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    let solar_url = parse_url(&opts.solar_url);
    let sunspot_url = parse_url(&opts.sunspot_url);

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let settings = opts.settings();
    tracing::debug!(
        message = "reading F10.7 from the observed flux column",
        start = GFZ_NOWCAST.flux.start,
        end = GFZ_NOWCAST.flux.end,
        label = %settings.flux_label,
    );

    let client = FeedClient::new(http_client, solar_url.clone(), sunspot_url.clone());
    let store = Arc::new(SnapshotStore::new(settings));
    let mut registry = Registry::with_prefix(METRICS_PREFIX);
    let metrics = IndexMetrics::new(&mut registry);
    let mut interval = tokio::time::interval(Duration::from_secs(opts.refresh_secs));

    let poll_store = store.clone();
    tokio::spawn(async move {
        tracing::info!(message = "feed polling started", solar_url = %solar_url, sunspot_url = %sunspot_url);

        loop {
            let _ = interval.tick().await;
            let bodies = match client
                .fetch()
                .instrument(tracing::span!(Level::DEBUG, "swx_fetch"))
                .await
            {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!(message = "failed to fetch feeds", error = %e);
                    continue;
                }
            };

            match poll_store.update(&bodies) {
                Ok(Update::Replaced(snapshot)) => {
                    metrics.update(&snapshot);
                    tracing::info!(
                        message = "parsed new feed data",
                        solar_records = snapshot.solar.len(),
                        sunspot_records = snapshot.sunspots.len(),
                    );
                }
                Ok(Update::Unchanged) => {
                    tracing::debug!(message = "feed data unchanged since last fetch");
                }
                Err(e) => {
                    tracing::error!(message = "failed to parse feeds", error = %e);
                }
            }
        }
    });

    let context = Arc::new(RequestContext::new(registry, store));
    let app = swx_exporter::http::router(context);
    let server = axum::Server::try_bind(&opts.bind)
        .unwrap_or_else(|e| {
            tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
            process::exit(1)
        })
        .serve(app.into_make_service());

    tracing::info!(message = "server started", address = %server.local_addr());
    server
        .with_graceful_shutdown(async {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

fn parse_url(raw: &str) -> Url {
    Url::parse(raw).unwrap_or_else(|e| {
        tracing::error!(message = "invalid feed URL", url = %raw, error = %e);
        process::exit(1)
    })
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
