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

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Internal(#[from] reqwest::Error),

    #[error("unexpected status {0} for {1}")]
    Unexpected(StatusCode, Url),
}

/// Raw bodies of both feeds from a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBodies {
    pub solar: String,
    pub sunspot: String,
}

/// Downloads the GFZ and SILSO feeds as plain text.
///
/// No retries are made, a failed fetch is reported to the caller who decides whether
/// to keep using a previous result.
#[derive(Debug)]
pub struct FeedClient {
    client: Client,
    solar_url: Url,
    sunspot_url: Url,
}

impl FeedClient {
    const USER_AGENT: &'static str = "swx_exporter (https://github.com/56quarters/swx_exporter)";
    const TEXT_RESPONSE: &'static str = "text/plain, text/csv, */*";

    pub fn new(client: Client, solar_url: Url, sunspot_url: Url) -> Self {
        FeedClient {
            client,
            solar_url,
            sunspot_url,
        }
    }

    pub async fn solar(&self) -> Result<String, ClientError> {
        tracing::debug!(message = "making solar index request", url = %self.solar_url);
        self.fetch_text(self.solar_url.clone()).await
    }

    pub async fn sunspot(&self) -> Result<String, ClientError> {
        tracing::debug!(message = "making sunspot number request", url = %self.sunspot_url);
        self.fetch_text(self.sunspot_url.clone()).await
    }

    /// Fetch both feeds concurrently, failing if either request fails.
    pub async fn fetch(&self) -> Result<FeedBodies, ClientError> {
        let (solar, sunspot) = tokio::try_join!(self.solar(), self.sunspot())?;
        Ok(FeedBodies { solar, sunspot })
    }

    async fn fetch_text(&self, url: Url) -> Result<String, ClientError> {
        let res = self.make_request(url).await?;
        let body = res.text().await?;
        tracing::debug!(message = "fetched feed body", num_bytes = body.len());
        Ok(body)
    }

    async fn make_request(&self, url: Url) -> Result<Response, ClientError> {
        let res = self
            .client
            .get(url.clone())
            .header(USER_AGENT, Self::USER_AGENT)
            .header(ACCEPT, Self::TEXT_RESPONSE)
            .send()
            .await?;

        let status = res.status();
        if status == StatusCode::OK {
            Ok(res)
        } else {
            Err(ClientError::Unexpected(status, url))
        }
    }
}
