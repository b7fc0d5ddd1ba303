//! BLS public API (v2) integration for CPI time series.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::{FetchConfig, FetchRequest, SeriesId};
use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
pub const STATUS_SUCCEEDED: &str = "REQUEST_SUCCEEDED";

/// Anything that can answer a `FetchRequest` with a decoded API payload.
///
/// The batch loop only talks to this trait, so tests can substitute canned
/// responses for the network.
pub trait SeriesSource {
    fn fetch(&self, request: &FetchRequest) -> Result<ApiResponse, AppError>;
}

/// Decoded top-level response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    /// BLS sends either a single string or a list of strings here.
    #[serde(default, deserialize_with = "one_or_many")]
    pub message: Vec<String>,
    #[serde(rename = "Results", default)]
    pub results: Option<ApiResults>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }

    pub fn series(&self) -> &[ApiSeries] {
        self.results.as_ref().map(|r| r.series.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResults {
    #[serde(default)]
    pub series: Vec<ApiSeries>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSeries {
    #[serde(rename = "seriesID")]
    pub series_id: SeriesId,
    #[serde(default)]
    pub data: Vec<ApiDataPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDataPoint {
    pub year: String,
    pub period: String,
    #[serde(rename = "periodName", default)]
    pub period_name: Option<String>,
    pub value: String,
    #[serde(default, deserialize_with = "footnote_list")]
    pub footnotes: Vec<Footnote>,
}

/// BLS pads footnote lists with empty `{}` objects, so both fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Footnote {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Null(()) => Vec::new(),
    })
}

/// Footnote lists may be `null` or contain `null` entries; both mean "none".
fn footnote_list<'de, D>(deserializer: D) -> Result<Vec<Footnote>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<Vec<Option<Footnote>>> = Option::deserialize(deserializer)?;
    Ok(entries.into_iter().flatten().flatten().collect())
}

#[derive(Debug, Serialize)]
struct RequestBody<'a> {
    seriesid: Vec<&'a str>,
    startyear: String,
    endyear: String,
    catalog: bool,
    calculations: bool,
    annualaverage: bool,
    aspects: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

impl<'a> RequestBody<'a> {
    fn new(request: &'a FetchRequest, api_key: Option<&'a str>) -> Self {
        Self {
            seriesid: request.series_ids.iter().map(SeriesId::as_str).collect(),
            startyear: request.start_year.to_string(),
            endyear: request.end_year.to_string(),
            catalog: false,
            calculations: false,
            annualaverage: false,
            aspects: false,
            registrationkey: api_key,
        }
    }
}

pub struct BlsClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl BlsClient {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::network(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self, AppError> {
        Self::new(config.api_url.clone(), config.api_key.clone(), config.timeout)
    }
}

impl SeriesSource for BlsClient {
    fn fetch(&self, request: &FetchRequest) -> Result<ApiResponse, AppError> {
        let body = RequestBody::new(request, self.api_key.as_deref());
        debug!(series = body.seriesid.len(), url = %self.url, "posting BLS request");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| AppError::network(format!("BLS request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::network(format!(
                "BLS request failed with status {}.",
                resp.status()
            )));
        }

        resp.json()
            .map_err(|e| AppError::network(format!("Failed to parse BLS response: {e}")))
    }
}
