//! Remote services HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). One instance per
//! importer run; it is `Clone` and cheap to share across worker threads.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::pages::{parse_envelope, Pages};

// ── Constants ───────────────────────────────────────────────────────

pub const USER_AGENT: &str = concat!("mainsite/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// `base` with `query` appended, keeping any query already on `base`.
pub fn build_url(base: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
    let mut url = url::Url::parse(base)
        .map_err(|e| FetchError::InvalidUrl { url: base.to_string(), message: e.to_string() })?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

fn csv_error(url: &str, err: csv::Error) -> FetchError {
    FetchError::Csv { url: url.to_string(), message: err.to_string() }
}

/// Decode every row against the header line. Short rows are padded with
/// empty trailing columns; a row that still does not decode is returned
/// as its own error so the other rows survive.
fn parse_csv<T: DeserializeOwned>(url: &str, body: &str) -> Result<Vec<Result<T, FetchError>>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.trim_start_matches('\u{feff}').as_bytes());
    let headers = reader.headers().map_err(|e| csv_error(url, e))?.clone();

    let rows = reader
        .records()
        .map(|record| {
            let mut record = record.map_err(|e| csv_error(url, e))?;
            while record.len() < headers.len() {
                record.push_field("");
            }
            record.deserialize(Some(&headers)).map_err(|e| csv_error(url, e))
        })
        .collect();
    Ok(rows)
}

// ── SourceClient ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct SourceClient {
    http: reqwest::blocking::Client,
}

impl SourceClient {
    /// Every request made through this client shares `timeout`.
    /// A timeout surfaces as [`FetchError::Timeout`]; nothing is retried.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Connection {
                url: String::new(),
                message: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { http })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        debug!(url, "GET");
        let resp = self.http.get(url).send().map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = resp.status().as_u16();
        if status >= 400 {
            return Err(FetchError::Http { status, url: url.to_string() });
        }
        Ok(resp)
    }

    pub fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)?.text().map_err(|e| FetchError::from_reqwest(url, e))
    }

    pub fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.get_text(url)?;
        serde_json::from_str(&body).map_err(|e| FetchError::Parse { url: url.to_string(), message: e.to_string() })
    }

    /// Every record of a paginated endpoint, starting at `base_url?query`.
    ///
    /// Nothing is requested until the returned iterator is polled.
    pub fn fetch_all(&self, base_url: &str, query: &[(&str, &str)]) -> Result<Pages<'_>, FetchError> {
        Ok(Pages::new(self, build_url(base_url, query)?))
    }

    /// `results[0].id` of a single search page; `None` when nothing matched.
    pub fn first_result_id(&self, base_url: &str, query: &[(&str, &str)]) -> Result<Option<String>, FetchError> {
        let url = build_url(base_url, query)?;
        let (results, _) = parse_envelope(&url, self.get_json(&url)?)?;
        Ok(results.first().and_then(|first| match first.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }))
    }

    /// The catalog document's `programs` array.
    pub fn fetch_catalog(&self, url: &str) -> Result<Vec<Value>, FetchError> {
        let mut doc = self.get_json(url)?;
        match doc.get_mut("programs").map(Value::take) {
            Some(Value::Array(programs)) => Ok(programs),
            Some(_) => Err(FetchError::Parse { url: url.to_string(), message: "'programs' is not a list".into() }),
            None => Err(FetchError::MissingField { url: url.to_string(), field: "programs".into() }),
        }
    }

    /// A CSV export decoded row by row into `T`. A leading BOM is ignored.
    ///
    /// The outer error covers the request and the header line; each row
    /// carries its own decode result.
    pub fn fetch_csv<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<Result<T, FetchError>>, FetchError> {
        let body = self.get_text(url)?;
        parse_csv(url, &body)
    }

    /// `source_url` of a WordPress media item, as the exporting site reports it.
    pub fn media_source_url(&self, base_url: &str, media_id: &str) -> Result<String, FetchError> {
        let url = format!("{}/wp-json/wp/v2/media/{}", base_url.trim_end_matches('/'), media_id.trim());
        let doc = self.get_json(&url)?;
        doc.get("source_url")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| FetchError::MissingField { url, field: "source_url".into() })
    }
}
