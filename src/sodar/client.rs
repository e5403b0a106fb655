/*!
 * Blocking client for the SODAR REST API
 */

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{Investigation, SampleSheet};
use crate::config::SodarSettings;
use crate::error::{Result, SeqportError};

/// Read access to project metadata
pub trait MetadataSource {
    fn get_investigation(&self, project_uuid: &str) -> Result<Investigation>;
    fn get_samplesheet(&self, project_uuid: &str) -> Result<SampleSheet>;
}

pub struct SodarClient {
    http: Client,
    server_url: String,
}

impl SodarClient {
    pub fn new(settings: &SodarSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", settings.api_token)).map_err(|_| {
                SeqportError::Config("SODAR API token is not a valid header value".to_string())
            })?,
        );

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            server_url: settings.server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = endpoint_url(&self.server_url, endpoint);
        debug!("HTTP GET request to {}", url);
        let resp = self.http.get(&url).send()?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(SeqportError::Metadata(format!(
                "GET {} returned {}: {}",
                url,
                status.as_u16(),
                body
            )));
        }

        Ok(serde_json::from_slice(&resp.bytes()?)?)
    }
}

impl MetadataSource for SodarClient {
    fn get_investigation(&self, project_uuid: &str) -> Result<Investigation> {
        self.get_json(&format!("samplesheets/api/investigation/retrieve/{}", project_uuid))
    }

    fn get_samplesheet(&self, project_uuid: &str) -> Result<SampleSheet> {
        self.get_json(&format!("samplesheets/api/export/json/{}", project_uuid))
    }
}

fn endpoint_url(server_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        server_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
