use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::info;

use crate::domain::StructureId;
use crate::error::IngestError;

pub trait RcsbClient: Send + Sync {
    fn download_structure_xml(
        &self,
        id: &StructureId,
        destination: &Path,
    ) -> Result<(), IngestError>;
}

#[derive(Clone)]
pub struct RcsbHttpClient {
    client: Client,
}

impl RcsbHttpClient {
    pub fn new() -> Result<Self, IngestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pdbx-ingest/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| IngestError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| IngestError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn structure_xml_url(id: &StructureId) -> String {
        format!("https://files.rcsb.org/download/{}.xml.gz", id.as_str())
    }

    fn handle_status(
        id: &StructureId,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, IngestError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "RCSB request failed".to_string());
        Err(IngestError::FetchStatus {
            structure: id.as_str().to_string(),
            status,
            message,
        })
    }
}

impl RcsbClient for RcsbHttpClient {
    fn download_structure_xml(
        &self,
        id: &StructureId,
        destination: &Path,
    ) -> Result<(), IngestError> {
        let url = Self::structure_xml_url(id);
        info!(structure = id.as_str(), url = url.as_str(), "downloading structure");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| IngestError::Fetch {
                structure: id.as_str().to_string(),
                message: err.to_string(),
            })?;
        let mut response = Self::handle_status(id, response)?;
        let mut file =
            File::create(destination).map_err(|err| IngestError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| IngestError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structure_xml_url_template() {
        let id: StructureId = "5E2V".parse().unwrap();
        assert_eq!(
            RcsbHttpClient::structure_xml_url(&id),
            "https://files.rcsb.org/download/5e2v.xml.gz"
        );
    }
}
