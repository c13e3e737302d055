use super::history::{HistoryEntry, ImageRef};
use crate::error::ClientError;
use crate::workflow::ExecutionGraph;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// The remote generation service, as seen by the job client.
pub trait GenerationService {
    /// Queues `graph` and returns the job identifier the service issued.
    fn submit(&self, graph: &ExecutionGraph) -> Result<String, ClientError>;

    /// The history record for exactly `prompt_id`, or `None` if the service has none yet.
    fn history(&self, prompt_id: &str) -> Result<Option<HistoryEntry>, ClientError>;

    /// Downloads the bytes of a produced image.
    fn fetch_artifact(&self, image: &ImageRef) -> Result<Vec<u8>, ClientError>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    prompt: &'a ExecutionGraph,
}

#[derive(Deserialize)]
struct SubmitResponse {
    prompt_id: String,
}

/// Blocking HTTP implementation against the service's `/prompt`, `/history` and `/view` endpoints.
pub struct HttpService {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        // The service runs on the local network; environment proxies are not consulted.
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ClientError::Transport {
                url: base_url.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send(
        &self,
        url: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        request.send().map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn read_text(url: &str, response: reqwest::blocking::Response) -> Result<String, ClientError> {
        response.text().map_err(|e| ClientError::Transport {
            url: url.to_string(),
            message: format!("Failed to read response body: {}", e),
        })
    }
}

impl GenerationService for HttpService {
    fn submit(&self, graph: &ExecutionGraph) -> Result<String, ClientError> {
        let url = self.endpoint("prompt");
        debug!(url = %url, nodes = graph.len(), "Submitting workflow");

        let response = self.send(&url, self.http.post(&url).json(&SubmitRequest { prompt: graph }))?;
        let status = response.status();
        let body = Self::read_text(&url, response)?;

        if !status.is_success() {
            error!(status = %status, body = %body, "Generation service rejected workflow");
            return Err(ClientError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SubmitResponse = serde_json::from_str(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("submission response without prompt_id: {}", e))
        })?;
        Ok(parsed.prompt_id)
    }

    fn history(&self, prompt_id: &str) -> Result<Option<HistoryEntry>, ClientError> {
        let url = self.endpoint(&format!("history/{}", prompt_id));
        let response = self.send(&url, self.http.get(&url))?;
        let status = response.status();
        let body = Self::read_text(&url, response)?;

        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        let mut entries: AHashMap<String, HistoryEntry> = serde_json::from_str(&body)
            .map_err(|e| ClientError::InvalidResponse(format!("history payload: {}", e)))?;
        Ok(entries.remove(prompt_id))
    }

    fn fetch_artifact(&self, image: &ImageRef) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint("view");
        let request = self.http.get(&url).query(&[
            ("filename", image.filename.as_str()),
            ("subfolder", image.subfolder.as_str()),
            ("type", image.kind.as_str()),
        ]);
        let response = self.send(&url, request)?;
        let status = response.status();

        if !status.is_success() {
            let body = Self::read_text(&url, response).unwrap_or_default();
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| ClientError::Transport {
                url,
                message: format!("Failed to read artifact '{}': {}", image.filename, e),
            })
    }
}
