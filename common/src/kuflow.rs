//! HTTP client for the KuFlow REST API.

use crate::error::RestError;
use crate::models::{
    Document, DocumentReference, JsonPatchOperation, Process, ProcessItem,
    ProcessItemCreateParams, ProcessItemTaskAppendLogParams, ProcessItemTaskDataUpdateParams,
};
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.kuflow.com/v2024-06-14";

const DEFAULT_USER_AGENT: &str = "KuFlowSamples/1.0";
const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub enum Credential {
    /// Application credentials, sent as HTTP basic auth.
    ClientSecret {
        client_id: String,
        client_secret: String,
    },
    /// Short-lived user token handed to robots by the platform.
    Token {
        token: String,
        expires_on: Option<DateTime<Utc>>,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ClientSecret { client_id, .. } => f
                .debug_struct("ClientSecret")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Credential::Token { expires_on, .. } => f
                .debug_struct("Token")
                .field("token", &"<redacted>")
                .field("expires_on", expires_on)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KuFlowRestClient {
    client: Client,
    endpoint: String,
    credential: Credential,
}

impl KuFlowRestClient {
    pub fn new(
        endpoint: Option<&str>,
        credential: Credential,
        allow_insecure_connection: bool,
    ) -> Result<Self, RestError> {
        let endpoint = normalize_endpoint(endpoint)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(DEFAULT_USER_AGENT),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(allow_insecure_connection)
            .build()
            .map_err(RestError::Client)?;

        Ok(Self {
            client,
            endpoint,
            credential,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn create_process_item(
        &self,
        params: &ProcessItemCreateParams,
    ) -> Result<ProcessItem, RestError> {
        self.execute(Method::POST, &["process-items"], |req| req.json(params))
            .await
    }

    pub async fn retrieve_process_item(&self, id: &str) -> Result<ProcessItem, RestError> {
        self.execute(Method::GET, &["process-items", id], |req| req)
            .await
    }

    pub async fn update_process_item_task_data(
        &self,
        id: &str,
        params: &ProcessItemTaskDataUpdateParams,
    ) -> Result<ProcessItem, RestError> {
        let path = ["process-items", id, "task", "~actions", "update-data"];
        self.execute(Method::POST, &path, |req| req.json(params))
            .await
    }

    pub async fn complete_process_item_task(&self, id: &str) -> Result<ProcessItem, RestError> {
        let path = ["process-items", id, "task", "~actions", "complete"];
        self.execute(Method::POST, &path, |req| req).await
    }

    pub async fn append_process_item_task_log(
        &self,
        id: &str,
        params: &ProcessItemTaskAppendLogParams,
    ) -> Result<ProcessItem, RestError> {
        let path = ["process-items", id, "task", "~actions", "append-log"];
        self.execute(Method::POST, &path, |req| req.json(params))
            .await
    }

    pub async fn retrieve_process(&self, id: &str) -> Result<Process, RestError> {
        self.execute(Method::GET, &["processes", id], |req| req)
            .await
    }

    pub async fn patch_process_metadata(
        &self,
        id: &str,
        json_patch: &[JsonPatchOperation],
    ) -> Result<Process, RestError> {
        let path = ["processes", id, "metadata"];
        self.execute(Method::PATCH, &path, |req| {
            req.header(header::CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
                .json(json_patch)
        })
        .await
    }

    pub async fn upload_process_document(
        &self,
        id: &str,
        document: Document,
    ) -> Result<DocumentReference, RestError> {
        let path = ["processes", id, "~actions", "upload-document"];
        self.execute(Method::POST, &path, |req| {
            req.query(&[
                ("fileName", document.file_name.as_str()),
                ("fileContentType", document.content_type.as_str()),
            ])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(document.file_content)
        })
        .await
    }

    /// Endpoint with `segments` appended, each one percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, RestError> {
        let invalid = |reason: String| RestError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let mut url = Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder, RestError> {
        match &self.credential {
            Credential::ClientSecret {
                client_id,
                client_secret,
            } => Ok(req.basic_auth(client_id, Some(client_secret))),
            Credential::Token { token, expires_on } => {
                if let Some(expires_on) = expires_on {
                    if *expires_on <= Utc::now() {
                        return Err(RestError::TokenExpired(*expires_on));
                    }
                }
                Ok(req.bearer_auth(token))
            }
        }
    }

    async fn execute<T, F>(&self, method: Method, path: &[&str], build: F) -> Result<T, RestError>
    where
        T: DeserializeOwned,
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let target = self.url(path)?;
        let url = target.to_string();
        let req = self.authorize(self.client.request(method.clone(), target))?;

        tracing::debug!(%method, %url, "Sending KuFlow API request");

        let response = build(req)
            .send()
            .await
            .map_err(|source| RestError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| RestError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            tracing::warn!(%method, %url, %status, "KuFlow API request failed");
            return Err(RestError::Status {
                method,
                url,
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| RestError::Decode {
            method,
            url,
            source,
        })
    }
}

fn normalize_endpoint(endpoint: Option<&str>) -> Result<String, RestError> {
    let endpoint = match endpoint.map(str::trim) {
        None | Some("") => DEFAULT_API_ENDPOINT,
        Some(raw) if raw.eq_ignore_ascii_case("none") => DEFAULT_API_ENDPOINT,
        Some(raw) => raw,
    };

    Url::parse(endpoint).map_err(|e| RestError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;

    Ok(endpoint.trim_end_matches('/').to_string())
}
