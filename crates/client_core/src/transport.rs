use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use shared::domain::{Employee, EmployeeDraft};
use tracing::debug;
use url::Url;

use crate::error::StoreError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// The remote collection of employees, addressed by email for mutations.
#[async_trait]
pub trait DirectoryTransport: Send + Sync {
    async fn list(&self) -> Result<Vec<Employee>, StoreError>;
    async fn create(&self, draft: &EmployeeDraft) -> Result<Employee, StoreError>;
    async fn update(&self, email: &str, draft: &EmployeeDraft) -> Result<Employee, StoreError>;
    async fn delete(&self, email: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub struct HttpDirectoryTransport {
    http: Client,
    collection_url: Url,
}

impl HttpDirectoryTransport {
    pub fn new(collection_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let parsed = Url::parse(collection_url).map_err(|err| {
            StoreError::transport(format!("invalid collection url '{collection_url}': {err}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(StoreError::transport(format!(
                "collection url '{collection_url}' cannot address members"
            )));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            collection_url: parsed,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    /// `{collection}/{email}` with the email as one percent-encoded segment.
    pub fn member_url(&self, email: &str) -> Url {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(email);
        }
        url
    }
}

#[async_trait]
impl DirectoryTransport for HttpDirectoryTransport {
    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        debug!(url = %self.collection_url, "listing employees");
        let response = self.http.get(self.collection_url.clone()).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn create(&self, draft: &EmployeeDraft) -> Result<Employee, StoreError> {
        debug!(url = %self.collection_url, email = %draft.email, "creating employee");
        let response = self
            .http
            .post(self.collection_url.clone())
            .json(draft)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn update(&self, email: &str, draft: &EmployeeDraft) -> Result<Employee, StoreError> {
        let url = self.member_url(email);
        debug!(%url, "updating employee");
        let response = self.http.put(url).json(draft).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn delete(&self, email: &str) -> Result<(), StoreError> {
        let url = self.member_url(email);
        debug!(%url, "deleting employee");
        let response = self.http.delete(url).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::rejected(
        status.as_u16(),
        rejection_message(status, &body),
    ))
}

/// Error detail from a JSON body when it carries one, else the status text.
pub(crate) fn rejection_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => reason.to_string(),
            None => status.as_u16().to_string(),
        })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
