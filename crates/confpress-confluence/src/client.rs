//! Confluence REST API client.
//!
//! Sync HTTP client for the Confluence REST API using personal access token
//! authentication. One [`ureq::Agent`] is shared across calls for connection
//! pooling.

use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

use crate::error::ConfluenceError;
use crate::types::{Attachment, AttachmentsResponse, Page, PageResults};

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Confluence REST API client.
pub struct ConfluenceClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl ConfluenceClient {
    /// Create a client for the given server with a personal access token.
    #[must_use]
    pub fn new(base_url: &str, token: &str) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    /// Get the API base URL.
    fn api_url(&self) -> String {
        format!("{}/rest/api", self.base_url)
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Get page by ID, including its current version.
    pub fn get_page(&self, page_id: &str) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}?expand=version", self.api_url(), page_id);

        info!("Getting page {}", page_id);

        let response = self
            .agent
            .get(&url)
            .header("Authorization", &self.auth_header())
            .header("Accept", "application/json")
            .call()?;

        read_json(response)
    }

    /// Find a page by space key and title.
    pub fn find_page(&self, space: &str, title: &str) -> Result<Option<Page>, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        info!("Searching for page \"{}\" in space {}", title, space);

        let response = self
            .agent
            .get(&url)
            .query("spaceKey", space)
            .query("title", title)
            .query("expand", "version")
            .header("Authorization", &self.auth_header())
            .header("Accept", "application/json")
            .call()?;

        let results: PageResults = read_json(response)?;
        Ok(results.results.into_iter().next())
    }

    /// Create a new page in a space.
    pub fn create_page(
        &self,
        space: &str,
        title: &str,
        body: &str,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content", self.api_url());

        let payload = json!({
            "type": "page",
            "title": title,
            "space": {"key": space},
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            }
        });

        info!("Creating page \"{}\" in space {}", title, space);

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        read_json(response)
    }

    /// Update an existing page (auto-increments version).
    pub fn update_page(
        &self,
        page_id: &str,
        title: &str,
        body: &str,
        version: u32,
        message: Option<&str>,
    ) -> Result<Page, ConfluenceError> {
        let url = format!("{}/content/{}", self.api_url(), page_id);

        let mut payload = json!({
            "type": "page",
            "title": title,
            "body": {
                "storage": {
                    "value": body,
                    "representation": "storage"
                }
            },
            "version": {"number": version + 1}
        });

        if let Some(msg) = message {
            payload["version"]["message"] = json!(msg);
        }

        info!(
            "Updating page {} from version {} to {}",
            page_id,
            version,
            version + 1
        );

        let payload_bytes = serde_json::to_vec(&payload)?;
        let response = self
            .agent
            .put(&url)
            .header("Authorization", &self.auth_header())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(&payload_bytes[..])?;

        read_json(response)
    }

    /// Upload or update attachment (upsert by filename).
    pub fn upload_attachment(
        &self,
        page_id: &str,
        filename: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<Attachment, ConfluenceError> {
        let existing = self.find_attachment_by_name(page_id, filename)?;

        let url = if let Some(ref att) = existing {
            info!(
                "Updating existing attachment '{}' (id={})",
                filename, att.id
            );
            format!(
                "{}/content/{}/child/attachment/{}/data",
                self.api_url(),
                page_id,
                att.id
            )
        } else {
            info!(
                "Uploading new attachment '{}' to page {}",
                filename, page_id
            );
            format!("{}/content/{}/child/attachment", self.api_url(), page_id)
        };

        // Build multipart form data manually
        let boundary = format!(
            "----ConfpressFormBoundary{:016x}",
            rand::rng().random::<u64>()
        );
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        let response = self
            .agent
            .post(&url)
            .header("Authorization", &self.auth_header())
            .header(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .header("X-Atlassian-Token", "nocheck")
            .header("Accept", "application/json")
            .send(&body[..])?;

        // Response is a list for new uploads, single object for updates
        if existing.is_some() {
            read_json(response)
        } else {
            let listing: AttachmentsResponse = read_json(response)?;
            listing
                .results
                .into_iter()
                .next()
                .ok_or_else(|| ConfluenceError::HttpResponse {
                    status: 200,
                    body: "Empty attachment response".to_owned(),
                })
        }
    }

    /// Find an attachment on a page by filename.
    fn find_attachment_by_name(
        &self,
        page_id: &str,
        filename: &str,
    ) -> Result<Option<Attachment>, ConfluenceError> {
        let url = format!("{}/content/{}/child/attachment", self.api_url(), page_id);

        let response = self
            .agent
            .get(&url)
            .query("filename", filename)
            .header("Authorization", &self.auth_header())
            .header("Accept", "application/json")
            .call()?;

        let listing: AttachmentsResponse = read_json(response)?;
        Ok(listing.results.into_iter().next())
    }

    /// Get web URL for a page.
    #[must_use]
    pub fn page_url(&self, page: &Page) -> String {
        if let Some(links) = &page.links
            && let Some(webui) = &links.webui
        {
            return format!("{}{}", self.base_url, webui);
        }

        format!("{}/pages/viewpage.action?pageId={}", self.base_url, page.id)
    }
}

/// Check the response status and decode its JSON body.
fn read_json<T: DeserializeOwned>(
    response: ureq::http::Response<ureq::Body>,
) -> Result<T, ConfluenceError> {
    let status = response.status().as_u16();
    let mut body = response.into_body();

    if status >= 400 {
        let error_body = body
            .read_to_string()
            .unwrap_or_else(|_| "(unable to read error body)".to_owned());
        return Err(ConfluenceError::HttpResponse {
            status,
            body: error_body,
        });
    }

    Ok(body.read_json()?)
}
