//! Page publishing: push converted markup and attachments to Confluence.

use confpress_core::Artifact;
use tracing::info;

use crate::client::ConfluenceClient;
use crate::error::ConfluenceError;
use crate::locator::PageLocator;
use crate::types::Page;

/// Content type for rendered diagram attachments.
const PNG_CONTENT_TYPE: &str = "image/png";

/// Result of publishing a page.
#[derive(Debug)]
pub struct PublishResult {
    /// The page after create/update.
    pub page: Page,
    /// Web URL of the page.
    pub url: String,
    /// Number of attachments uploaded.
    pub attachments_uploaded: usize,
    /// Whether the page was created (as opposed to updated).
    pub created: bool,
}

/// Publishes conversion results to Confluence pages.
pub struct PagePublisher<'a> {
    client: &'a ConfluenceClient,
}

impl<'a> PagePublisher<'a> {
    /// Create a publisher using the given client.
    pub fn new(client: &'a ConfluenceClient) -> Self {
        Self { client }
    }

    /// Create or update the located page, then upload attachments in order.
    ///
    /// A page addressed by ID must already exist; a space/title locator
    /// creates the page when no match is found.
    pub fn publish(
        &self,
        locator: &PageLocator,
        title: &str,
        markup: &str,
        artifacts: &[Artifact],
        message: Option<&str>,
    ) -> Result<PublishResult, ConfluenceError> {
        let (page, created) = match locator {
            PageLocator::Id(id) => {
                let current = self.client.get_page(id)?;
                let updated = self.client.update_page(
                    id,
                    title,
                    markup,
                    current.version.number,
                    message,
                )?;
                (updated, false)
            }
            PageLocator::SpaceTitle {
                space,
                title: page_title,
            } => {
                match self.client.find_page(space, page_title)? {
                    Some(current) => {
                        let updated = self.client.update_page(
                            &current.id,
                            title,
                            markup,
                            current.version.number,
                            message,
                        )?;
                        (updated, false)
                    }
                    None => (self.client.create_page(space, title, markup)?, true),
                }
            }
        };

        for artifact in artifacts {
            self.client.upload_attachment(
                &page.id,
                &artifact.filename,
                &artifact.bytes,
                PNG_CONTENT_TYPE,
            )?;
        }

        info!(
            "Published page {} with {} attachment(s)",
            page.id,
            artifacts.len()
        );

        Ok(PublishResult {
            url: self.client.page_url(&page),
            attachments_uploaded: artifacts.len(),
            page,
            created,
        })
    }
}
