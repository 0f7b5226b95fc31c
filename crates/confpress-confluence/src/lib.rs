//! Confluence REST API integration for confpress.
//!
//! A deliberately thin layer: [`ConfluenceClient`] covers the handful of
//! REST calls publishing needs (get/find/create/update page, upload
//! attachment), [`PageLocator`] parses page URLs, and [`PagePublisher`]
//! pushes a conversion result to a page. Token auth only; retry policy and
//! space management are out of scope.

mod client;
mod error;
mod locator;
mod publisher;
mod types;

pub use client::ConfluenceClient;
pub use error::ConfluenceError;
pub use locator::{LocatorError, PageLocator};
pub use publisher::{PagePublisher, PublishResult};
pub use types::{Attachment, AttachmentsResponse, Links, Page, PageResults, Version};
