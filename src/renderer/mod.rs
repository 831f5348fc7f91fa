//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `RenderContext` trait the session runner drives. The concrete
//! implementation is headless Chromium via chromiumoxide; tests supply
//! scripted contexts instead.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// A single browser tab. One per quiz session.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout and wait for the load to settle.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<()>;

    /// Full serialized page markup.
    async fn html(&self) -> Result<String>;

    /// Value of `attr` on every element matching `selector`, in document
    /// order. Elements without the attribute yield `None`.
    async fn attr_all(&self, selector: &str, attr: &str) -> Result<Vec<Option<String>>>;

    /// Close this tab.
    async fn close(self: Box<Self>) -> Result<()>;
}
