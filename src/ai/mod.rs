//! AI service integration for image generation and editing
//!
//! Provides the [`ImageApi`] seam the session drives, the Gemini REST
//! implementation of it, and a scriptable mock.

pub mod gemini;
pub mod mime;
pub mod mock;
pub mod response;

pub use gemini::GeminiImageClient;
pub use mock::{MockCall, MockImageApi, MockOutcome};

use crate::models::ImagePayload;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageApi: Send + Sync {
    /// Create a new image from a text prompt.
    async fn generate(&self, prompt: &str) -> Result<ImagePayload>;

    /// Produce a new image by applying `prompt` to `image`.
    async fn edit(&self, image: &ImagePayload, prompt: &str) -> Result<ImagePayload>;
}
