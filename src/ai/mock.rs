use super::ImageApi;
use crate::models::ImagePayload;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// 1x1 PNG returned when no outcome has been queued.
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Generate { prompt: String },
    Edit { image: ImagePayload, prompt: String },
}

/// A scripted result for the next call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Image(ImagePayload),
    ProviderError(String),
    TextOnly(String),
    NoCandidates,
    NoUsableResponse,
}

impl MockOutcome {
    fn into_result(self) -> Result<ImagePayload> {
        match self {
            MockOutcome::Image(payload) => Ok(payload),
            MockOutcome::ProviderError(message) => Err(Error::AiProvider(message)),
            MockOutcome::TextOnly(text) => Err(Error::TextInsteadOfImage(text)),
            MockOutcome::NoCandidates => Err(Error::NoCandidates),
            MockOutcome::NoUsableResponse => Err(Error::NoUsableResponse),
        }
    }
}

/// In-memory [`ImageApi`] with queued outcomes and call recording.
///
/// Clones share state, so a test can keep a probe after handing the mock to
/// a [`crate::session::Studio`]. With a gate installed, every call waits for
/// one `notify_one` before settling.
#[derive(Clone)]
pub struct MockImageApi {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    gate: Option<Arc<Notify>>,
}

impl MockImageApi {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_image_response(self, data: Vec<u8>, media_type: &str) -> Self {
        self.with_outcome(MockOutcome::Image(ImagePayload::new(data, media_type)))
    }

    pub fn with_failure(self, message: &str) -> Self {
        self.with_outcome(MockOutcome::ProviderError(message.to_string()))
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn settle(&self, call: MockCall) -> Result<ImagePayload> {
        self.calls.lock().unwrap().push(call);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            MockOutcome::Image(ImagePayload::new(TINY_PNG.to_vec(), "image/png"))
        })
        .into_result()
    }
}

impl Default for MockImageApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageApi for MockImageApi {
    async fn generate(&self, prompt: &str) -> Result<ImagePayload> {
        self.settle(MockCall::Generate {
            prompt: prompt.to_string(),
        })
        .await
    }

    async fn edit(&self, image: &ImagePayload, prompt: &str) -> Result<ImagePayload> {
        self.settle(MockCall::Edit {
            image: image.clone(),
            prompt: prompt.to_string(),
        })
        .await
    }
}
