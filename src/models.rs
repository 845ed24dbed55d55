//! Data models and structures
//!
//! Defines image payloads and records, the session status values, and the
//! client configuration loaded from the environment.

use crate::ai::mime;
use crate::{Error, Result};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Prompt recorded on images that came from a local upload.
pub const UPLOADED_IMAGE_PROMPT: &str = "Uploaded Image";

/// Decoded image content plus its media type.
///
/// The bytes are shared, so cloning a payload (and every record holding one)
/// never copies image data.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: Arc<[u8]>,
    media_type: String,
}

impl ImagePayload {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Decode a `data:<type>;base64,...` string (or bare base64).
    pub fn from_data_uri(encoded: &str) -> Result<Self> {
        let (media_type, bytes) = mime::split_data_uri(encoded)?;
        Ok(Self::new(bytes, media_type))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Render as a data URI suitable for an `<img src>` or a download link.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    pub fn file_extension(&self) -> &'static str {
        mime::extension_for(&self.media_type)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One image in the session. Records are never mutated; edits create new ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    id: Uuid,
    payload: ImagePayload,
    prompt: String,
    created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(payload: ImagePayload, prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            prompt: prompt.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Whether a remote call is outstanding, and which kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Generating,
    Editing,
}

impl Status {
    pub fn is_idle(self) -> bool {
        self == Status::Idle
    }

    /// Busy text shown while a call is in flight.
    pub fn activity_message(self) -> Option<&'static str> {
        match self {
            Status::Idle => None,
            Status::Generating => Some("Dreaming up pixels..."),
            Status::Editing => Some("Editing your masterpiece..."),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Idle => "idle",
            Status::Generating => "generating",
            Status::Editing => "editing",
        };
        f.write_str(label)
    }
}

/// What the next prompt will do: create a new image or edit the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Generate,
    Edit,
}

impl Mode {
    pub fn placeholder(self) -> &'static str {
        match self {
            Mode::Generate => "Describe an image to generate...",
            Mode::Edit => "Describe how to edit this image (e.g. 'Add a retro filter')",
        }
    }
}

// Configuration
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub image_model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub aspect_ratio: Option<String>,
}

impl Config {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            aspect_ratio: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let timeout = match var("GEMINI_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!(
                        "GEMINI_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            image_model: var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            base_url: var("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            timeout,
            aspect_ratio: var("GEMINI_ASPECT_RATIO"),
        })
    }
}
