//! Provider-neutral response normalization.
//!
//! A model response is a list of candidates, each an ordered list of parts.
//! The first image part of the first candidate wins; text is only surfaced
//! when no image came back.

use crate::ai::mime::DEFAULT_MEDIA_TYPE;
use crate::models::ImagePayload;
use crate::{Error, Result};
use base64::Engine as _;

/// One unit of a candidate's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    /// Inline image, still base64 encoded as it came off the wire.
    Image {
        media_type: Option<String>,
        data: String,
    },
    Text(String),
}

/// Pick the image out of a response.
pub fn extract_image(candidates: &[Vec<ResponsePart>]) -> Result<ImagePayload> {
    let parts = candidates.first().ok_or(Error::NoCandidates)?;

    let image = parts.iter().find_map(|part| match part {
        ResponsePart::Image { media_type, data } if !data.is_empty() => {
            Some((media_type.as_deref(), data))
        }
        _ => None,
    });

    if let Some((media_type, data)) = image {
        let media_type = media_type
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MEDIA_TYPE);
        tracing::debug!("Model returned image with mime_type: {}", media_type);

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| {
                Error::AiProvider(format!("Failed to decode Gemini base64 image: {}", e))
            })?;
        return Ok(ImagePayload::new(bytes, media_type));
    }

    let text = parts.iter().find_map(|part| match part {
        ResponsePart::Text(text) if !text.is_empty() => Some(text),
        _ => None,
    });

    match text {
        Some(text) => Err(Error::TextInsteadOfImage(text.clone())),
        None => Err(Error::NoUsableResponse),
    }
}
