//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    AiProvider(String),

    #[error("No candidates returned from Gemini.")]
    NoCandidates,

    #[error("Model returned text instead of an image: {0}")]
    TextInsteadOfImage(String),

    #[error("No image data found in response.")]
    NoUsableResponse,

    #[error("Invalid image payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_refusal_message_carries_model_text() {
        let err = Error::TextInsteadOfImage("I can't draw that.".to_string());
        assert_eq!(
            err.to_string(),
            "Model returned text instead of an image: I can't draw that."
        );
    }

    #[test]
    fn test_provider_error_is_displayed_verbatim() {
        let err = Error::AiProvider("Gemini API error (status 429): quota".to_string());
        assert_eq!(err.to_string(), "Gemini API error (status 429): quota");
    }
}
