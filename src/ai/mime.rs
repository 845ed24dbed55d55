//! Media-type helpers for image payloads: sniffing, data-URI decomposition
//! and download file extensions.

use crate::{Error, Result};
use base64::Engine as _;
use image::ImageFormat;

/// Media type assumed when a payload carries no usable type tag.
pub const DEFAULT_MEDIA_TYPE: &str = "image/png";

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                DEFAULT_MEDIA_TYPE
            );
            DEFAULT_MEDIA_TYPE
        }
    }
}

/// File extension to use when saving a payload of the given media type.
pub fn extension_for(media_type: &str) -> &'static str {
    ImageFormat::from_mime_type(media_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("png")
}

/// Split a transport-encoded image string into `(media_type, bytes)`.
///
/// Accepts `data:<type>;base64,<data>` URIs, percent-encoded `data:<type>,<data>`
/// URIs and bare base64. The media type falls back to [`DEFAULT_MEDIA_TYPE`]
/// when the tag is absent or malformed; only undecodable data is an error.
pub fn split_data_uri(encoded: &str) -> Result<(String, Vec<u8>)> {
    let encoded = encoded.trim();

    let (media_type, data, is_base64) = match encoded.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                Error::InvalidPayload("data URI is missing the ',' separator".to_string())
            })?;
            let mut params = header.split(';');
            let tag = params.next().unwrap_or_default();
            let is_base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));
            (media_type_from_tag(tag), data, is_base64)
        }
        None => (None, encoded, true),
    };

    let media_type = media_type.unwrap_or_else(|| {
        tracing::debug!("No media type tag on payload, assuming {}", DEFAULT_MEDIA_TYPE);
        DEFAULT_MEDIA_TYPE.to_string()
    });

    let bytes = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| Error::InvalidPayload(format!("Failed to decode base64 image: {}", e)))?
    } else {
        percent_decode(data)?
    };

    Ok((media_type, bytes))
}

/// Decode the `%XX` escapes of a non-base64 data URI body.
fn percent_decode(data: &str) -> Result<Vec<u8>> {
    let raw = data.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let escape = raw
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| {
                    Error::InvalidPayload(format!("Invalid percent escape at offset {}", i))
                })?;
            bytes.push(escape);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    Ok(bytes)
}

fn media_type_from_tag(tag: &str) -> Option<String> {
    let (kind, subtype) = tag.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
    };
    (valid(kind) && valid(subtype)).then(|| tag.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_detect_png() {
        assert_eq!(detect_image_mime(&PNG_SIGNATURE), "image/png");
    }

    #[test]
    fn test_detect_jpeg() {
        assert_eq!(detect_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
    }

    #[test]
    fn test_unknown_falls_back_to_png() {
        assert_eq!(detect_image_mime(&[0x00, 0x01, 0x02, 0x03]), "image/png");
    }

    #[test]
    fn test_empty_falls_back_to_png() {
        assert_eq!(detect_image_mime(&[]), "image/png");
    }

    #[test]
    fn test_extension_for_known_and_unknown_types() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("application/octet-stream"), "png");
    }

    #[test]
    fn test_split_data_uri_reads_type_tag() {
        let (media_type, bytes) = split_data_uri("data:image/jpeg;base64,AQID").unwrap();
        assert_eq!(media_type, "image/jpeg");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_split_data_uri_defaults_when_tag_missing() {
        let (media_type, bytes) = split_data_uri("data:;base64,AQID").unwrap();
        assert_eq!(media_type, DEFAULT_MEDIA_TYPE);
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_split_data_uri_defaults_when_tag_malformed() {
        let (media_type, _) = split_data_uri("data:not a type;base64,AQID").unwrap();
        assert_eq!(media_type, DEFAULT_MEDIA_TYPE);
    }

    #[test]
    fn test_split_bare_base64() {
        let (media_type, bytes) = split_data_uri("AQID").unwrap();
        assert_eq!(media_type, DEFAULT_MEDIA_TYPE);
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_split_rejects_invalid_base64() {
        let err = split_data_uri("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_split_percent_encoded_data_uri() {
        let (media_type, bytes) = split_data_uri("data:image/svg+xml,%3Csvg%2F%3E").unwrap();
        assert_eq!(media_type, "image/svg+xml");
        assert_eq!(bytes, b"<svg/>".to_vec());
    }

    #[test]
    fn test_split_rejects_truncated_percent_escape() {
        let err = split_data_uri("data:image/svg+xml,%3Csvg%2").unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_split_rejects_missing_separator() {
        let err = split_data_uri("data:image/png;base64").unwrap_err();
        assert!(matches!(err, Error::InvalidPayload(_)));
    }
}
