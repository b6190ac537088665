//! Decoding of encoded still images into analysis frames.
//!
//! Frames arrive either as raw encoded bytes (PNG, JPEG, ...) or as base64
//! text, optionally wrapped in a data URL such as
//! `data:image/jpeg;base64,/9j/4AAQ...`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

/// Why an encoded frame could not be turned into pixels.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,
    #[error("payload is neither a recognised image format nor base64 text")]
    NotText,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode raw image bytes, base64 text or a data URL into an RGB frame.
pub fn decode_frame(data: &[u8]) -> Result<RgbImage, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }

    if image::guess_format(data).is_ok() {
        return decode_image_bytes(data);
    }

    let text = std::str::from_utf8(data).map_err(|_| DecodeError::NotText)?;
    decode_base64_frame(text)
}

/// Decode base64 text, with or without a `data:` URL prefix.
pub fn decode_base64_frame(text: &str) -> Result<RgbImage, DecodeError> {
    let text = text.trim();
    let payload = match text.split_once("base64,") {
        Some((_, payload)) => payload,
        None => text,
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD.decode(cleaned)?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    decode_image_bytes(&bytes)
}

/// Encode a frame as a PNG data URL.
pub fn encode_png_data_url(image: &RgbImage) -> Result<String, DecodeError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(buffer.into_inner())
    ))
}

fn decode_image_bytes(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}
