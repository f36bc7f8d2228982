//! Image attachments: picked file -> base64 payload + media type.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use shared::chat::EncodedImage;
use shared::errors::AttachmentError;
use std::path::Path;

/// Media types the model accepts inline.
fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        _ => None,
    }
}

/// Encode raw image bytes. The media type comes from the content, not from
/// any file name, and the image must actually decode.
pub fn encode_bytes(bytes: &[u8]) -> Result<EncodedImage, AttachmentError> {
    if bytes.is_empty() {
        return Err(AttachmentError::Empty);
    }
    let format = image::guess_format(bytes).map_err(|_| AttachmentError::UnsupportedFormat)?;
    let mime = mime_for(format).ok_or(AttachmentError::UnsupportedFormat)?;
    image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AttachmentError::Corrupt(e.to_string()))?;

    Ok(EncodedImage::new(mime, STANDARD.encode(bytes)))
}

pub fn encode_file(path: &Path) -> Result<EncodedImage, AttachmentError> {
    let bytes = std::fs::read(path).map_err(|source| AttachmentError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    encode_bytes(&bytes)
}

/// Original bytes of an encoded image.
pub fn decode(image: &EncodedImage) -> Result<Vec<u8>, AttachmentError> {
    image.to_bytes()
}

/// Pixels for on-screen preview.
pub fn decode_rgba(image: &EncodedImage) -> Result<image::RgbaImage, AttachmentError> {
    let bytes = decode(image)?;
    let img = image::load_from_memory(&bytes).map_err(|e| AttachmentError::Corrupt(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// An encoded image waiting in the input area, with a label for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub image: EncodedImage,
    pub label: String,
}

/// At most one attachment, owned by the input area.
#[derive(Debug, Clone, Default)]
pub struct PendingAttachment {
    slot: Option<Attachment>,
}

impl PendingAttachment {
    /// Replaces whatever was attached before.
    pub fn set(&mut self, attachment: Attachment) {
        self.slot = Some(attachment);
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn take(&mut self) -> Option<Attachment> {
        self.slot.take()
    }

    pub fn get(&self) -> Option<&Attachment> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
