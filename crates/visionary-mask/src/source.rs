//! Source image decoding.
//!
//! The user's file is decoded once to validate it and read its natural
//! size. Only the original bytes are kept afterwards: they are what the
//! remote API receives, and the browser displays them directly.

use crate::types::{Dimensions, LoadError};

/// MIME type used when the format cannot be sniffed.
const FALLBACK_MIME: &str = "application/octet-stream";

/// A user-selected file, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Name of the file as picked by the user.
    pub filename: String,
}

impl Upload {
    /// Wrap raw bytes and a filename.
    #[must_use]
    pub fn new(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
        }
    }
}

/// A decoded, validated source image.
///
/// Immutable once loaded. Replaced wholesale on the next upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    upload: Upload,
    dimensions: Dimensions,
    mime: &'static str,
}

impl SourceImage {
    /// Decode `upload` and record its natural size.
    ///
    /// Supports whatever the `image` crate is built with (PNG, JPEG, BMP,
    /// WebP).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::EmptyInput`] if the file is empty,
    /// [`LoadError::ImageDecode`] if it is not a decodable image, and
    /// [`LoadError::ZeroSize`] if it decodes to a 0-pixel image.
    pub fn decode(upload: Upload) -> Result<Self, LoadError> {
        if upload.bytes.is_empty() {
            return Err(LoadError::EmptyInput);
        }

        let format = image::guess_format(&upload.bytes)?;
        let img = image::load_from_memory_with_format(&upload.bytes, format)?;
        let dimensions = Dimensions::new(img.width(), img.height());
        if dimensions.is_empty() {
            return Err(LoadError::ZeroSize(dimensions));
        }

        let mime = format.to_mime_type();
        Ok(Self {
            upload,
            dimensions,
            mime: if mime.is_empty() { FALLBACK_MIME } else { mime },
        })
    }

    /// Natural pixel size.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Original file bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.upload.bytes
    }

    /// Original filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.upload.filename
    }

    /// MIME type sniffed from the content.
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        self.mime
    }
}

/// Identifies one file read started by [`LoadTickets::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Issues [`LoadTicket`]s so that only the newest file read is accepted.
///
/// File reads finish in any order. Each pick takes a ticket; a read that
/// finishes holding an older ticket is stale and its bytes are dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadTickets {
    issued: u64,
}

impl LoadTickets {
    /// Start a new read. Every earlier ticket becomes stale.
    pub const fn issue(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Whether `ticket` belongs to the newest read.
    #[must_use]
    pub const fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Make every outstanding ticket stale without starting a new read.
    pub const fn invalidate(&mut self) {
        self.issued += 1;
    }
}
