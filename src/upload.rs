//! Uploaded image handling: format resolution and RGB/JPEG normalization
//! ahead of label detection.

use std::{fmt, io::Cursor, path::Path};

use image::{DynamicImage, ImageOutputFormat};

pub const JPEG_QUALITY: u8 = 85;

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("unsupported image type: {0}")]
    UnsupportedFormat(String),
    #[error("image decode error: {0}")]
    Decode(#[source] image::ImageError),
    #[error("image encode error: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image normalization task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

/// Formats accepted by the upload form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub const ACCEPTED_EXTENSIONS: [&'static str; 4] = ["jpg", "jpeg", "png", "webp"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Extension wins; the MIME type is only consulted when the file name
    /// carries no extension at all.
    pub fn detect(file_name: Option<&str>, mime: Option<&str>) -> Result<Self, NormalizeError> {
        let ext = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str());

        let format = match ext {
            Some(ext) => Self::from_extension(ext),
            None => mime.and_then(Self::from_mime),
        };

        format.ok_or_else(|| {
            NormalizeError::UnsupportedFormat(
                ext.or(mime)
                    .or(file_name)
                    .unwrap_or("unknown")
                    .to_string(),
            )
        })
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("jpeg"),
            Self::Png => f.write_str("png"),
            Self::Webp => f.write_str("webp"),
        }
    }
}

/// Raw bytes received from the form, dropped once the request completes.
#[derive(Clone)]
pub struct UploadedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormat, file_name: Option<String>) -> Self {
        Self {
            bytes,
            format,
            file_name,
        }
    }
}

impl fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedImage")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// RGB JPEG re-encoding of an upload, the only form handed to the vision
/// service.
#[derive(Clone)]
pub struct NormalizedImageBuffer {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

impl NormalizedImageBuffer {
    pub fn from_upload(upload: &UploadedImage) -> Result<Self, NormalizeError> {
        // the declared format only gates acceptance; decoding sniffs content
        let decoded = image::load_from_memory(&upload.bytes).map_err(NormalizeError::Decode)?;

        // alpha is discarded, not composited
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut jpeg), ImageOutputFormat::Jpeg(JPEG_QUALITY))
            .map_err(NormalizeError::Encode)?;

        Ok(Self {
            jpeg,
            width,
            height,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.jpeg
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Debug for NormalizedImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedImageBuffer")
            .field("len", &self.jpeg.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
