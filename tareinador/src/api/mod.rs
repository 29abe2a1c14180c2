//! Backend access for document generation and editing
//!
//! Every operation is a single blocking request/response call:
//! - JSON bodies for generation and page edits
//! - multipart for image uploads
//! - raw text (preview) and bytes (PDF) for output
//!
//! `DocumentBackend` is the seam the controller talks to; `HttpBackend` is
//! the implementation used by the binary.

mod error;
mod http;

#[cfg(test)]
pub(crate) mod fake;

pub use error::{ApiError, Result};
pub use http::HttpBackend;

use crate::document::{Document, Image};
use crate::form::DocumentForm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Operations offered by the document backend
pub trait DocumentBackend {
    /// Create a new document from the form, returning its id
    fn generate(&self, form: &DocumentForm) -> Result<String>;

    /// Fetch the full document body
    fn fetch_document(&self, doc_id: &str) -> Result<Document>;

    /// Rewrite a page with the AI service, returning the new content
    fn edit_page(&self, doc_id: &str, page_index: usize, instructions: &str) -> Result<String>;

    /// Store manually edited content for a page
    fn update_page(&self, doc_id: &str, page_index: usize, content: &str) -> Result<()>;

    /// Upload an image and attach it to a page
    fn upload_image(
        &self,
        doc_id: &str,
        page_index: usize,
        upload: &ImageUpload,
        caption: &str,
    ) -> Result<Image>;

    /// Remove an image from a page
    fn remove_image(&self, doc_id: &str, page_index: usize, image_index: usize) -> Result<()>;

    /// Rendered HTML of the whole document
    fn preview_html(&self, doc_id: &str) -> Result<String>;

    /// Rendered PDF of the whole document
    fn download_pdf(&self, doc_id: &str) -> Result<Vec<u8>>;
}

/// Backend operation, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Generate,
    FetchDocument,
    EditPage,
    SavePage,
    UploadImage,
    RemoveImage,
    Preview,
    Download,
}

impl Operation {
    /// Message shown when the backend gives no error text of its own
    pub fn default_message(self) -> &'static str {
        match self {
            Operation::Generate => "Failed to generate the document",
            Operation::FetchDocument => "Document not found",
            Operation::EditPage => "Failed to edit the page",
            Operation::SavePage => "Failed to save the page",
            Operation::UploadImage => "Failed to upload the image",
            Operation::RemoveImage => "Failed to remove the image",
            Operation::Preview => "Failed to load the preview",
            Operation::Download => "Failed to generate the PDF",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Generate => "generate",
            Operation::FetchDocument => "fetch document",
            Operation::EditPage => "AI edit",
            Operation::SavePage => "save page",
            Operation::UploadImage => "upload image",
            Operation::RemoveImage => "remove image",
            Operation::Preview => "preview",
            Operation::Download => "download",
        };
        f.write_str(name)
    }
}

/// An image file ready to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Original file name, its extension is kept by the backend
    pub file_name: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Wrap in-memory image bytes
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an image file from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image.png")
            .to_string();
        Ok(Self { file_name, bytes })
    }

    /// MIME type derived from the file extension
    pub fn mime_type(&self) -> &'static str {
        let extension = Path::new(&self.file_name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            "svg" => "image/svg+xml",
            "bmp" => "image/bmp",
            _ => "application/octet-stream",
        }
    }

    /// Pixel dimensions, if the bytes are a recognizable raster image
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        imagesize::blob_size(&self.bytes)
            .map(|size| (size.width, size.height))
            .ok()
    }
}

/// Response of `/api/generate`
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    pub doc_id: String,
}

/// Body of `/api/edit-page`
#[derive(Debug, Serialize)]
pub(crate) struct EditPageRequest<'a> {
    pub doc_id: &'a str,
    pub page_index: usize,
    pub instructions: &'a str,
}

/// Response of `/api/edit-page`
#[derive(Debug, Deserialize)]
pub(crate) struct EditPageResponse {
    pub content: String,
}

/// Body of `/api/update-page`
#[derive(Debug, Serialize)]
pub(crate) struct UpdatePageRequest<'a> {
    pub doc_id: &'a str,
    pub page_index: usize,
    pub content: &'a str,
}

/// Response of `/api/upload-image`
#[derive(Debug, Deserialize)]
pub(crate) struct UploadImageResponse {
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Body of `/api/remove-image`
#[derive(Debug, Serialize)]
pub(crate) struct RemoveImageRequest<'a> {
    pub doc_id: &'a str,
    pub page_index: usize,
    pub image_index: usize,
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(ImageUpload::new("foto.JPG", vec![]).mime_type(), "image/jpeg");
        assert_eq!(ImageUpload::new("diagrama.png", vec![]).mime_type(), "image/png");
        assert_eq!(
            ImageUpload::new("sin-extension", vec![]).mime_type(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_dimensions_of_non_image() {
        let upload = ImageUpload::new("notas.png", b"not an image".to_vec());
        assert_eq!(upload.dimensions(), None);
    }

    #[test]
    fn test_dimensions_of_png_header() {
        // 8-byte signature + IHDR chunk announcing a 3x2 image
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0, 0, 0, 13]);
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&3u32.to_be_bytes());
        png.extend_from_slice(&2u32.to_be_bytes());
        png.extend_from_slice(&[8, 6, 0, 0, 0]);
        png.extend_from_slice(&[0, 0, 0, 0]);

        let upload = ImageUpload::new("x.png", png);
        assert_eq!(upload.dimensions(), Some((3, 2)));
    }

    #[test]
    fn test_request_bodies_match_wire_format() {
        let body = serde_json::to_value(EditPageRequest {
            doc_id: "ab12cd34",
            page_index: 2,
            instructions: "make it formal",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"doc_id": "ab12cd34", "page_index": 2, "instructions": "make it formal"})
        );

        let body = serde_json::to_value(RemoveImageRequest {
            doc_id: "ab12cd34",
            page_index: 0,
            image_index: 1,
        })
        .unwrap();
        assert_eq!(body["image_index"], 1);
    }

    #[test]
    fn test_upload_response_empty_caption() {
        let response: UploadImageResponse =
            serde_json::from_str(r#"{"image_url": "/uploads/1a2b.png", "caption": ""}"#).unwrap();
        let image = Image::new(response.image_url, response.caption);
        assert_eq!(image.caption, None);
    }
}
