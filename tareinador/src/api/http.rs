//! Blocking HTTP implementation of the document backend

use super::{
    ApiError, DocumentBackend, EditPageRequest, EditPageResponse, ErrorBody, GenerateResponse,
    ImageUpload, RemoveImageRequest, Result, UpdatePageRequest, UploadImageResponse,
};
use crate::config::ClientConfig;
use crate::document::{Document, Image};
use crate::form::DocumentForm;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::Url;
use serde::Serialize;
use std::time::Duration;

/// Client for the document backend's REST API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// Base URL without a trailing slash
    base_url: String,
    /// HTTP client
    client: Client,
}

impl HttpBackend {
    /// Create a backend client from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_url(&config.api_base, config.timeout())
    }

    /// Create a backend client for a base URL and request timeout
    pub fn with_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of an endpoint; each segment is percent-encoded, so a document
    /// id can never change the route
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<Response> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        check_status(response)
    }

    fn post_json<T: Serialize + ?Sized>(&self, segments: &[&str], body: &T) -> Result<Response> {
        let url = self.endpoint(segments)?;
        log::debug!("POST {}", url);
        let response = self.client.post(url).json(body).send()?;
        check_status(response)
    }
}

/// Turn a non-2xx response into `ApiError::Server`, keeping the backend's
/// `error` text when the body carries one
fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty());

    log::debug!("Backend returned {}: {}", status, body);

    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

impl DocumentBackend for HttpBackend {
    fn generate(&self, form: &DocumentForm) -> Result<String> {
        let response = self.post_json(&["api", "generate"], form)?;
        let generated: GenerateResponse = decode(response)?;
        Ok(generated.doc_id)
    }

    fn fetch_document(&self, doc_id: &str) -> Result<Document> {
        let response = self.get(&["api", "document", doc_id])?;
        decode(response)
    }

    fn edit_page(&self, doc_id: &str, page_index: usize, instructions: &str) -> Result<String> {
        let response = self.post_json(
            &["api", "edit-page"],
            &EditPageRequest {
                doc_id,
                page_index,
                instructions,
            },
        )?;
        let edited: EditPageResponse = decode(response)?;
        Ok(edited.content)
    }

    fn update_page(&self, doc_id: &str, page_index: usize, content: &str) -> Result<()> {
        self.post_json(
            &["api", "update-page"],
            &UpdatePageRequest {
                doc_id,
                page_index,
                content,
            },
        )?;
        Ok(())
    }

    fn upload_image(
        &self,
        doc_id: &str,
        page_index: usize,
        upload: &ImageUpload,
        caption: &str,
    ) -> Result<Image> {
        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime_type())?;

        let form = multipart::Form::new()
            .text("doc_id", doc_id.to_string())
            .text("page_index", page_index.to_string())
            .part("image", part)
            .text("caption", caption.to_string());

        let url = self.endpoint(&["api", "upload-image"])?;
        log::debug!("POST {} ({} bytes)", url, upload.bytes.len());
        let response = check_status(self.client.post(url).multipart(form).send()?)?;

        let uploaded: UploadImageResponse = decode(response)?;
        Ok(Image::new(uploaded.image_url, uploaded.caption))
    }

    fn remove_image(&self, doc_id: &str, page_index: usize, image_index: usize) -> Result<()> {
        self.post_json(
            &["api", "remove-image"],
            &RemoveImageRequest {
                doc_id,
                page_index,
                image_index,
            },
        )?;
        Ok(())
    }

    fn preview_html(&self, doc_id: &str) -> Result<String> {
        let response = self.get(&["api", "preview", doc_id])?;
        Ok(response.text()?)
    }

    fn download_pdf(&self, doc_id: &str) -> Result<Vec<u8>> {
        let response = self.get(&["api", "download", doc_id])?;
        Ok(response.bytes()?.to_vec())
    }
}
