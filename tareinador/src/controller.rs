//! Client-side document state and its synchronization with the backend
//!
//! `DocumentController` owns the only client copy of a generated document.
//! Every mutation goes through the backend first and is applied locally only
//! after the backend accepted it, so a failed call never leaves a partial
//! change behind. Failures are recorded (`last_error`), reported to the
//! notifier, and returned.
//!
//! One mutating request is in flight at a time: every operation takes
//! `&mut self`, and the `loading` flag rejects re-entry with
//! `ControllerError::Busy`.

use crate::api::{ApiError, DocumentBackend, ImageUpload, Operation};
use crate::compose::{compose_page, extract_page, ExtractedPage};
use crate::document::{Document, Page};
use crate::form::{DocumentForm, FormError};
use crate::notify::{NoticeLevel, Notifier};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name used for downloads when the document has no title
pub const DEFAULT_FALLBACK_TITLE: &str = "tarea";

/// Errors reported by the controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("No active document")]
    NoDocument,

    #[error("Another operation is still in progress")]
    Busy,

    #[error("Page {index} is out of range (document has {len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("Image {index} is out of range (page has {len} images)")]
    ImageOutOfRange { index: usize, len: usize },

    #[error("The backend returned a document without pages")]
    EmptyDocument,

    #[error("Manual edit mode is not active")]
    NotEditing,

    #[error("{0}")]
    Form(#[from] FormError),

    /// A backend call failed; `message` is what the user sees
    #[error("{message}")]
    Failed {
        operation: Operation,
        message: String,
        #[source]
        source: ApiError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The document and page a request was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
struct PageTarget {
    doc_id: String,
    page_index: usize,
}

/// Owner of the client-side document state
pub struct DocumentController<B: DocumentBackend> {
    backend: B,
    notifier: Box<dyn Notifier>,
    doc_id: Option<String>,
    document: Option<Document>,
    current_page: usize,
    loading: bool,
    last_error: Option<String>,
    /// Markup being edited by hand; `Some` while manual edit mode is on
    edit_buffer: Option<String>,
    fallback_title: String,
}

impl<B: DocumentBackend> DocumentController<B> {
    /// Create a controller with no document
    pub fn new(backend: B, notifier: Box<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            doc_id: None,
            document: None,
            current_page: 0,
            loading: false,
            last_error: None,
            edit_buffer: None,
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
        }
    }

    /// Use a different fallback download name for untitled documents
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = title.into();
        self
    }

    // ─── State accessors ───

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn doc_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// The page currently shown, if a document is loaded
    pub fn page(&self) -> Option<&Page> {
        self.document
            .as_ref()
            .and_then(|doc| doc.pages.get(self.current_page))
    }

    pub fn page_count(&self) -> usize {
        self.document.as_ref().map_or(0, |doc| doc.pages.len())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some()
    }

    // ─── Generation & load ───

    /// Generate a new document from the form and load it
    ///
    /// Issues two calls (create, then fetch). The new document replaces any
    /// previous one only when both succeed; otherwise the previous state is
    /// kept.
    pub fn generate(&mut self, form: &DocumentForm) -> Result<(), ControllerError> {
        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => return Err(self.record(e.into())),
        };

        self.clear_error();
        self.notifier.notify(
            NoticeLevel::Info,
            &format!(
                "Generating \"{}\" ({} sections, ~{} pages)...",
                request.title,
                request.sections.len(),
                request.expected_page_count()
            ),
        );

        let doc_id = self.request(Operation::Generate, |b| b.generate(&request))?;
        log::info!("Backend created document {}", doc_id);

        let document = self.request(Operation::FetchDocument, |b| b.fetch_document(&doc_id))?;
        self.install(doc_id, document)?;

        self.notifier.notify(
            NoticeLevel::Success,
            &format!("Document generated with {} pages", self.page_count()),
        );
        Ok(())
    }

    /// Load an existing document by id, replacing the current state
    pub fn open(&mut self, doc_id: &str) -> Result<(), ControllerError> {
        self.clear_error();
        let document = self.request(Operation::FetchDocument, |b| b.fetch_document(doc_id))?;
        self.install(doc_id.to_string(), document)
    }

    /// Drop the current document from memory (nothing is deleted server-side)
    pub fn new_document(&mut self) {
        if let Some(id) = self.doc_id.take() {
            log::info!("Discarding document {}", id);
        }
        self.document = None;
        self.current_page = 0;
        self.edit_buffer = None;
        self.last_error = None;
    }

    fn install(&mut self, doc_id: String, mut document: Document) -> Result<(), ControllerError> {
        if document.pages.is_empty() {
            return Err(self.record(ControllerError::EmptyDocument));
        }
        if document.id.is_empty() {
            document.id = doc_id.clone();
        }

        log::info!(
            "Loaded document {} ({} pages, {} images)",
            doc_id,
            document.page_count(),
            document.image_count()
        );

        self.doc_id = Some(doc_id);
        self.document = Some(document);
        self.current_page = 0;
        self.edit_buffer = None;
        Ok(())
    }

    // ─── Page mutation ───

    /// Rewrite the current page's content with the AI service
    pub fn edit_with_ai(&mut self, instructions: &str) -> Result<(), ControllerError> {
        let target = self.target()?;
        self.notifier
            .notify(NoticeLevel::Info, "Editing page with AI...");

        let content = self.request(Operation::EditPage, |b| {
            b.edit_page(&target.doc_id, target.page_index, instructions)
        })?;

        if self.apply(&target, |page| page.content = content) && self.edit_buffer.take().is_some()
        {
            log::info!("Manual edit buffer dropped after AI edit");
        }
        self.notifier.notify(NoticeLevel::Success, "Page updated");
        Ok(())
    }

    /// Persist already-extracted content for the current page
    pub fn save_manual_content(&mut self, content: &str) -> Result<(), ControllerError> {
        let target = self.target()?;

        self.request(Operation::SavePage, |b| {
            b.update_page(&target.doc_id, target.page_index, content)
        })?;

        self.apply(&target, |page| page.content = content.to_string());
        self.notifier.notify(NoticeLevel::Success, "Changes saved");
        Ok(())
    }

    /// Upload an image and append it to the current page
    pub fn add_image(&mut self, upload: &ImageUpload, caption: &str) -> Result<(), ControllerError> {
        let target = self.target()?;

        match upload.dimensions() {
            Some((width, height)) => {
                log::debug!("Uploading {} ({}x{})", upload.file_name, width, height)
            }
            None => log::warn!(
                "Could not read dimensions for {}, uploading anyway",
                upload.file_name
            ),
        }

        let image = self.request(Operation::UploadImage, |b| {
            b.upload_image(&target.doc_id, target.page_index, upload, caption)
        })?;

        self.apply(&target, |page| page.images.push(image));
        self.notifier.notify(NoticeLevel::Success, "Image added");
        Ok(())
    }

    /// Remove an image from the current page, keeping the order of the rest
    pub fn delete_image(&mut self, image_index: usize) -> Result<(), ControllerError> {
        let target = self.target()?;

        let len = self.page().map_or(0, |page| page.images.len());
        if image_index >= len {
            return Err(self.record(ControllerError::ImageOutOfRange {
                index: image_index,
                len,
            }));
        }

        self.request(Operation::RemoveImage, |b| {
            b.remove_image(&target.doc_id, target.page_index, image_index)
        })?;

        self.apply(&target, |page| {
            if image_index < page.images.len() {
                page.images.remove(image_index);
            }
        });
        self.notifier.notify(NoticeLevel::Success, "Image removed");
        Ok(())
    }

    // ─── Manual edit session ───

    /// Enter manual edit mode, returning the composed markup to edit
    pub fn begin_manual_edit(&mut self) -> Result<String, ControllerError> {
        let markup = match self.page() {
            Some(page) => compose_page(page),
            None => return Err(self.record(ControllerError::NoDocument)),
        };
        self.edit_buffer = Some(markup.clone());
        Ok(markup)
    }

    /// Replace the markup being edited
    pub fn update_edit_buffer(&mut self, markup: impl Into<String>) -> Result<(), ControllerError> {
        match self.edit_buffer.as_mut() {
            Some(buffer) => {
                *buffer = markup.into();
                Ok(())
            }
            None => Err(self.record(ControllerError::NotEditing)),
        }
    }

    /// Extract the edited content and save it
    ///
    /// Edit mode is closed on success and stays open on failure so the edit
    /// can be retried.
    pub fn save_manual_edit(&mut self) -> Result<ExtractedPage, ControllerError> {
        let Some(markup) = self.edit_buffer.clone() else {
            return Err(self.record(ControllerError::NotEditing));
        };

        let extracted = extract_page(&markup);
        if let (Some(edited), Some(page)) = (extracted.title.as_deref(), self.page()) {
            if edited != page.title {
                log::warn!(
                    "Heading edited to \"{}\"; page titles are not saved by the backend",
                    edited
                );
            }
        }

        self.save_manual_content(&extracted.content)?;
        self.edit_buffer = None;
        Ok(extracted)
    }

    /// Leave manual edit mode without saving; returns whether it was active
    pub fn cancel_manual_edit(&mut self) -> bool {
        self.edit_buffer.take().is_some()
    }

    // ─── Navigation ───

    /// Make `index` the current page
    ///
    /// Leaving a page in manual edit mode discards the unsaved edit.
    pub fn set_current_page(&mut self, index: usize) -> Result<(), ControllerError> {
        let len = self.page_count();
        if self.document.is_none() {
            return Err(self.record(ControllerError::NoDocument));
        }
        if index >= len {
            return Err(self.record(ControllerError::PageOutOfRange { index, len }));
        }

        if index != self.current_page && self.edit_buffer.take().is_some() {
            log::info!(
                "Discarding unsaved manual edit of page {}",
                self.current_page + 1
            );
        }
        self.current_page = index;
        Ok(())
    }

    /// Move to the next page, staying put on the last one
    pub fn next_page(&mut self) -> Result<usize, ControllerError> {
        let next = (self.current_page + 1).min(self.page_count().saturating_sub(1));
        self.set_current_page(next)?;
        Ok(self.current_page)
    }

    /// Move to the previous page, staying put on the first one
    pub fn previous_page(&mut self) -> Result<usize, ControllerError> {
        let previous = self.current_page.saturating_sub(1);
        self.set_current_page(previous)?;
        Ok(self.current_page)
    }

    // ─── Output ───

    /// Rendered HTML of the whole document, as produced by the backend
    pub fn preview_html(&mut self) -> Result<String, ControllerError> {
        let doc_id = self.require_doc_id()?;
        self.request(Operation::Preview, |b| b.preview_html(&doc_id))
    }

    /// Download the PDF into `dir` as `<title>.pdf`, returning the path
    pub fn download(&mut self, dir: &Path) -> Result<PathBuf, ControllerError> {
        let doc_id = self.require_doc_id()?;
        self.notifier.notify(NoticeLevel::Info, "Generating PDF...");

        let bytes = self.request(Operation::Download, |b| b.download_pdf(&doc_id))?;

        let title = self.document.as_ref().map_or("", |doc| doc.title.as_str());
        let path = dir.join(pdf_file_name(title, &self.fallback_title));

        if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, &bytes)) {
            return Err(self.record(e.into()));
        }

        log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        self.notifier
            .notify(NoticeLevel::Success, &format!("Saved {}", path.display()));
        Ok(path)
    }

    // ─── Internals ───

    fn require_doc_id(&mut self) -> Result<String, ControllerError> {
        match self.doc_id.clone() {
            Some(id) if self.document.is_some() => Ok(id),
            _ => Err(self.record(ControllerError::NoDocument)),
        }
    }

    /// The page a page operation acts on
    ///
    /// Without a document, page operations are no-ops: the failure is
    /// returned but neither recorded nor notified.
    fn target(&self) -> Result<PageTarget, ControllerError> {
        match (&self.doc_id, &self.document) {
            (Some(doc_id), Some(_)) => Ok(PageTarget {
                doc_id: doc_id.clone(),
                page_index: self.current_page,
            }),
            _ => Err(ControllerError::NoDocument),
        }
    }

    /// Run one backend call under the single-flight guard
    fn request<T>(
        &mut self,
        operation: Operation,
        call: impl FnOnce(&B) -> Result<T, ApiError>,
    ) -> Result<T, ControllerError> {
        if self.loading {
            return Err(self.record(ControllerError::Busy));
        }

        self.loading = true;
        let result = call(&self.backend);
        self.loading = false;

        result.map_err(|source| {
            let message = source
                .backend_message()
                .unwrap_or_else(|| operation.default_message())
                .to_string();
            if source.is_timeout() {
                log::warn!("{} timed out", operation);
            } else {
                log::warn!("{} failed: {}", operation, source);
            }
            self.record(ControllerError::Failed {
                operation,
                message,
                source,
            })
        })
    }

    /// Apply a confirmed change to the page it was requested for
    ///
    /// Returns false (and changes nothing) when that page is no longer part
    /// of the loaded document.
    fn apply(&mut self, target: &PageTarget, change: impl FnOnce(&mut Page)) -> bool {
        if self.doc_id.as_deref() != Some(target.doc_id.as_str()) {
            log::warn!("Dropping response for document {}", target.doc_id);
            return false;
        }
        match self
            .document
            .as_mut()
            .and_then(|doc| doc.pages.get_mut(target.page_index))
        {
            Some(page) => {
                change(page);
                true
            }
            None => {
                log::warn!("Dropping response for missing page {}", target.page_index);
                false
            }
        }
    }

    fn record(&mut self, error: ControllerError) -> ControllerError {
        let message = error.to_string();
        self.notifier.notify(NoticeLevel::Error, &message);
        self.last_error = Some(message);
        error
    }
}

/// Download file name for a document title
///
/// Characters that are not allowed in file names are replaced by `_`.
pub fn pdf_file_name(title: &str, fallback: &str) -> String {
    let title = title.trim();
    let base = if title.is_empty() { fallback } else { title };
    let sanitized: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}.pdf", sanitized)
}
