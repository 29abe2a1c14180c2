//! In-memory backend for tests
//!
//! Builds pages the way the generator does (cover, index, then each section
//! split into its requested number of pages) and keeps every document in a
//! map so tests can check what was persisted.

use super::{ApiError, DocumentBackend, ImageUpload, Operation, Result};
use crate::document::{Document, Image, Page};
use crate::form::DocumentForm;
use std::cell::RefCell;
use std::collections::HashMap;

pub(crate) struct FakeBackend {
    pub(crate) documents: RefCell<HashMap<String, Document>>,
    pub(crate) calls: RefCell<Vec<Operation>>,
    pub(crate) failing: RefCell<Vec<Operation>>,
    pub(crate) edit_reply: RefCell<String>,
    pub(crate) empty_documents: bool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            documents: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(Vec::new()),
            edit_reply: RefCell::new("<p>Formal text</p>".to_string()),
            empty_documents: false,
        }
    }
}

impl FakeBackend {
    /// Make every later call of `operation` fail
    pub(crate) fn fail(&self, operation: Operation) {
        self.failing.borrow_mut().push(operation);
    }

    pub(crate) fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    pub(crate) fn calls(&self) -> Vec<Operation> {
        self.calls.borrow().clone()
    }

    // Uploads fail like a dropped connection (no backend message), the
    // rest like a backend error with a message.
    fn enter(&self, operation: Operation) -> Result<()> {
        self.calls.borrow_mut().push(operation);
        if self.failing.borrow().contains(&operation) {
            return Err(match operation {
                Operation::UploadImage => ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
                _ => ApiError::Server {
                    status: 500,
                    message: Some(format!("{} exploded", operation)),
                },
            });
        }
        Ok(())
    }

    fn with_page<T>(
        &self,
        doc_id: &str,
        page_index: usize,
        f: impl FnOnce(&mut Page) -> Result<T>,
    ) -> Result<T> {
        let mut documents = self.documents.borrow_mut();
        let page = documents
            .get_mut(doc_id)
            .and_then(|doc| doc.pages.get_mut(page_index))
            .ok_or(ApiError::Server {
                status: 404,
                message: Some("Página no encontrada".to_string()),
            })?;
        f(page)
    }
}

impl DocumentBackend for FakeBackend {
    fn generate(&self, form: &DocumentForm) -> Result<String> {
        self.enter(Operation::Generate)?;

        let mut pages = Vec::new();
        if !self.empty_documents {
            if form.include_caratula {
                pages.push(Page {
                    kind: Some("caratula".to_string()),
                    ..Page::new("Carátula", "")
                });
            }
            if form.include_indice {
                pages.push(Page {
                    kind: Some("indice".to_string()),
                    ..Page::new("Índice", "<ol><li>Intro</li></ol>")
                });
            }
            for section in &form.sections {
                for n in 1..=section.pages {
                    let title = if section.pages > 1 {
                        format!("{} ({}/{})", section.name, n, section.pages)
                    } else {
                        section.name.clone()
                    };
                    pages.push(Page::new(title, format!("<p>{}</p>", section.description)));
                }
            }
        }

        let mut documents = self.documents.borrow_mut();
        let doc_id = format!("doc-{}", documents.len() + 1);
        documents.insert(
            doc_id.clone(),
            Document {
                id: doc_id.clone(),
                title: form.title.clone(),
                pages,
                author: Some(form.author.clone()),
                materia: Some(form.materia.clone()),
                include_caratula: Some(form.include_caratula),
                include_indice: Some(form.include_indice),
                ..Document::default()
            },
        );
        Ok(doc_id)
    }

    fn fetch_document(&self, doc_id: &str) -> Result<Document> {
        self.enter(Operation::FetchDocument)?;
        self.documents
            .borrow()
            .get(doc_id)
            .cloned()
            .ok_or(ApiError::Server {
                status: 404,
                message: None,
            })
    }

    fn edit_page(&self, doc_id: &str, page_index: usize, _instructions: &str) -> Result<String> {
        self.enter(Operation::EditPage)?;
        let reply = self.edit_reply.borrow().clone();
        self.with_page(doc_id, page_index, |page| {
            page.content = reply.clone();
            Ok(reply)
        })
    }

    fn update_page(&self, doc_id: &str, page_index: usize, content: &str) -> Result<()> {
        self.enter(Operation::SavePage)?;
        self.with_page(doc_id, page_index, |page| {
            page.content = content.to_string();
            Ok(())
        })
    }

    fn upload_image(
        &self,
        doc_id: &str,
        page_index: usize,
        upload: &ImageUpload,
        caption: &str,
    ) -> Result<Image> {
        self.enter(Operation::UploadImage)?;
        self.with_page(doc_id, page_index, |page| {
            let image = Image::new(
                format!("/uploads/{}-{}", page.images.len(), upload.file_name),
                Some(caption.to_string()),
            );
            page.images.push(image.clone());
            Ok(image)
        })
    }

    fn remove_image(&self, doc_id: &str, page_index: usize, image_index: usize) -> Result<()> {
        self.enter(Operation::RemoveImage)?;
        self.with_page(doc_id, page_index, |page| {
            if image_index >= page.images.len() {
                return Err(ApiError::Server {
                    status: 404,
                    message: Some("Imagen no encontrada".to_string()),
                });
            }
            page.images.remove(image_index);
            Ok(())
        })
    }

    fn preview_html(&self, doc_id: &str) -> Result<String> {
        self.enter(Operation::Preview)?;
        Ok(format!("<html><body>{}</body></html>", doc_id))
    }

    fn download_pdf(&self, _doc_id: &str) -> Result<Vec<u8>> {
        self.enter(Operation::Download)?;
        Ok(b"%PDF-1.4 fake".to_vec())
    }
}
