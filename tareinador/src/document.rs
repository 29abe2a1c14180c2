//! Document model for generated academic documents
//!
//! Mirrors the JSON the backend returns from `/api/document/{id}`. Only the
//! fields the client works with are required; the rest of the metadata is
//! kept as read-only optional values.

use serde::{Deserialize, Serialize};

/// A generated document: ordered pages plus the metadata entered in the form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Backend identifier (may be absent in older payloads, the id returned
    /// by `/api/generate` is authoritative)
    #[serde(default)]
    pub id: String,

    /// Document title, fixed at generation time
    #[serde(default)]
    pub title: String,

    /// Pages in reading/print order
    #[serde(default)]
    pub pages: Vec<Page>,

    /// Student name
    #[serde(default)]
    pub author: Option<String>,

    /// Student identifier
    #[serde(default)]
    pub carnet: Option<String>,

    /// Generation date as formatted by the backend
    #[serde(default)]
    pub date: Option<String>,

    /// University shown on the cover page
    #[serde(default)]
    pub universidad: Option<String>,

    /// Campus shown on the cover page
    #[serde(default)]
    pub centro: Option<String>,

    /// Degree program
    #[serde(default)]
    pub carrera: Option<String>,

    /// Teacher name
    #[serde(default)]
    pub docente: Option<String>,

    /// Course name shown on the cover page
    #[serde(default)]
    pub materia: Option<String>,

    #[serde(default)]
    pub semestre: Option<String>,

    /// Location and date line
    #[serde(default)]
    pub sede: Option<String>,

    /// Whether a cover page was requested
    #[serde(default, rename = "includeCaratula")]
    pub include_caratula: Option<bool>,

    /// Whether an index page was requested
    #[serde(default, rename = "includeIndice")]
    pub include_indice: Option<bool>,
}

impl Document {
    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of images across all pages
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }

    /// Approximate word count of all page bodies
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(Page::word_count).sum()
    }
}

/// A single page of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page kind assigned by the generator (cover, index, section slug)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Display heading
    #[serde(default)]
    pub title: String,

    /// HTML fragment without the heading or image blocks
    #[serde(default)]
    pub content: String,

    /// Images in display order
    #[serde(default)]
    pub images: Vec<Image>,
}

impl Page {
    /// Create a page without a kind or images
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: None,
            title: title.into(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Approximate word count of the page body with markup removed
    pub fn word_count(&self) -> usize {
        strip_tags(&self.content).split_whitespace().count()
    }
}

/// An image attached to a page; the binary lives on the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Backend URL of the image
    pub url: String,

    /// Optional caption; the backend sends an empty string for "no caption"
    #[serde(default, deserialize_with = "empty_as_none")]
    pub caption: Option<String>,
}

impl Image {
    /// Build an image reference, normalizing an empty caption to `None`
    pub fn new(url: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            url: url.into(),
            caption: caption.filter(|c| !c.is_empty()),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|c| !c.is_empty()))
}

/// Remove anything between `<` and `>` (good enough for word counts)
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
