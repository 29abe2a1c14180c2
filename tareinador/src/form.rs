//! Generation form loaded from a form TOML file
//!
//! The form carries everything the backend needs to generate a document:
//! cover-page metadata, student data, and the ordered list of sections.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default number of pages for a section when none is given
const DEFAULT_SECTION_PAGES: u32 = 1;

/// The document generation form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentForm {
    /// University name (cover page)
    #[serde(default)]
    pub universidad: String,

    /// University campus (cover page)
    #[serde(default)]
    pub centro: String,

    /// Degree program (cover page)
    #[serde(default)]
    pub carrera: String,

    /// Teacher name, optional on the cover page
    #[serde(default)]
    pub docente: String,

    /// Course name
    #[serde(default)]
    pub materia: String,

    /// Semester label
    #[serde(default)]
    pub semestre: String,

    /// Location and date line
    #[serde(default)]
    pub sede: String,

    /// Student full name
    #[serde(default)]
    pub author: String,

    /// Student identifier
    #[serde(default)]
    pub carnet: String,

    /// Title of the assignment
    pub title: String,

    /// Generate a cover page
    #[serde(default = "default_true", rename = "includeCaratula", alias = "include_caratula")]
    pub include_caratula: bool,

    /// Generate an index page
    #[serde(default = "default_true", rename = "includeIndice", alias = "include_indice")]
    pub include_indice: bool,

    /// Ordered sections to generate
    #[serde(default)]
    pub sections: Vec<SectionRequest>,
}

/// One section of the document to generate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRequest {
    /// Section name, also the page title
    pub name: String,

    /// What the section should cover
    #[serde(default)]
    pub description: String,

    /// Number of pages to generate for this section
    #[serde(default = "default_pages")]
    pub pages: u32,
}

impl SectionRequest {
    /// Create a section request
    pub fn new(name: impl Into<String>, description: impl Into<String>, pages: u32) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            pages,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pages() -> u32 {
    DEFAULT_SECTION_PAGES
}

impl DocumentForm {
    /// Load a form from a TOML file
    ///
    /// # Parameters
    /// * `path` - Path to the form file
    ///
    /// # Returns
    /// * `Ok(DocumentForm)` - Successfully loaded form
    /// * `Err(FormError)` - Error reading or parsing the form file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, FormError> {
        let content = fs::read_to_string(&path).map_err(FormError::IoError)?;

        let form: DocumentForm = toml::from_str(&content).map_err(FormError::ParseError)?;

        Ok(form)
    }

    /// Save the form to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), FormError> {
        let content = toml::to_string_pretty(self).map_err(FormError::SerializeError)?;

        fs::write(&path, content).map_err(FormError::IoError)?;

        Ok(())
    }

    /// Sections with a non-empty name, in form order
    pub fn valid_sections(&self) -> Vec<SectionRequest> {
        self.sections
            .iter()
            .filter(|s| !s.name.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Build the request body sent to the backend
    ///
    /// Sections with an empty name are dropped and a zero page count is
    /// raised to one.
    ///
    /// # Returns
    /// * `Ok(DocumentForm)` - Copy of the form containing only valid sections
    /// * `Err(FormError::NoSections)` - No section has a name
    pub fn to_request(&self) -> Result<DocumentForm, FormError> {
        let sections: Vec<SectionRequest> = self
            .valid_sections()
            .into_iter()
            .map(|s| SectionRequest {
                name: s.name.trim().to_string(),
                pages: s.pages.max(1),
                ..s
            })
            .collect();

        if sections.is_empty() {
            return Err(FormError::NoSections);
        }

        Ok(DocumentForm {
            sections,
            ..self.clone()
        })
    }

    /// Number of pages the backend is expected to produce
    pub fn expected_page_count(&self) -> usize {
        let section_pages: usize = self
            .valid_sections()
            .iter()
            .map(|s| s.pages.max(1) as usize)
            .sum();
        section_pages + usize::from(self.include_caratula) + usize::from(self.include_indice)
    }

    /// A starter form with one placeholder section
    pub fn starter(title: Option<&str>) -> Self {
        Self {
            universidad: "Universidad Mariano Gálvez de Guatemala".to_string(),
            centro: "Centro Universitario de Santa Rosa".to_string(),
            carrera: "Ingeniería en Sistemas".to_string(),
            title: title.unwrap_or("Título del trabajo").to_string(),
            include_caratula: true,
            include_indice: true,
            sections: vec![
                SectionRequest::new("Introducción", "Presentación general del tema", 1),
                SectionRequest::new("Desarrollo", "", 2),
                SectionRequest::new("Conclusiones", "", 1),
            ],
            ..Self::default()
        }
    }
}

/// Errors that can occur when loading, saving, or preparing a form
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum FormError {
    /// IO error when reading or writing file
    IoError(std::io::Error),

    /// Error parsing TOML
    ParseError(toml::de::Error),

    /// Error serializing to TOML
    SerializeError(toml::ser::Error),

    /// No section with a name was provided
    NoSections,
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::IoError(e) => write!(f, "IO error: {}", e),
            FormError::ParseError(e) => write!(f, "TOML parse error: {}", e),
            FormError::SerializeError(e) => write!(f, "TOML serialize error: {}", e),
            FormError::NoSections => write!(f, "At least one section with a name is required"),
        }
    }
}

impl std::error::Error for FormError {}
