//! Interactive editing session
//!
//! A line-oriented loop over one `DocumentController`. Manual edits go
//! through a scratch file: `manual` writes the composed page markup to
//! disk, the user edits it with any editor, and `save` reads it back.

use crate::api::{DocumentBackend, ImageUpload};
use crate::compose::compose_page;
use crate::controller::{ControllerError, DocumentController};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const HELP: &str = "\
Commands:
  info                    Document summary
  show                    Print the current page markup
  page [N]                Go to page N (1-based)
  next | prev             Move one page
  edit <instructions>     Rewrite the current page with the AI
  manual                  Write the page markup to a file for editing
  save                    Save the edited file
  cancel                  Leave manual edit mode without saving
  image <file> [caption]  Upload an image to the current page
  rmimage <N>             Remove image N (1-based) from the current page
  preview [file]          Write the HTML preview to a file
  download                Download the PDF
  open <id>               Load an existing document
  new                     Discard the current document
  help                    Show this help
  quit                    Leave the shell";

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Info,
    Show,
    Page(Option<usize>),
    Next,
    Previous,
    Edit(String),
    Manual,
    Save,
    Cancel,
    Image { path: PathBuf, caption: String },
    RemoveImage(usize),
    Preview(Option<PathBuf>),
    Download,
    Open(String),
    New,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line; page and image numbers are 1-based
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "info" => Self::Info,
            "show" => Self::Show,
            "page" if rest.is_empty() => Self::Page(None),
            "page" => Self::Page(Some(parse_number(rest)?)),
            "next" | "n" => Self::Next,
            "prev" | "p" => Self::Previous,
            "edit" if rest.is_empty() => return Err("Usage: edit <instructions>".to_string()),
            "edit" => Self::Edit(rest.to_string()),
            "manual" => Self::Manual,
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "image" if rest.is_empty() => return Err("Usage: image <file> [caption]".to_string()),
            "image" => {
                let (path, caption) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                Self::Image {
                    path: PathBuf::from(path),
                    caption: caption.trim().to_string(),
                }
            }
            "rmimage" => Self::RemoveImage(parse_number(rest)?),
            "preview" if rest.is_empty() => Self::Preview(None),
            "preview" => Self::Preview(Some(PathBuf::from(rest))),
            "download" => Self::Download,
            "open" if rest.is_empty() => return Err("Usage: open <id>".to_string()),
            "open" => Self::Open(rest.to_string()),
            "new" => Self::New,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("Unknown command '{}', type 'help'", other)),
        };
        Ok(command)
    }
}

/// Parse a 1-based number into a 0-based index
fn parse_number(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Expected a number starting at 1, got '{}'", text)),
    }
}

/// Interactive session state
pub struct Shell<'a, B: DocumentBackend> {
    controller: &'a mut DocumentController<B>,
    /// Directory for scratch edit files and previews
    work_dir: PathBuf,
    /// Directory for downloaded PDFs
    download_dir: PathBuf,
    /// Scratch file of the manual edit in progress
    edit_file: Option<PathBuf>,
}

impl<'a, B: DocumentBackend> Shell<'a, B> {
    /// Create a session over `controller`
    pub fn new(
        controller: &'a mut DocumentController<B>,
        work_dir: impl Into<PathBuf>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            controller,
            work_dir: work_dir.into(),
            download_dir: download_dir.into(),
            edit_file: None,
        }
    }

    /// Read commands until `quit` or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, output: &mut W) -> io::Result<()> {
        writeln!(output, "Type 'help' for commands.")?;
        self.status(output)?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match ShellCommand::parse(&line) {
                Ok(ShellCommand::Quit) => break,
                Ok(command) => {
                    log::debug!("Shell command: {:?}", command);
                    self.execute(command, output)?;
                }
                Err(message) => writeln!(output, "{}", message)?,
            }
        }

        if self.controller.is_editing() {
            log::info!("Leaving shell with an unsaved manual edit");
        }
        Ok(())
    }

    /// Run one command
    ///
    /// Operation failures are already reported by the controller's
    /// notifier, so only output errors end the session.
    pub fn execute<W: Write>(&mut self, command: ShellCommand, output: &mut W) -> io::Result<()> {
        let ctl = &mut *self.controller;

        match command {
            ShellCommand::Info => self.info(output)?,
            ShellCommand::Show => match ctl.page() {
                Some(page) => writeln!(output, "{}", compose_page(page))?,
                None => writeln!(output, "No document loaded")?,
            },
            ShellCommand::Page(None) => self.status(output)?,
            ShellCommand::Page(Some(index)) => {
                if ctl.set_current_page(index).is_ok() {
                    self.forget_stale_edit();
                    self.status(output)?;
                }
            }
            ShellCommand::Next => {
                if ctl.next_page().is_ok() {
                    self.forget_stale_edit();
                    self.status(output)?;
                }
            }
            ShellCommand::Previous => {
                if ctl.previous_page().is_ok() {
                    self.forget_stale_edit();
                    self.status(output)?;
                }
            }
            ShellCommand::Edit(instructions) => match ctl.edit_with_ai(&instructions) {
                Ok(()) => self.forget_stale_edit(),
                Err(e) => report_missing_document(&e, output)?,
            },
            ShellCommand::Manual => self.begin_manual(output)?,
            ShellCommand::Save => self.save_manual(output)?,
            ShellCommand::Cancel => {
                if ctl.cancel_manual_edit() {
                    self.edit_file = None;
                    writeln!(output, "Manual edit cancelled")?;
                } else {
                    writeln!(output, "Not editing")?;
                }
            }
            ShellCommand::Image { path, caption } => match ImageUpload::from_path(&path) {
                Ok(upload) => {
                    if let Err(e) = ctl.add_image(&upload, &caption) {
                        report_missing_document(&e, output)?;
                    }
                }
                Err(e) => writeln!(output, "Cannot read {}: {}", path.display(), e)?,
            },
            ShellCommand::RemoveImage(index) => {
                if let Err(e) = ctl.delete_image(index) {
                    report_missing_document(&e, output)?;
                }
            }
            ShellCommand::Preview(path) => {
                let path = path.unwrap_or_else(|| self.work_dir.join("preview.html"));
                if let Ok(html) = ctl.preview_html() {
                    write_file(&path, &html)?;
                    writeln!(output, "Preview written to {}", path.display())?;
                }
            }
            ShellCommand::Download => {
                let _ = ctl.download(&self.download_dir);
            }
            ShellCommand::Open(doc_id) => {
                if ctl.open(&doc_id).is_ok() {
                    self.edit_file = None;
                    self.status(output)?;
                }
            }
            ShellCommand::New => {
                ctl.new_document();
                self.edit_file = None;
                writeln!(output, "Document discarded")?;
            }
            ShellCommand::Help => writeln!(output, "{}", HELP)?,
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    fn begin_manual<W: Write>(&mut self, output: &mut W) -> io::Result<()> {
        let page_number = self.controller.current_page() + 1;
        let Ok(markup) = self.controller.begin_manual_edit() else {
            return Ok(());
        };

        let path = self.work_dir.join(format!("page-{}.html", page_number));
        if let Err(e) = write_file(&path, &markup) {
            self.controller.cancel_manual_edit();
            writeln!(output, "Cannot write {}: {}", path.display(), e)?;
            return Ok(());
        }

        writeln!(output, "Edit {} and type 'save' when done", path.display())?;
        self.edit_file = Some(path);
        Ok(())
    }

    fn save_manual<W: Write>(&mut self, output: &mut W) -> io::Result<()> {
        let Some(path) = self.edit_file.clone().filter(|_| self.controller.is_editing()) else {
            writeln!(output, "Not editing, use 'manual' first")?;
            return Ok(());
        };

        let markup = match std::fs::read_to_string(&path) {
            Ok(markup) => markup,
            Err(e) => {
                writeln!(output, "Cannot read {}: {}", path.display(), e)?;
                return Ok(());
            }
        };

        if self.controller.update_edit_buffer(markup).is_ok()
            && self.controller.save_manual_edit().is_ok()
        {
            self.edit_file = None;
        }
        Ok(())
    }

    // The controller drops its buffer on navigation and AI edits; drop the
    // scratch file reference with it.
    fn forget_stale_edit(&mut self) {
        if !self.controller.is_editing() {
            self.edit_file = None;
        }
    }

    fn status<W: Write>(&self, output: &mut W) -> io::Result<()> {
        match self.controller.page() {
            Some(page) => writeln!(
                output,
                "[{}/{}] {} ({} images){}",
                self.controller.current_page() + 1,
                self.controller.page_count(),
                page.title,
                page.images.len(),
                if self.controller.is_editing() { " *editing*" } else { "" }
            ),
            None => writeln!(output, "No document loaded"),
        }
    }

    fn info<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let (Some(doc_id), Some(doc)) = (self.controller.doc_id(), self.controller.document())
        else {
            return writeln!(output, "No document loaded");
        };

        writeln!(output, "{} ({})", doc.title, doc_id)?;
        if let Some(author) = &doc.author {
            writeln!(output, "Author: {}", author)?;
        }
        writeln!(
            output,
            "{} pages, {} images, ~{} words",
            doc.page_count(),
            doc.image_count(),
            doc.word_count()
        )?;
        for (i, page) in doc.pages.iter().enumerate() {
            let marker = if i == self.controller.current_page() { ">" } else { " " };
            writeln!(output, "{} {:>3}. {}", marker, i + 1, page.title)?;
        }
        Ok(())
    }
}

// Page operations do not notify when no document is loaded
fn report_missing_document<W: Write>(error: &ControllerError, output: &mut W) -> io::Result<()> {
    if matches!(error, ControllerError::NoDocument) {
        writeln!(output, "No document loaded")?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::api::Operation;
    use crate::form::{DocumentForm, SectionRequest};
    use crate::notify::{NoticeLevel, RecordingNotifier};
    use std::io::Cursor;

    fn form() -> DocumentForm {
        DocumentForm {
            title: "Redes".to_string(),
            include_caratula: true,
            include_indice: false,
            sections: vec![
                SectionRequest::new("Topologías", "Estrella y malla", 1),
                SectionRequest::new("Protocolos", "TCP", 1),
            ],
            ..DocumentForm::default()
        }
    }

    fn controller(notifier: RecordingNotifier) -> DocumentController<FakeBackend> {
        let mut ctl = DocumentController::new(FakeBackend::default(), Box::new(notifier));
        ctl.generate(&form()).unwrap();
        ctl
    }

    fn run(ctl: &mut DocumentController<FakeBackend>, dir: &Path, script: &str) -> String {
        let mut output = Vec::new();
        Shell::new(ctl, dir, dir.join("pdf"))
            .run(Cursor::new(script.to_string()), &mut output)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ShellCommand::parse("page 2"), Ok(ShellCommand::Page(Some(1))));
        assert_eq!(ShellCommand::parse("  next "), Ok(ShellCommand::Next));
        assert_eq!(
            ShellCommand::parse("edit hazlo más formal"),
            Ok(ShellCommand::Edit("hazlo más formal".to_string()))
        );
        assert_eq!(
            ShellCommand::parse("image fig.png Diagrama de red"),
            Ok(ShellCommand::Image {
                path: PathBuf::from("fig.png"),
                caption: "Diagrama de red".to_string()
            })
        );
        assert_eq!(
            ShellCommand::parse("image fig.png"),
            Ok(ShellCommand::Image {
                path: PathBuf::from("fig.png"),
                caption: String::new()
            })
        );
        assert_eq!(ShellCommand::parse("rmimage 1"), Ok(ShellCommand::RemoveImage(0)));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ShellCommand::parse("page 0").is_err());
        assert!(ShellCommand::parse("page dos").is_err());
        assert!(ShellCommand::parse("edit").is_err());
        assert!(ShellCommand::parse("dance").is_err());
    }

    #[test]
    fn test_navigation_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "next\nnext\nnext\npage 1\n");

        assert!(out.contains("[2/3] Topologías"));
        assert!(out.contains("[3/3] Protocolos"));
        assert!(out.ends_with("[1/3] Carátula (0 images)\n"));
        assert_eq!(ctl.current_page(), 0);
    }

    #[test]
    fn test_out_of_range_page_reported() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let log = notifier.0.clone();
        let mut ctl = controller(notifier);

        run(&mut ctl, dir.path(), "page 9\n");

        assert_eq!(ctl.current_page(), 0);
        assert_eq!(log.borrow().last().unwrap().0, NoticeLevel::Error);
    }

    #[test]
    fn test_save_needs_edit_file_from_same_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        run(&mut ctl, dir.path(), "page 2\nmanual\n");
        let path = dir.path().join("page-2.html");
        let markup = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, markup.replace("Estrella y malla", "Bus y anillo")).unwrap();

        run(&mut ctl, dir.path(), "save\n");

        // A fresh shell has no scratch file, so the edit is still pending
        assert!(ctl.is_editing());
        assert_eq!(ctl.page().unwrap().content, "<p>Estrella y malla</p>");
    }

    #[test]
    fn test_manual_edit_saved_in_one_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());
        let path = dir.path().join("page-2.html");

        let mut output = Vec::new();
        let mut shell = Shell::new(&mut ctl, dir.path(), dir.path());
        shell
            .execute(ShellCommand::Page(Some(1)), &mut output)
            .unwrap();
        shell.execute(ShellCommand::Manual, &mut output).unwrap();
        let markup = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, markup.replace("Estrella y malla", "Bus y anillo")).unwrap();
        shell.execute(ShellCommand::Save, &mut output).unwrap();

        assert!(!ctl.is_editing());
        assert_eq!(ctl.page().unwrap().content, "<p>Bus y anillo</p>");
        assert_eq!(
            ctl.backend().documents.borrow()["doc-1"].pages[1].content,
            "<p>Bus y anillo</p>"
        );
    }

    #[test]
    fn test_navigation_drops_manual_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "manual\nnext\nsave\n");

        assert!(!ctl.is_editing());
        assert!(out.contains("Not editing"));
        assert!(!ctl.backend().calls().contains(&Operation::SavePage));
    }

    #[test]
    fn test_ai_edit_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("red.png");
        std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let script = format!(
            "page 3\nedit más técnico\nimage {} Red local\nimage {}\nrmimage 1\n",
            image.display(),
            image.display()
        );
        run(&mut ctl, dir.path(), &script);

        let page = ctl.page().unwrap();
        assert_eq!(page.content, "<p>Formal text</p>");
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.images[0].caption, None);
    }

    #[test]
    fn test_missing_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "image nope.png\n");

        assert!(out.contains("Cannot read nope.png"));
        assert!(!ctl.backend().calls().contains(&Operation::UploadImage));
    }

    #[test]
    fn test_preview_and_download() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "preview\ndownload\n");

        let preview = std::fs::read_to_string(dir.path().join("preview.html")).unwrap();
        assert!(preview.contains("doc-1"));
        assert!(out.contains("Preview written to"));
        assert!(dir.path().join("pdf").join("Redes.pdf").exists());
    }

    #[test]
    fn test_new_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "new\ninfo\nopen doc-1\ninfo\n");

        assert!(out.contains("Document discarded"));
        assert!(out.contains("No document loaded"));
        assert!(out.contains("Redes (doc-1)"));
        assert!(out.contains(">   1. Carátula"));
        assert_eq!(ctl.doc_id(), Some("doc-1"));
    }

    #[test]
    fn test_page_commands_without_document() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = RecordingNotifier::default();
        let log = notifier.0.clone();
        let mut ctl = DocumentController::new(FakeBackend::default(), Box::new(notifier));

        let out = run(&mut ctl, dir.path(), "edit más formal
rmimage 1
");

        assert_eq!(out.matches("No document loaded").count(), 3);
        assert!(log.borrow().is_empty());
        assert!(ctl.backend().calls().is_empty());
    }

    #[test]
    fn test_quit_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        run(&mut ctl, dir.path(), "quit\nnext\n");

        assert_eq!(ctl.current_page(), 0);
    }

    #[test]
    fn test_unknown_command_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(RecordingNotifier::default());

        let out = run(&mut ctl, dir.path(), "bailar\n");

        assert!(out.contains("Unknown command 'bailar'"));
    }
}
