//! tareinador - AI-assisted academic document client
//!
//! A CLI tool for generating academic documents from a form, editing
//! their pages (with the AI service or by hand), attaching images, and
//! exporting the result as HTML or PDF through the document backend.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::enum_variant_names)]
#![allow(dead_code)]

mod api;
mod cli;
mod compose;
mod config;
mod controller;
mod document;
mod form;
mod notify;
mod shell;

use anyhow::{Context, Result};
use api::{HttpBackend, ImageUpload};
use clap::Parser;
use cli::{Cli, Commands};
use config::ClientConfig;
use controller::DocumentController;
use form::DocumentForm;
use notify::ConsoleNotifier;
use std::path::{Path, PathBuf};

/// Form file written by `init` and read by `generate` by default
const FORM_FILE_NAME: &str = "form.toml";

/// Main entry point for the tareinador CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    // init works offline, everything else talks to the backend
    let command = match cli.command {
        Commands::Init { path, force, title } => {
            return handle_init_command(path, force, title);
        }
        command => command,
    };

    let mut config = ClientConfig::resolve(cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(cli.api_base.clone(), cli.timeout);

    let backend = HttpBackend::new(&config).context("Failed to create HTTP client")?;
    log::info!("Using backend at {}", backend.base_url());
    let mut ctl = DocumentController::new(backend, Box::new(ConsoleNotifier { quiet: cli.quiet }))
        .with_fallback_title(config.fallback_title.clone());

    match command {
        // Handled before connecting
        Commands::Init { .. } => {}

        Commands::Generate {
            form,
            download,
            output,
        } => {
            handle_generate_command(&mut ctl, &form)?;
            if download {
                let dir = output.unwrap_or_else(|| config.download_dir.clone());
                ctl.download(&dir).context("Failed to download PDF")?;
            }
        }

        Commands::Show { doc_id, page } => {
            open_document(&mut ctl, &doc_id)?;
            handle_show_command(&mut ctl, page)?;
        }

        Commands::Edit {
            doc_id,
            page,
            instructions,
        } => {
            open_page(&mut ctl, &doc_id, page)?;
            ctl.edit_with_ai(&instructions.join(" "))
                .with_context(|| format!("Failed to edit page {}", page))?;
        }

        Commands::Save { doc_id, page, file } => {
            open_page(&mut ctl, &doc_id, page)?;
            handle_save_command(&mut ctl, &file)?;
        }

        Commands::AddImage {
            doc_id,
            page,
            file,
            caption,
        } => {
            let upload = ImageUpload::from_path(&file)
                .with_context(|| format!("Failed to read image {}", file.display()))?;
            open_page(&mut ctl, &doc_id, page)?;
            ctl.add_image(&upload, &caption)
                .with_context(|| format!("Failed to add {}", file.display()))?;
        }

        Commands::RemoveImage {
            doc_id,
            page,
            image,
        } => {
            if image == 0 {
                anyhow::bail!("Image numbers start at 1");
            }
            open_page(&mut ctl, &doc_id, page)?;
            ctl.delete_image(image - 1)
                .with_context(|| format!("Failed to remove image {}", image))?;
        }

        Commands::Preview { doc_id, output } => {
            open_document(&mut ctl, &doc_id)?;
            let html = ctl.preview_html().context("Failed to load preview")?;
            match output {
                Some(path) => {
                    std::fs::write(&path, html)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✓ Successfully wrote: {}", path.display());
                }
                None => println!("{}", html),
            }
        }

        Commands::Download { doc_id, output } => {
            open_document(&mut ctl, &doc_id)?;
            let dir = output.unwrap_or_else(|| config.download_dir.clone());
            ctl.download(&dir).context("Failed to download PDF")?;
        }

        Commands::Shell { form, doc } => {
            if let Some(form) = form {
                handle_generate_command(&mut ctl, &form)?;
            } else if let Some(doc_id) = doc {
                open_document(&mut ctl, &doc_id)?;
            }
            handle_shell_command(&mut ctl, &config)?;
        }
    }

    Ok(())
}

/// Handle the init command
fn handle_init_command(path: Option<PathBuf>, force: bool, title: Option<String>) -> Result<()> {
    let target_path = path.unwrap_or_else(|| PathBuf::from("."));
    let form_path = target_path.join(FORM_FILE_NAME);

    if form_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it",
            form_path.display()
        );
    }

    if !target_path.exists() {
        std::fs::create_dir_all(&target_path)
            .with_context(|| format!("Failed to create directory {}", target_path.display()))?;
    }

    DocumentForm::starter(title.as_deref())
        .save(&form_path)
        .with_context(|| format!("Failed to write {}", form_path.display()))?;

    println!("✓ Successfully wrote: {}", form_path.display());
    println!("\nNext steps:");
    println!("  1. Fill in your data and sections in {}", FORM_FILE_NAME);
    println!("  2. Run 'tareinador generate' to create the document");
    println!("  3. Run 'tareinador shell --doc <id>' to edit it");

    Ok(())
}

/// Handle the generate command
fn handle_generate_command(ctl: &mut DocumentController<HttpBackend>, form: &Path) -> Result<()> {
    let form_data = DocumentForm::load(form)
        .with_context(|| format!("Failed to load form {}", form.display()))?;

    ctl.generate(&form_data)
        .with_context(|| format!("Failed to generate document from {}", form.display()))?;

    if let (Some(doc_id), Some(doc)) = (ctl.doc_id(), ctl.document()) {
        println!("Document id: {}", doc_id);
        println!(
            "  - {} pages, ~{} words",
            doc.page_count(),
            doc.word_count()
        );
    }

    Ok(())
}

/// Handle the show command
fn handle_show_command(
    ctl: &mut DocumentController<HttpBackend>,
    page: Option<usize>,
) -> Result<()> {
    if let Some(number) = page {
        select_page(ctl, number)?;
        if let Some(page) = ctl.page() {
            println!("{}", compose::compose_page(page));
        }
        return Ok(());
    }

    if let Some(doc) = ctl.document() {
        println!("{} ({})", doc.title, doc.id);
        println!(
            "{} pages, {} images, ~{} words\n",
            doc.page_count(),
            doc.image_count(),
            doc.word_count()
        );
        for (i, page) in doc.pages.iter().enumerate() {
            println!(
                "  {:>3}. {} ({} words, {} images)",
                i + 1,
                page.title,
                page.word_count(),
                page.images.len()
            );
        }
    }
    Ok(())
}

/// Handle the save command
///
/// Markdown files become the page body as-is; any other file is treated
/// as edited page markup and goes through the manual edit flow, which
/// strips the heading and image blocks before saving.
fn handle_save_command(ctl: &mut DocumentController<HttpBackend>, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let is_markdown = matches!(
        file.extension().and_then(|s| s.to_str()),
        Some("md") | Some("markdown")
    );

    if is_markdown {
        ctl.save_manual_content(&compose::markdown_to_html(&raw))
            .with_context(|| format!("Failed to save {}", file.display()))?;
    } else {
        ctl.begin_manual_edit()?;
        ctl.update_edit_buffer(raw)?;
        ctl.save_manual_edit()
            .with_context(|| format!("Failed to save {}", file.display()))?;
    }

    Ok(())
}

/// Handle the shell command
fn handle_shell_command(
    ctl: &mut DocumentController<HttpBackend>,
    config: &ClientConfig,
) -> Result<()> {
    let work_dir = std::env::temp_dir().join(format!("tareinador-{}", std::process::id()));
    log::info!("Edit files go to {}", work_dir.display());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    shell::Shell::new(ctl, &work_dir, &config.download_dir)
        .run(stdin.lock(), &mut stdout)
        .context("Shell session failed")?;

    Ok(())
}

/// Load a document by id
fn open_document(ctl: &mut DocumentController<HttpBackend>, doc_id: &str) -> Result<()> {
    ctl.open(doc_id)
        .with_context(|| format!("Failed to open document {}", doc_id))
}

/// Load a document and select a page (1-based)
fn open_page(ctl: &mut DocumentController<HttpBackend>, doc_id: &str, page: usize) -> Result<()> {
    open_document(ctl, doc_id)?;
    select_page(ctl, page)
}

/// Select a page by its 1-based number
fn select_page(ctl: &mut DocumentController<HttpBackend>, number: usize) -> Result<()> {
    if number == 0 {
        anyhow::bail!("Page numbers start at 1");
    }
    ctl.set_current_page(number - 1)
        .with_context(|| format!("Cannot select page {}", number))
}
