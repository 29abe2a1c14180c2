//! Page composition and extraction
//!
//! A page is displayed (and edited) as a single HTML fragment:
//! - the title as a marked `<h2>` heading
//! - the stored content, verbatim
//! - one centered block per image, with an optional caption
//!
//! `extract_page` is the exact inverse of `compose_page`: it removes the
//! heading and the image blocks that composition added and returns the
//! remaining content trimmed. Both sides key on the marker classes below,
//! so content that merely looks similar (a centered div, a second `<h2>`)
//! is left alone.

use crate::document::Page;
use itertools::Itertools;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;
use std::sync::OnceLock;

/// Class carried by the composed title heading
pub const TITLE_CLASS: &str = "page-title";

/// Class carried by each composed image block
pub const IMAGE_CLASS: &str = "page-image";

/// Result of extracting edited page markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Text of the title heading, if the heading is still present
    pub title: Option<String>,
    /// Body content with heading and image blocks removed, trimmed
    pub content: String,
}

/// Compose the display markup for a page
pub fn compose_page(page: &Page) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "<h2 class=\"{}\">{}</h2>\n",
        TITLE_CLASS,
        escape_html(&page.title)
    ));

    output.push_str(&page.content);

    if !page.images.is_empty() {
        let figures = page
            .images
            .iter()
            .map(|image| write_image(&image.url, image.caption.as_deref()))
            .join("\n");
        output.push('\n');
        output.push_str(&figures);
    }

    output
}

/// Recover the storable content (and the heading text) from page markup
pub fn extract_page(markup: &str) -> ExtractedPage {
    let mut title = None;

    let without_title = title_regex().replacen(markup, 1, |caps: &regex::Captures<'_>| {
        title = Some(unescape_html(&strip_tags(&caps[1])).trim().to_string());
        String::new()
    });

    let content = image_regex().replace_all(&without_title, "");

    ExtractedPage {
        title,
        content: content.trim().to_string(),
    }
}

/// Render Markdown into an HTML fragment usable as page content
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut output = String::new();
    html::push_html(&mut output, Parser::new_ext(markdown, options));
    output.trim().to_string()
}

/// Write a single centered image block
fn write_image(url: &str, caption: Option<&str>) -> String {
    let mut block = format!(
        "<div class=\"{}\" style=\"text-align:center;margin:15px 0;\">",
        IMAGE_CLASS
    );
    block.push_str(&format!(
        "<img src=\"{}\" alt=\"{}\" style=\"max-width:80%;border-radius:6px;\">",
        escape_html(url),
        escape_html(caption.unwrap_or(""))
    ));
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        block.push_str(&format!(
            "<p class=\"{}-caption\" style=\"font-size:0.9em;font-style:italic;margin-top:6px;\">{}</p>",
            IMAGE_CLASS,
            escape_html(caption)
        ));
    }
    block.push_str("</div>");
    block
}

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| {
        Regex::new(&format!(
            r#"(?s)<h2\b[^>]*\bclass="{}"[^>]*>(.*?)</h2>"#,
            TITLE_CLASS
        ))
        .expect("title pattern is valid")
    })
}

// Captions and URLs are escaped on composition, so a block never contains
// a nested `</div>`. Any div carrying the marker class is removed, including
// one typed into the body; stored content never holds such blocks.
fn image_regex() -> &'static Regex {
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    IMAGE.get_or_init(|| {
        Regex::new(&format!(
            r#"(?s)\s*<div\b[^>]*\bclass="{}"[^>]*>.*?</div>"#,
            IMAGE_CLASS
        ))
        .expect("image block pattern is valid")
    })
}

fn strip_tags(text: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
        .replace_all(text, "")
        .into_owned()
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
