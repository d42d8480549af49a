//! Reads local files into plain text for ingestion.

use std::path::Path;

use crate::domain::DomainError;

/// A file read from disk, ready for [`crate::application::DocumentService::ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub name: String,
    pub content_type: &'static str,
    pub content: String,
}

pub fn load_document(path: &Path) -> Result<LoadedDocument, DomainError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let content_type = match extension.as_str() {
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        _ => {
            return Err(DomainError::validation(format!(
                "Invalid extension type: {}",
                path.display()
            )))
        }
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|e| DomainError::not_found(format!("{}: {e}", path.display())))?;
    let content = if content_type == "text/html" {
        html_to_text(&raw)
    } else {
        raw
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(LoadedDocument {
        name,
        content_type,
        content,
    })
}

/// Converts an HTML page to plain text, one line per non-empty block.
pub fn html_to_text(html: &str) -> String {
    let text = nanohtml2text::html2text(&escape_stray_brackets(html));
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A `<` that cannot open a tag is text, as in `3 < 5`.
fn escape_stray_brackets(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = matches!(
            chars.peek(),
            Some(&next) if next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')
        );
        if c == '<' && !opens_tag {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    out
}
