// Paginated document text extraction

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::TextError;

pub trait TextExtractor {
    /// Text of each page, in page order.
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, TextError>;
}

/// Poppler's `pdftotext`, run once per document with output on stdout.
#[derive(Debug, Clone)]
pub struct PdfToText {
    program: PathBuf,
    layout: bool,
}

impl PdfToText {
    /// Resolve `program` (a name on `PATH` or a path) up front, so a missing
    /// install is reported once instead of once per document.
    pub fn locate(program: &str) -> Result<Self, TextError> {
        let program = which::which(program).map_err(|_| TextError::ToolMissing(program.to_string()))?;
        Ok(Self { program, layout: false })
    }

    /// Keep the physical page layout (`-layout`) instead of reading order.
    pub fn with_layout(mut self, layout: bool) -> Self {
        self.layout = layout;
        self
    }
}

impl TextExtractor for PdfToText {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, TextError> {
        let mut command = Command::new(&self.program);
        if self.layout {
            command.arg("-layout");
        }
        let output = command
            .args(["-enc", "UTF-8"])
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| TextError::Io(format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TextError::Failed(format!(
                "{} (exit {}): {}",
                path.display(),
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            )));
        }

        Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// pdftotext ends every page with a form feed.
fn split_pages(output: &str) -> Vec<String> {
    let mut pages: Vec<String> = output.split('\x0c').map(str::to_string).collect();
    if pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Document text as written to the sidecar: non-blank pages, each
/// followed by a newline. Empty when no page has text.
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim_end())
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("{p}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_form_feed() {
        let pages = split_pages("page one\n\x0cpage two\n\x0c");
        assert_eq!(pages, vec!["page one\n".to_string(), "page two\n".to_string()]);
        assert!(split_pages("").is_empty());
    }

    #[test]
    fn join_skips_blank_pages() {
        let pages = vec!["Total Neto Recibido: 10\n".to_string(), "  \n".to_string(), "N° E001-1".to_string()];
        assert_eq!(join_pages(&pages), "Total Neto Recibido: 10\nN° E001-1\n");
        assert_eq!(join_pages(&["\n".to_string()]), "");
    }

    #[test]
    fn missing_tool_is_reported() {
        let err = PdfToText::locate("definitely-not-pdftotext-rhfill").unwrap_err();
        assert!(matches!(err, TextError::ToolMissing(_)));
    }
}
