// Extract stage: fetch matched records' documents and write their text

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use rhfill_recon::{sidecar_stem, ValidatedTable};
use serde::Serialize;

use crate::error::{ExtractError, StoreError};
use crate::reference::{parse_document_id, ReferenceError};
use crate::store::DocumentStore;
use crate::text::{join_pages, TextExtractor};

/// Fetched documents, `<workdir>/pdfs/<NAME>.pdf`.
pub const PDF_DIR: &str = "pdfs";
/// Sidecar texts, `<workdir>/extracted_text/<NAME>.txt`.
pub const TEXT_DIR: &str = "extracted_text";

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Matched records considered.
    pub candidates: usize,
    pub fetched: usize,
    /// Documents already present in the working directory.
    pub reused: usize,
    pub no_reference: usize,
    pub malformed_reference: usize,
    pub fetch_failures: usize,
    pub not_pdf: usize,
    pub extraction_failures: usize,
    pub texts_written: usize,
    pub empty_texts: usize,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub root: PathBuf,
    pub pdf_dir: PathBuf,
    pub text_dir: PathBuf,
    pub report: ExtractReport,
}

/// Fetch and convert the document of every matched record in `validated`.
///
/// Fails when `workdir` cannot be laid out or the store rejects its
/// credentials; every other problem is per record. A document already
/// present under `workdir` is never fetched again; its text is rewritten.
pub fn extract(
    store: &dyn DocumentStore,
    extractor: &dyn TextExtractor,
    validated: &ValidatedTable,
    workdir: &Path,
) -> Result<Extraction, ExtractError> {
    let pdf_dir = workdir.join(PDF_DIR);
    let text_dir = workdir.join(TEXT_DIR);
    for dir in [&pdf_dir, &text_dir] {
        fs::create_dir_all(dir)
            .map_err(|e| ExtractError::Setup { path: dir.clone(), message: e.to_string() })?;
    }

    let mut extraction = Extraction {
        root: workdir.to_path_buf(),
        pdf_dir,
        text_dir,
        report: ExtractReport::default(),
    };

    if !validated.has_document_refs() {
        log::warn!("validated table has no document reference column, nothing to fetch");
        return Ok(extraction);
    }

    let report = &mut extraction.report;
    for record in validated.matched() {
        report.candidates += 1;
        let name = record.name.as_str();
        let stem = sidecar_stem(name);
        let pdf_path = extraction.pdf_dir.join(format!("{stem}.pdf"));
        let text_path = extraction.text_dir.join(format!("{stem}.txt"));

        // A sidecar from an earlier run must not outlive a failed re-extraction.
        if let Err(e) = remove_if_present(&text_path) {
            log::error!("{name}: cannot remove stale {}: {e}", text_path.display());
            report.extraction_failures += 1;
            continue;
        }

        let id = match parse_document_id(&record.document_ref) {
            Ok(id) => id,
            Err(ReferenceError::Empty) => {
                log::warn!("{name}: no document reference");
                report.no_reference += 1;
                continue;
            }
            Err(e) => {
                log::warn!("{name}: {e}, skipping");
                report.malformed_reference += 1;
                continue;
            }
        };

        if pdf_path.is_file() {
            log::debug!("{name}: reusing {}", pdf_path.display());
            report.reused += 1;
        } else {
            match store.fetch(id, &pdf_path) {
                Ok(bytes) => {
                    log::info!("{name}: fetched document {id} ({bytes} bytes)");
                    report.fetched += 1;
                }
                Err(e @ StoreError::Auth { .. }) => {
                    log::error!("{name}: document store rejected the credentials");
                    return Err(ExtractError::Store(e));
                }
                Err(e) => {
                    log::error!("{name}: cannot fetch document {id}: {e}");
                    report.fetch_failures += 1;
                    continue;
                }
            }
        }

        if !is_pdf(&pdf_path) {
            log::warn!("{name}: {} is not a PDF, discarding it", pdf_path.display());
            if let Err(e) = fs::remove_file(&pdf_path) {
                log::error!("{name}: cannot remove {}: {e}", pdf_path.display());
            }
            report.not_pdf += 1;
            continue;
        }

        let pages = match extractor.page_texts(&pdf_path) {
            Ok(pages) => pages,
            Err(e) => {
                log::error!("{name}: {e}");
                report.extraction_failures += 1;
                continue;
            }
        };
        let text = join_pages(&pages);
        if text.is_empty() {
            log::warn!("{name}: document has no extractable text (scanned?)");
            report.empty_texts += 1;
            continue;
        }

        match fs::write(&text_path, text) {
            Ok(()) => report.texts_written += 1,
            Err(e) => {
                log::error!("{name}: cannot write {}: {e}", text_path.display());
                report.extraction_failures += 1;
            }
        }
    }

    log::info!(
        "extract: {} candidates, {} fetched, {} reused, {} texts written",
        report.candidates,
        report.fetched,
        report.reused,
        report.texts_written
    );
    Ok(extraction)
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn is_pdf(path: &Path) -> bool {
    let mut magic = [0u8; 5];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|()| magic == PDF_MAGIC)
        .unwrap_or(false)
}
