// ZIP bundle of the final workbook plus the fetched source documents

use std::fs;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::IoError;

/// What went into a bundle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BundleSummary {
    pub workbook_entry: Option<String>,
    pub documents: usize,
}

/// Write `dest` as a ZIP containing the workbook at `workbook` (stored under
/// its file name) and every `.pdf` from `pdf_dir` under `pdfs/`.
///
/// Either input may be absent: a missing workbook or document directory is
/// skipped, so a bundle of only documents (or only the workbook) is valid.
pub fn write_bundle(
    dest: &Path,
    workbook: Option<&Path>,
    pdf_dir: Option<&Path>,
) -> Result<BundleSummary, IoError> {
    let file = fs::File::create(dest).map_err(|e| IoError::write(dest, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut summary = BundleSummary::default();

    if let Some(workbook) = workbook.filter(|p| p.is_file()) {
        let name = workbook
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("ResultadoFinal.xlsx")
            .to_string();
        let bytes = fs::read(workbook).map_err(|e| IoError::read(workbook, e))?;
        zip.start_file(name.as_str(), options).map_err(|e| IoError::write(dest, e))?;
        zip.write_all(&bytes).map_err(|e| IoError::write(dest, e))?;
        summary.workbook_entry = Some(name);
    }

    if let Some(dir) = pdf_dir.filter(|p| p.is_dir()) {
        let mut entries: Vec<_> = fs::read_dir(dir)
            .map_err(|e| IoError::read(dir, e))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
            })
            .collect();
        // Deterministic entry order
        entries.sort();

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                log::warn!("skipping non-UTF-8 file name in {}", dir.display());
                continue;
            };
            let bytes = fs::read(&path).map_err(|e| IoError::read(&path, e))?;
            zip.start_file(format!("pdfs/{name}"), options)
                .map_err(|e| IoError::write(dest, e))?;
            zip.write_all(&bytes).map_err(|e| IoError::write(dest, e))?;
            summary.documents += 1;
        }
    }

    zip.finish().map_err(|e| IoError::write(dest, e))?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn bundles_workbook_and_pdfs_only() {
        let dir = tempdir().unwrap();
        let pdfs = dir.path().join("pdfs");
        fs::create_dir(&pdfs).unwrap();
        fs::write(pdfs.join("LOPEZ ANA.pdf"), b"%PDF-1.4 a").unwrap();
        fs::write(pdfs.join("notes.txt"), b"ignored").unwrap();
        let workbook = dir.path().join("ResultadoFinal.xlsx");
        fs::write(&workbook, b"fake xlsx").unwrap();

        let dest = dir.path().join("FinalMasPDFs.zip");
        let summary = write_bundle(&dest, Some(&workbook), Some(&pdfs)).unwrap();
        assert_eq!(summary.documents, 1);
        assert_eq!(summary.workbook_entry.as_deref(), Some("ResultadoFinal.xlsx"));

        let mut archive = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut pdf = archive.by_name("pdfs/LOPEZ ANA.pdf").unwrap();
        let mut content = Vec::new();
        pdf.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"%PDF-1.4 a");
    }

    #[test]
    fn missing_inputs_produce_an_empty_bundle() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("empty.zip");
        let summary = write_bundle(&dest, Some(&dir.path().join("nope.xlsx")), None).unwrap();
        assert_eq!(summary, BundleSummary::default());
        let archive = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
