// Pipeline commands: validate, extract, fill, run

use std::path::{Path, PathBuf};

use chrono::Utc;
use rhfill_config::{Job, JobStore, Settings, StoreKind};
use rhfill_docs::{
    extract, DirDocumentStore, DocumentStore, ExtractReport, HttpDocumentStore, PdfToText, TEXT_DIR,
};
use rhfill_io::IoError;
use rhfill_recon::{fill, validate, FillReport, ValidatedTable, ValidationReport};
use serde_json::json;

use crate::{CliError, TOKEN_HINT};

/// Validated form table, inside a job or as the `validate` default.
pub const VALIDATED_FILE: &str = "DatosValidados.xlsx";
/// Filled registry inside a job.
pub const FINAL_FILE: &str = "ResultadoFinal.xlsx";

const VALIDATED_SHEET: &str = "DatosValidados";
const FINAL_SHEET: &str = "ResultadoFinal";

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(form: &Path, registry: &Path, out: &Path, json: bool) -> Result<(), CliError> {
    let report = validate_into(form, registry, out)?.report;

    if json {
        return print_json(&json!({ "output": out, "report": report }));
    }
    print_validation(&report);
    println!("wrote {}", out.display());
    Ok(())
}

fn validate_into(
    form: &Path,
    registry: &Path,
    out: &Path,
) -> Result<rhfill_recon::Validation, CliError> {
    let form_table = rhfill_io::read_table(form, None).map_err(|e| match e {
        IoError::NotFound(_) => {
            CliError::table(e).with_hint("--form must point at the exported form responses")
        }
        e => CliError::table(e),
    })?;
    let validation = validate(form_table, registry).map_err(CliError::recon)?;
    rhfill_io::write_table(validation.table.table(), out, VALIDATED_SHEET)
        .map_err(CliError::table)?;
    Ok(validation)
}

// ============================================================================
// extract
// ============================================================================

pub fn cmd_extract(
    settings: &Settings,
    validated: &Path,
    workdir: &Path,
    json: bool,
) -> Result<(), CliError> {
    let validated = load_validated(validated)?;
    let report = extract_into(settings, &validated, workdir)?;

    if json {
        return print_json(&json!({ "workdir": workdir, "report": report }));
    }
    print_extraction(&report);
    println!("texts in {}", workdir.join(TEXT_DIR).display());
    Ok(())
}

fn extract_into(
    settings: &Settings,
    validated: &ValidatedTable,
    workdir: &Path,
) -> Result<ExtractReport, CliError> {
    let store = open_store(settings)?;
    let extractor = PdfToText::locate(&settings.pdf.pdftotext)
        .map_err(CliError::text)?
        .with_layout(settings.pdf.layout);
    let extraction =
        extract(store.as_ref(), &extractor, validated, workdir).map_err(CliError::extract)?;
    Ok(extraction.report)
}

fn open_store(settings: &Settings) -> Result<Box<dyn DocumentStore>, CliError> {
    let store = &settings.store;
    match store.kind {
        StoreKind::Http => {
            let http = HttpDocumentStore::from_env(&store.url_template, &store.token_env, settings.timeout())
                .map_err(|e| CliError::store(e).with_hint(TOKEN_HINT))?;
            Ok(Box::new(http))
        }
        StoreKind::Dir => {
            let Some(mirror) = &store.mirror_dir else {
                return Err(CliError::args("store.kind = \"dir\" requires store.mirror_dir"));
            };
            let dir = DirDocumentStore::new(mirror).map_err(CliError::store)?;
            Ok(Box::new(dir))
        }
    }
}

// ============================================================================
// fill
// ============================================================================

pub fn cmd_fill(
    validated: &Path,
    text_dir: &Path,
    registry: &Path,
    out: &Path,
    json: bool,
) -> Result<(), CliError> {
    if !text_dir.is_dir() {
        log::warn!("{} does not exist, receipt columns will be left as they are", text_dir.display());
    }
    let validated = load_validated(validated)?;
    let report = fill_into(&validated, text_dir, registry, out)?;

    if json {
        return print_json(&json!({ "output": out, "report": report }));
    }
    print_fill(&report);
    println!("wrote {}", out.display());
    Ok(())
}

fn fill_into(
    validated: &ValidatedTable,
    text_dir: &Path,
    registry: &Path,
    out: &Path,
) -> Result<FillReport, CliError> {
    let outcome = fill(validated, text_dir, registry).map_err(CliError::recon)?;
    rhfill_io::write_table(&outcome.table, out, FINAL_SHEET).map_err(CliError::table)?;
    Ok(outcome.report)
}

fn load_validated(path: &Path) -> Result<ValidatedTable, CliError> {
    let table = rhfill_io::read_table(path, None).map_err(CliError::table)?;
    ValidatedTable::from_table(table).map_err(CliError::recon)
}

// ============================================================================
// run
// ============================================================================

pub fn cmd_run(
    settings: &Settings,
    form: &Path,
    registry: &Path,
    skip_extract: bool,
    json: bool,
) -> Result<(), CliError> {
    let jobs = JobStore::new(settings.jobs_root(), settings.jobs.ttl_hours);
    match jobs.purge_expired(Utc::now()) {
        Ok(0) => {}
        Ok(n) => log::info!("purged {n} expired job(s)"),
        Err(e) => log::warn!("could not purge expired jobs: {e}"),
    }

    let mut job = jobs.create().map_err(CliError::job)?;
    job.record_input("form", &absolute(form));
    job.record_input("registry", &absolute(registry));
    job.save().map_err(CliError::job)?;

    let validation = validate_into(form, registry, &job.path(VALIDATED_FILE))?;
    record(&mut job, "validated", VALIDATED_FILE)?;

    let extraction = if skip_extract {
        log::info!("skipping document extraction");
        None
    } else {
        Some(extract_into(settings, &validation.table, job.dir())?)
    };

    let final_path = job.path(FINAL_FILE);
    let fill_report = fill_into(&validation.table, &job.path(TEXT_DIR), registry, &final_path)?;
    record(&mut job, "final", FINAL_FILE)?;

    if json {
        return print_json(&json!({
            "job": job.id(),
            "job_dir": job.dir(),
            "expires_at": job.manifest().expires_at,
            "validation": validation.report,
            "extraction": extraction,
            "fill": fill_report,
            "output": final_path,
        }));
    }

    print_validation(&validation.report);
    if let Some(report) = &extraction {
        print_extraction(report);
    }
    print_fill(&fill_report);
    println!("job:       {}", job.id());
    println!("output:    {}", final_path.display());
    Ok(())
}

fn record(job: &mut Job, name: &str, file: &str) -> Result<(), CliError> {
    job.record_output(name, file);
    job.save().map_err(CliError::job)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

// ============================================================================
// Output
// ============================================================================

pub(crate) fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::other(format!("cannot serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

fn print_validation(report: &ValidationReport) {
    println!(
        "validated: {} form rows, {} matched, {} unmatched",
        report.form_rows, report.matched, report.unmatched
    );
    if report.duplicate_registry_names > 0 {
        println!("           {} registry names occur more than once", report.duplicate_registry_names);
    }
}

fn print_extraction(report: &ExtractReport) {
    println!(
        "extracted: {} candidates, {} fetched, {} reused, {} texts",
        report.candidates, report.fetched, report.reused, report.texts_written
    );
    let skipped = report.no_reference
        + report.malformed_reference
        + report.fetch_failures
        + report.not_pdf
        + report.extraction_failures
        + report.empty_texts;
    if skipped > 0 {
        println!("           {skipped} skipped (see log)");
    }
}

fn print_fill(report: &FillReport) {
    println!(
        "filled:    {} of {} registry rows, {} without text",
        report.filled, report.registry_rows, report.missing_texts
    );
}
