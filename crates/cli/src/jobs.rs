// Job commands: list, purge, bundle

use std::path::Path;

use chrono::Utc;
use clap::Subcommand;
use rhfill_config::{JobStore, Settings};
use rhfill_docs::PDF_DIR;
use serde_json::json;

use crate::exit_codes::EXIT_JOB_INCOMPLETE;
use crate::pipeline::print_json;
use crate::CliError;

#[derive(Subcommand)]
pub enum JobCommands {
    /// List jobs still on disk, oldest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every expired job
    Purge,
}

fn job_store(settings: &Settings) -> JobStore {
    JobStore::new(settings.jobs_root(), settings.jobs.ttl_hours)
}

pub fn cmd_jobs(settings: &Settings, command: JobCommands) -> Result<(), CliError> {
    let store = job_store(settings);
    let now = Utc::now();

    match command {
        JobCommands::List { json } => {
            let manifests = store.list().map_err(CliError::job)?;
            if json {
                let jobs: Vec<_> = manifests
                    .iter()
                    .map(|m| {
                        json!({
                            "id": m.id,
                            "created_at": m.created_at,
                            "expires_at": m.expires_at,
                            "expired": m.is_expired(now),
                            "outputs": m.outputs,
                        })
                    })
                    .collect();
                return print_json(&json!({ "root": store.root(), "jobs": jobs }));
            }

            if manifests.is_empty() {
                println!("no jobs in {}", store.root().display());
                return Ok(());
            }
            for m in &manifests {
                let status = if m.is_expired(now) { "expired" } else { "active" };
                let outputs: Vec<&str> = m.outputs.keys().map(String::as_str).collect();
                println!(
                    "{}  {}  {:<7}  {}",
                    m.id,
                    m.created_at.format("%Y-%m-%d %H:%M"),
                    status,
                    outputs.join(",")
                );
            }
            Ok(())
        }
        JobCommands::Purge => {
            let removed = store.purge_expired(now).map_err(CliError::job)?;
            println!("removed {removed} expired job(s)");
            Ok(())
        }
    }
}

pub fn cmd_bundle(settings: &Settings, id: &str, out: &Path) -> Result<(), CliError> {
    let job = job_store(settings).open(id).map_err(CliError::job)?;

    let Some(workbook) = job.output("final").filter(|p| p.is_file()) else {
        return Err(CliError {
            code: EXIT_JOB_INCOMPLETE,
            message: format!("job {} has no final workbook", job.id()),
            hint: Some("the job's `rhfill run` did not finish".to_string()),
        });
    };

    let summary = rhfill_io::bundle::write_bundle(out, Some(&workbook), Some(&job.path(PDF_DIR)))
        .map_err(CliError::table)?;
    println!("wrote {} ({} documents)", out.display(), summary.documents);
    Ok(())
}
