// rhfill: validate RH form submissions and fill the payment registry

mod exit_codes;
mod jobs;
mod pipeline;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rhfill_config::{ConfigError, JobError, Settings};
use rhfill_docs::{ExtractError, StoreError, TextError};
use rhfill_io::IoError;
use rhfill_recon::ReconError;

use exit_codes::{
    config_exit_code, extract_exit_code, io_exit_code, job_exit_code, recon_exit_code,
    store_exit_code, text_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};
use jobs::JobCommands;

#[derive(Parser)]
#[command(name = "rhfill")]
#[command(about = "Validate RH form submissions and fill the payment registry from their receipts")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Only log warnings and errors (RUST_LOG still wins)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Settings file [default: <config dir>/rhfill/rhfill.toml]
    #[arg(long, global = true, env = "RHFILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flag form rows whose person appears in the registry
    #[command(after_help = "\
Examples:
  rhfill validate --form respuestas.xlsx --registry base.xlsx
  rhfill validate --form respuestas.csv --registry base.xlsx --out validados.csv --json")]
    Validate {
        /// Form submissions table (xlsx, xls, ods, csv)
        #[arg(long)]
        form: PathBuf,

        /// Registry table with a NOMBRE column
        #[arg(long)]
        registry: PathBuf,

        /// Where to write the validated table
        #[arg(long, default_value = pipeline::VALIDATED_FILE)]
        out: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch the receipts of matched rows and extract their text
    #[command(after_help = "\
Examples:
  RHFILL_DRIVE_TOKEN=... rhfill extract --validated DatosValidados.xlsx --workdir work
  rhfill --config mirror.toml extract --validated DatosValidados.xlsx --workdir work")]
    Extract {
        /// Validated table written by `rhfill validate`
        #[arg(long)]
        validated: PathBuf,

        /// Directory receiving pdfs/ and extracted_text/
        #[arg(long)]
        workdir: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fill the registry from the validated table and extracted texts
    #[command(after_help = "\
Examples:
  rhfill fill --validated DatosValidados.xlsx --text-dir work/extracted_text \\
              --registry base.xlsx --out ResultadoFinal.xlsx")]
    Fill {
        /// Validated table written by `rhfill validate`
        #[arg(long)]
        validated: PathBuf,

        /// Directory of <NAME>.txt receipt texts
        #[arg(long)]
        text_dir: PathBuf,

        /// Registry table with a NOMBRE column
        #[arg(long)]
        registry: PathBuf,

        /// Where to write the filled registry
        #[arg(long)]
        out: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate, extract and fill in a new job directory
    #[command(after_help = "\
Examples:
  rhfill run --form respuestas.xlsx --registry base.xlsx
  rhfill run --form respuestas.xlsx --registry base.xlsx --skip-extract --json

The job id printed at the end is what `rhfill bundle --job` expects.")]
    Run {
        /// Form submissions table
        #[arg(long)]
        form: PathBuf,

        /// Registry table with a NOMBRE column
        #[arg(long)]
        registry: PathBuf,

        /// Do not fetch documents; fill from texts already in the job (none for a new job)
        #[arg(long)]
        skip_extract: bool,

        /// Print the job summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Zip a job's final workbook together with its fetched receipts
    #[command(after_help = "\
Examples:
  rhfill bundle --job 6f1c1a52-2f7e-4d7e-9d43-6d3f3c0b8a11 --out resultado.zip")]
    Bundle {
        /// Job id printed by `rhfill run`
        #[arg(long)]
        job: String,

        /// Destination .zip
        #[arg(long)]
        out: PathBuf,
    },

    /// Inspect or clean up job directories
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate { form, registry, out, json } => {
            pipeline::cmd_validate(&form, &registry, &out, json)
        }
        Commands::Extract { validated, workdir, json } => {
            load_settings(config).and_then(|s| pipeline::cmd_extract(&s, &validated, &workdir, json))
        }
        Commands::Fill { validated, text_dir, registry, out, json } => {
            pipeline::cmd_fill(&validated, &text_dir, &registry, &out, json)
        }
        Commands::Run { form, registry, skip_extract, json } => load_settings(config)
            .and_then(|s| pipeline::cmd_run(&s, &form, &registry, skip_extract, json)),
        Commands::Bundle { job, out } => {
            load_settings(config).and_then(|s| jobs::cmd_bundle(&s, &job, &out))
        }
        Commands::Jobs { command } => load_settings(config).and_then(|s| jobs::cmd_jobs(&s, command)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    }
    .map_err(CliError::config)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn table(err: IoError) -> Self {
        let hint = match &err {
            IoError::UnsupportedFormat(_) => Some("use .xlsx, .xls, .ods, .csv or .tsv".to_string()),
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { column, .. } if column == "NOMBRE" => {
                Some("the registry's name column must be headed NOMBRE".to_string())
            }
            ReconError::MissingColumn { .. } | ReconError::InvalidValue { .. } => {
                Some("pass the table written by `rhfill validate`".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn config(err: ConfigError) -> Self {
        Self {
            code: config_exit_code(&err),
            message: err.to_string(),
            hint: Some(format!("default settings file: {}", Settings::config_path().display())),
        }
    }

    pub fn store(err: StoreError) -> Self {
        Self { code: store_exit_code(&err), message: err.to_string(), hint: store_hint(&err) }
    }

    pub fn text(err: TextError) -> Self {
        let hint = match &err {
            TextError::ToolMissing(_) => {
                Some("install poppler-utils or set pdf.pdftotext in the settings file".to_string())
            }
            _ => None,
        };
        Self { code: text_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn extract(err: ExtractError) -> Self {
        let hint = match &err {
            ExtractError::Store(store) => store_hint(store),
            ExtractError::Setup { .. } => None,
        };
        Self { code: extract_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn job(err: JobError) -> Self {
        let hint = match &err {
            JobError::NotFound(_) | JobError::InvalidId(_) => {
                Some("`rhfill jobs list` shows the jobs still on disk".to_string())
            }
            JobError::Expired { .. } => Some("start a new job with `rhfill run`".to_string()),
            _ => None,
        };
        Self { code: job_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Shown when the HTTP store has no usable token.
pub const TOKEN_HINT: &str =
    "export the access token in the variable named by store.token_env (default RHFILL_DRIVE_TOKEN)";

fn store_hint(err: &StoreError) -> Option<String> {
    match err {
        StoreError::Auth { .. } => Some(TOKEN_HINT.to_string()),
        _ => None,
    }
}
