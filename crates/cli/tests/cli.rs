// End-to-end tests for the `rhfill` binary.
// Run with: cargo test -p rhfill-cli --test cli -- --nocapture

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn rhfill() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rhfill"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RHFILL_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Settings file keeping jobs inside `dir`.
fn config_in(dir: &Path, extra: &str) -> PathBuf {
    let jobs = dir.join("jobs");
    let path = dir.join("rhfill.toml");
    let body = format!("[jobs]\nroot = {:?}\nttl_hours = 1\n{extra}", jobs.display().to_string());
    fs::write(&path, body).unwrap();
    path
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

// -------------------------------------------------------------------------
// validate / fill
// -------------------------------------------------------------------------

#[test]
fn validate_then_fill() {
    let dir = tempfile::tempdir().unwrap();
    let validated = dir.path().join("DatosValidados.xlsx");
    let result = dir.path().join("ResultadoFinal.csv");

    let out = rhfill()
        .args(["validate", "--json", "--form"])
        .arg(fixture("form.csv"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .arg("--out")
        .arg(&validated)
        .output()
        .unwrap();
    assert_exit(&out, 0);
    let json = stdout_json(&out);
    assert_eq!(json["report"]["form_rows"], 2);
    assert_eq!(json["report"]["matched"], 1);
    assert!(validated.is_file());

    let out = rhfill()
        .args(["fill", "--validated"])
        .arg(&validated)
        .arg("--text-dir")
        .arg(fixture("texts"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .arg("--out")
        .arg(&result)
        .output()
        .unwrap();
    assert_exit(&out, 0);

    let table = rhfill_io::read_table(&result, None).unwrap();
    assert_eq!(table.get(0, "NOMBRE"), Some("LOPEZ ANA"));
    assert_eq!(table.get(0, "NRO SERIE"), Some("E001"));
    assert_eq!(table.get(0, "NRO RECIBO"), Some("42"));
    assert_eq!(table.get(0, "FECHA DE EMISION"), Some("05/03/2024"));
    assert_eq!(table.get(0, "IMPORTE"), Some("1234.50"));
    assert_eq!(table.get(0, "BANCO"), Some("BCP"));
    assert_eq!(table.get(1, "NOMBRE"), Some("PEREZ CARLA"));
    assert_eq!(table.get(1, "FECHA DE EMISION"), Some(""));
}

#[test]
fn missing_registry_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = rhfill()
        .args(["validate", "--form"])
        .arg(fixture("form.csv"))
        .args(["--registry", "/nonexistent/base.xlsx", "--out"])
        .arg(dir.path().join("v.xlsx"))
        .output()
        .unwrap();
    assert_exit(&out, 3);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error:"), "{stderr}");
    assert!(stderr.contains("base.xlsx"), "{stderr}");
}

#[test]
fn fill_rejects_a_table_that_was_not_validated() {
    let dir = tempfile::tempdir().unwrap();
    let out = rhfill()
        .args(["fill", "--validated"])
        .arg(fixture("form.csv"))
        .arg("--text-dir")
        .arg(fixture("texts"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .arg("--out")
        .arg(dir.path().join("r.xlsx"))
        .output()
        .unwrap();
    assert_exit(&out, 4);
    assert!(String::from_utf8_lossy(&out.stderr).contains("hint:"));
}

// -------------------------------------------------------------------------
// run / jobs / bundle
// -------------------------------------------------------------------------

#[test]
fn run_creates_a_job_that_can_be_bundled() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "");

    let out = rhfill()
        .arg("--config")
        .arg(&config)
        .args(["run", "--skip-extract", "--json", "--form"])
        .arg(fixture("form.csv"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .output()
        .unwrap();
    assert_exit(&out, 0);
    let json = stdout_json(&out);
    let job = json["job"].as_str().unwrap().to_string();
    assert!(json["extraction"].is_null());
    assert_eq!(json["validation"]["matched"], 1);
    assert_eq!(json["fill"]["filled"], 1);
    assert_eq!(json["fill"]["missing_texts"], 1);

    let job_dir = dir.path().join("jobs").join(&job);
    assert!(job_dir.join("job.json").is_file());
    assert!(job_dir.join("DatosValidados.xlsx").is_file());
    let final_table = rhfill_io::read_table(&job_dir.join("ResultadoFinal.xlsx"), None).unwrap();
    assert_eq!(final_table.get(0, "NRO DE DOCUMENTO"), Some("12345678"));

    let out = rhfill().arg("--config").arg(&config).args(["jobs", "list", "--json"]).output().unwrap();
    assert_exit(&out, 0);
    let listed = stdout_json(&out);
    assert_eq!(listed["jobs"][0]["id"], job.as_str());
    assert_eq!(listed["jobs"][0]["expired"], false);

    let zip_path = dir.path().join("resultado.zip");
    let out = rhfill()
        .arg("--config")
        .arg(&config)
        .args(["bundle", "--job", &job, "--out"])
        .arg(&zip_path)
        .output()
        .unwrap();
    assert_exit(&out, 0);

    let archive = zip::ZipArchive::new(fs::File::open(&zip_path).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert_eq!(names, vec!["ResultadoFinal.xlsx"]);
}

#[test]
fn unknown_job_exits_20() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "");
    let out = rhfill()
        .arg("--config")
        .arg(&config)
        .args(["bundle", "--job", "6f1c1a52-2f7e-4d7e-9d43-6d3f3c0b8a11", "--out"])
        .arg(dir.path().join("x.zip"))
        .output()
        .unwrap();
    assert_exit(&out, 20);
    assert!(String::from_utf8_lossy(&out.stderr).contains("jobs list"));
}

#[test]
fn purge_on_empty_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "");
    let out = rhfill().arg("--config").arg(&config).args(["jobs", "purge"]).output().unwrap();
    assert_exit(&out, 0);
    assert!(String::from_utf8_lossy(&out.stdout).contains("removed 0"));
}

// -------------------------------------------------------------------------
// settings / setup failures
// -------------------------------------------------------------------------

#[test]
fn invalid_settings_exit_6() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("rhfill.toml");
    fs::write(&config, "[store]\nkind = \"dir\"\n").unwrap();

    let out = rhfill().arg("--config").arg(&config).args(["jobs", "list"]).output().unwrap();
    assert_exit(&out, 6);
    assert!(String::from_utf8_lossy(&out.stderr).contains("mirror_dir"));
}

#[test]
fn missing_pdftotext_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(
        dir.path(),
        "[pdf]\npdftotext = \"definitely-not-pdftotext-rhfill\"\n",
    );
    let validated = dir.path().join("DatosValidados.xlsx");
    let out = rhfill()
        .args(["validate", "--form"])
        .arg(fixture("form.csv"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .arg("--out")
        .arg(&validated)
        .output()
        .unwrap();
    assert_exit(&out, 0);

    let out = rhfill()
        .env("RHFILL_DRIVE_TOKEN", "tok_123")
        .arg("--config")
        .arg(&config)
        .args(["extract", "--validated"])
        .arg(&validated)
        .arg("--workdir")
        .arg(dir.path().join("work"))
        .output()
        .unwrap();
    assert_exit(&out, 11);
    assert!(String::from_utf8_lossy(&out.stderr).contains("poppler"));
}

#[test]
fn missing_store_token_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "[store]\ntoken_env = \"RHFILL_TEST_TOKEN_UNSET\"\n");

    let out = rhfill()
        .env_remove("RHFILL_TEST_TOKEN_UNSET")
        .arg("--config")
        .arg(&config)
        .args(["run", "--form"])
        .arg(fixture("form.csv"))
        .arg("--registry")
        .arg(fixture("registry.csv"))
        .output()
        .unwrap();
    assert_exit(&out, 10);
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("RHFILL_TEST_TOKEN_UNSET is not set"), "{stderr}");
    assert!(stderr.contains("hint:"), "{stderr}");
}
