// Job store: one directory per pipeline run, with a JSON manifest
//
// Layout:
//   <root>/<uuid>/job.json       manifest
//   <root>/<uuid>/...            inputs copied in, stage outputs, pdfs/, extracted_text/

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MANIFEST: &str = "job.json";
/// A century; keeps expiry arithmetic in range.
const MAX_TTL_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug)]
pub enum JobError {
    /// Not a job identifier.
    InvalidId(String),
    NotFound(String),
    Expired { id: String, expired_at: DateTime<Utc> },
    /// Manifest missing or unreadable.
    Corrupt { id: String, message: String },
    Io(String),
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId(id) => write!(f, "'{id}' is not a job id"),
            Self::NotFound(id) => write!(f, "job {id} not found"),
            Self::Expired { id, expired_at } => {
                write!(f, "job {id} expired at {}", expired_at.format("%Y-%m-%d %H:%M UTC"))
            }
            Self::Corrupt { id, message } => write!(f, "job {id} is corrupt: {message}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for JobError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobManifest {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Named input files, e.g. `form`, `registry`.
    #[serde(default)]
    pub inputs: BTreeMap<String, PathBuf>,
    /// Named outputs relative to the job directory, e.g. `validated`, `final`.
    #[serde(default)]
    pub outputs: BTreeMap<String, PathBuf>,
}

impl JobManifest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// An open job directory.
#[derive(Debug, Clone)]
pub struct Job {
    dir: PathBuf,
    manifest: JobManifest,
}

impl Job {
    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &JobManifest {
        &self.manifest
    }

    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.join(relative)
    }

    pub fn record_input(&mut self, name: &str, path: &Path) {
        self.manifest.inputs.insert(name.to_string(), path.to_path_buf());
    }

    /// Record an output stored inside the job directory.
    pub fn record_output(&mut self, name: &str, relative: impl AsRef<Path>) {
        self.manifest.outputs.insert(name.to_string(), relative.as_ref().to_path_buf());
    }

    /// Absolute path of a recorded output.
    pub fn output(&self, name: &str) -> Option<PathBuf> {
        self.manifest.outputs.get(name).map(|rel| self.dir.join(rel))
    }

    pub fn save(&self) -> Result<(), JobError> {
        write_manifest(&self.dir, &self.manifest)
    }
}

pub struct JobStore {
    root: PathBuf,
    ttl: Duration,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>, ttl_hours: u64) -> Self {
        let hours = i64::try_from(ttl_hours).unwrap_or(MAX_TTL_HOURS).min(MAX_TTL_HOURS);
        Self { root: root.into(), ttl: Duration::hours(hours) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create(&self) -> Result<Job, JobError> {
        self.create_at(Utc::now())
    }

    pub fn create_at(&self, now: DateTime<Utc>) -> Result<Job, JobError> {
        let id = Uuid::new_v4().to_string();
        let dir = self.root.join(&id);
        fs::create_dir_all(&dir)
            .map_err(|e| JobError::Io(format!("cannot create {}: {e}", dir.display())))?;

        let manifest = JobManifest {
            id,
            created_at: now,
            expires_at: now + self.ttl,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        };
        write_manifest(&dir, &manifest)?;
        log::info!("created job {} in {}", manifest.id, dir.display());
        Ok(Job { dir, manifest })
    }

    pub fn open(&self, id: &str) -> Result<Job, JobError> {
        self.open_at(id, Utc::now())
    }

    /// Open a job as of `now`. Expired jobs are refused even if their
    /// directory has not been purged yet.
    pub fn open_at(&self, id: &str, now: DateTime<Utc>) -> Result<Job, JobError> {
        let id = Uuid::parse_str(id.trim())
            .map_err(|_| JobError::InvalidId(id.to_string()))?
            .to_string();
        let dir = self.root.join(&id);
        if !dir.is_dir() {
            return Err(JobError::NotFound(id));
        }
        let manifest = read_manifest(&dir, &id)?;
        if manifest.is_expired(now) {
            return Err(JobError::Expired { id, expired_at: manifest.expires_at });
        }
        Ok(Job { dir, manifest })
    }

    /// Every readable job manifest, oldest first. Unreadable job
    /// directories are logged and skipped.
    pub fn list(&self) -> Result<Vec<JobManifest>, JobError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root)
            .map_err(|e| JobError::Io(format!("cannot list {}: {e}", self.root.display())))?;

        let mut manifests = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            if !path.is_dir() || Uuid::parse_str(name).is_err() {
                continue;
            }
            match read_manifest(&path, name) {
                Ok(m) => manifests.push(m),
                Err(e) => log::warn!("{e}"),
            }
        }
        manifests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(manifests)
    }

    /// Delete every job expired as of `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, JobError> {
        let mut removed = 0;
        for manifest in self.list()? {
            if !manifest.is_expired(now) {
                continue;
            }
            let dir = self.root.join(&manifest.id);
            match fs::remove_dir_all(&dir) {
                Ok(()) => {
                    log::info!("purged expired job {}", manifest.id);
                    removed += 1;
                }
                Err(e) => log::warn!("cannot remove {}: {e}", dir.display()),
            }
        }
        Ok(removed)
    }
}

fn write_manifest(dir: &Path, manifest: &JobManifest) -> Result<(), JobError> {
    let json = serde_json::to_string_pretty(manifest).map_err(|e| JobError::Io(e.to_string()))?;
    let path = dir.join(MANIFEST);
    fs::write(&path, json).map_err(|e| JobError::Io(format!("cannot write {}: {e}", path.display())))
}

fn read_manifest(dir: &Path, id: &str) -> Result<JobManifest, JobError> {
    let corrupt = |message: String| JobError::Corrupt { id: id.to_string(), message };
    let contents = fs::read_to_string(dir.join(MANIFEST)).map_err(|e| corrupt(e.to_string()))?;
    serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))
}
