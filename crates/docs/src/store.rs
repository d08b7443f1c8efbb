// Remote document stores
//
// A store downloads one document by identifier to a local path. Downloads
// land in a `.part` file first and are renamed on success, so an existing
// destination is always a complete document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::StoreError;

pub const USER_AGENT: &str = concat!("rhfill/", env!("CARGO_PKG_VERSION"));

/// Longest server message kept in an error.
const MAX_ERROR_BODY: usize = 200;

pub trait DocumentStore {
    /// Download document `id` to `dest`. Returns the number of bytes written.
    fn fetch(&self, id: &str, dest: &Path) -> Result<u64, StoreError>;
}

// ── HTTP ────────────────────────────────────────────────────────────

/// Blocking HTTP store. The URL comes from a template with an `{id}`
/// placeholder; requests carry a bearer token when one is configured.
pub struct HttpDocumentStore {
    http: reqwest::blocking::Client,
    url_template: String,
    token: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(
        url_template: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        if !url_template.contains("{id}") {
            return Err(StoreError::Config(format!(
                "url template '{url_template}' has no {{id}} placeholder"
            )));
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, url_template: url_template.to_string(), token })
    }

    /// Like [`new`](Self::new), reading the bearer token from environment
    /// variable `token_env`. An unset or blank variable is a configuration
    /// error: the store cannot serve anything without credentials.
    pub fn from_env(
        url_template: &str,
        token_env: &str,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let token = std::env::var(token_env)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StoreError::Config(format!("{token_env} is not set")))?;
        Self::new(url_template, Some(token), timeout)
    }

    /// Request URL for `id`. Every byte outside the unreserved set is
    /// percent-encoded, so the id stays one path segment or query value.
    pub fn url_for(&self, id: &str) -> String {
        self.url_template.replace("{id}", &urlencoding::encode(id))
    }
}

impl DocumentStore for HttpDocumentStore {
    fn fetch(&self, id: &str, dest: &Path) -> Result<u64, StoreError> {
        let url = self.url_for(id);
        let mut request = self.http.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let mut response = request.send().map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(format!("GET {url}"))
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            let message = truncate(body.trim(), MAX_ERROR_BODY);
            return Err(match status {
                401 | 403 => StoreError::Auth { status, message },
                404 => StoreError::NotFound(id.to_string()),
                _ => StoreError::Http(status, message),
            });
        }

        write_atomically(dest, |file| {
            response.copy_to(file).map_err(|e| {
                if e.is_timeout() {
                    StoreError::Timeout(format!("GET {url}"))
                } else {
                    StoreError::Network(e.to_string())
                }
            })
        })
    }
}

// ── Local mirror ────────────────────────────────────────────────────

/// Documents already on disk, named `<id>` or `<id>.pdf` under `root`.
#[derive(Debug, Clone)]
pub struct DirDocumentStore {
    root: PathBuf,
}

impl DirDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::Config(format!("mirror directory {} does not exist", root.display())));
        }
        Ok(Self { root })
    }
}

impl DocumentStore for DirDocumentStore {
    fn fetch(&self, id: &str, dest: &Path) -> Result<u64, StoreError> {
        if id.contains(|c| c == '/' || c == '\\') || id == ".." {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let source = [self.root.join(id), self.root.join(format!("{id}.pdf"))]
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        write_atomically(dest, |file| {
            let mut input = fs::File::open(&source).map_err(|e| StoreError::Io(e.to_string()))?;
            std::io::copy(&mut input, file).map_err(|e| StoreError::Io(e.to_string()))
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn write_atomically(
    dest: &Path,
    write: impl FnOnce(&mut fs::File) -> Result<u64, StoreError>,
) -> Result<u64, StoreError> {
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let mut file = fs::File::create(&part)
        .map_err(|e| StoreError::Io(format!("cannot create {}: {e}", part.display())))?;
    let written = match write(&mut file) {
        Ok(n) => n,
        Err(e) => {
            drop(file);
            let _ = fs::remove_file(&part);
            return Err(e);
        }
    };
    drop(file);
    fs::rename(&part, dest)
        .map_err(|e| StoreError::Io(format!("cannot move {} into place: {e}", part.display())))?;
    Ok(written)
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
