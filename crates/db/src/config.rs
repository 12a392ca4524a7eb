// crates/db/src/config.rs
//! Backend selection, resolved once by the process entry point.

use std::path::PathBuf;
use std::time::Duration;

/// Default request timeout for the hosted replica's HTTP client.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

/// Which store the connection adapter talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Embedded SQLite file on local disk.
    Local { path: PathBuf },
    /// Private in-memory SQLite database, optionally loaded with demo rows.
    Memory { seed_demo: bool },
    /// Hosted libSQL replica reached over HTTP.
    Remote {
        url: String,
        auth_token: Option<String>,
    },
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Local { .. } => "local",
            Self::Memory { .. } => "memory",
            Self::Remote { .. } => "remote",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub backend: BackendKind,
    /// Create missing tables on connect. Always applied for local and memory
    /// backends; opt-in for the hosted replica.
    pub apply_schema: bool,
    pub remote_timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend,
            apply_schema: false,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::new(BackendKind::Local { path: path.into() })
    }

    pub fn memory() -> Self {
        Self::new(BackendKind::Memory { seed_demo: false })
    }

    pub fn memory_seeded() -> Self {
        Self::new(BackendKind::Memory { seed_demo: true })
    }

    pub fn remote(url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self::new(BackendKind::Remote {
            url: url.into(),
            auth_token,
        })
    }

    pub fn with_schema(mut self, apply: bool) -> Self {
        self.apply_schema = apply;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Whether connect should run the inline schema for this backend.
    pub fn should_apply_schema(&self) -> bool {
        match self.backend {
            BackendKind::Local { .. } | BackendKind::Memory { .. } => true,
            BackendKind::Remote { .. } => self.apply_schema,
        }
    }

    /// Endpoint identity for logs and errors. Never includes credentials.
    pub fn endpoint(&self) -> String {
        match &self.backend {
            BackendKind::Local { path } => format!("sqlite:{}", path.display()),
            BackendKind::Memory { .. } => "sqlite::memory:".to_string(),
            BackendKind::Remote { url, .. } => redact_url(url),
        }
    }
}

/// Strip query strings (Turso URLs may carry `?authToken=`) and userinfo.
pub(crate) fn redact_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    match without_query.split_once("://") {
        Some((scheme, rest)) => {
            let (authority, path) = match rest.find('/') {
                Some(idx) => rest.split_at(idx),
                None => (rest, ""),
            };
            let host = authority
                .rsplit_once('@')
                .map(|(_, h)| h)
                .unwrap_or(authority);
            format!("{scheme}://{host}{path}")
        }
        None => without_query.to_string(),
    }
}
