//! Per-client session identity.
//!
//! A session id is an opaque capability token: whoever presents it may read
//! and delete the history records created under it. It carries no expiry and
//! no cryptographic binding, so it only scopes access; it does not
//! authenticate anyone.

use anyhow::Context;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const SESSION_PREFIX: &str = "session";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a client-supplied token. Blank tokens are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// `session_<unix millis>_<9 base36 chars>`. Collision-resistant in
    /// practice, not cryptographically secure.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{SESSION_PREFIX}_{millis}_{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-local storage holding exactly one session token.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<SessionId>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(SessionId::parse(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| {
                format!("failed to read session file {}", self.path.display())
            }),
        }
    }

    fn write(&self, id: &SessionId) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.path, id.as_str())
            .with_context(|| format!("failed to write session file {}", self.path.display()))
    }

    /// Returns the stored token, generating and persisting one on first use.
    pub fn get_or_create_session_id(&self) -> anyhow::Result<SessionId> {
        if let Some(existing) = self.read()? {
            return Ok(existing);
        }

        let id = SessionId::generate();
        self.write(&id)?;
        tracing::info!(path = %self.path.display(), "created new session id");
        Ok(id)
    }
}
