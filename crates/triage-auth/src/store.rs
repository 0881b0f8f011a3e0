//! Session token storage
//!
//! A session is exactly two values, the access token and the refresh token,
//! kept under fixed key names. Both are always written and cleared together:
//! every implementation swaps the whole pair under a single lock, so no
//! reader can observe a new access token next to an old refresh token.
//!
//! Storage is synchronous. Nothing here suspends, so the refresh coordinator
//! can read and write the pair without yielding.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Durable key/value storage of the session token pair.
pub trait TokenStore: Send + Sync {
    /// Stored access token, if any.
    fn access(&self) -> Option<String>;

    /// Stored refresh token, if any.
    fn refresh(&self) -> Option<String>;

    /// Replace both tokens.
    fn set(&self, access: &str, refresh: &str) -> Result<()>;

    /// Remove both tokens. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;

    /// Whether an access token is present.
    fn has_session(&self) -> bool {
        self.access().is_some()
    }
}

/// On-disk and in-memory shape of the pair. Field names are the storage keys.
#[derive(Default, Clone, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(
        rename = "tandarust_access_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    access: Option<Secret<String>>,
    #[serde(
        rename = "tandarust_refresh_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    refresh: Option<Secret<String>>,
}

impl StoredTokens {
    fn pair(access: &str, refresh: &str) -> Self {
        Self {
            access: Some(access.into()),
            refresh: Some(refresh.into()),
        }
    }

    fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

fn lock(state: &Mutex<StoredTokens>) -> MutexGuard<'_, StoredTokens> {
    // The guarded value is replaced wholesale, so a poisoned lock still holds a valid pair.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local token store. Tokens are lost on exit.
#[derive(Default)]
pub struct MemoryTokenStore {
    state: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a pair.
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            state: Mutex::new(StoredTokens::pair(access, refresh)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn access(&self) -> Option<String> {
        lock(&self.state).access.as_ref().map(Secret::expose_owned)
    }

    fn refresh(&self) -> Option<String> {
        lock(&self.state).refresh.as_ref().map(Secret::expose_owned)
    }

    fn set(&self, access: &str, refresh: &str) -> Result<()> {
        *lock(&self.state) = StoredTokens::pair(access, refresh);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *lock(&self.state) = StoredTokens::default();
        Ok(())
    }
}

/// JSON-file token store.
///
/// The file holds a single object keyed by `ACCESS_TOKEN_KEY` and
/// `REFRESH_TOKEN_KEY`. Writes go to a temp file that is renamed over the
/// target, with 0600 permissions since the file contains bearer credentials.
/// The in-memory copy only changes after the file write succeeds.
pub struct FileTokenStore {
    path: PathBuf,
    state: Mutex<StoredTokens>,
}

impl FileTokenStore {
    /// Open the token file, creating an empty one (and its directory) if missing.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Io(format!("reading token file: {e}")))?;
            let tokens: StoredTokens = serde_json::from_str(&contents)
                .map_err(|e| Error::StoreParse(format!("parsing token file: {e}")))?;
            debug!(path = %path.display(), has_session = tokens.access.is_some(), "loaded token file");
            tokens
        } else {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .map_err(|e| Error::Io(format!("creating token directory: {e}")))?;
            }
            info!(path = %path.display(), "token file not found, starting without a session");
            let tokens = StoredTokens::default();
            write_atomic(&path, &tokens)?;
            tokens
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn access(&self) -> Option<String> {
        lock(&self.state).access.as_ref().map(Secret::expose_owned)
    }

    fn refresh(&self) -> Option<String> {
        lock(&self.state).refresh.as_ref().map(Secret::expose_owned)
    }

    fn set(&self, access: &str, refresh: &str) -> Result<()> {
        let mut state = lock(&self.state);
        let next = StoredTokens::pair(access, refresh);
        write_atomic(&self.path, &next)?;
        *state = next;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.is_empty() {
            return Ok(());
        }
        let next = StoredTokens::default();
        write_atomic(&self.path, &next)?;
        *state = next;
        Ok(())
    }
}

/// Write the pair to `path` via temp file + rename.
fn write_atomic(path: &Path, tokens: &StoredTokens) -> Result<()> {
    let json = serde_json::to_string_pretty(tokens)
        .map_err(|e| Error::StoreParse(format!("serializing tokens: {e}")))?;

    let dir = path
        .parent()
        .map(|d| if d.as_os_str().is_empty() { Path::new(".") } else { d })
        .ok_or_else(|| Error::Io("token path has no parent directory".into()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tokens.json");
    let tmp_path = dir.join(format!(".{file_name}.tmp.{}", std::process::id()));

    // A leftover temp file from a crashed write may carry a wider mode
    match std::fs::remove_file(&tmp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(Error::Io(format!("removing stale temp token file: {e}"))),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&tmp_path)
        .map_err(|e| Error::Io(format!("creating temp token file: {e}")))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;
    drop(file);

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), "persisted session tokens");
    Ok(())
}
