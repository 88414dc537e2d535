//! The single piece of local storage in the system: one cached autologin
//! token in a file under the user's config directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::warn;

use epicheck_roster::{SessionProvider, Token};

/// Environment override for the token file location.
pub const TOKEN_FILE_ENV: &str = "EPICHECK_TOKEN_FILE";

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Load/save/clear of the cached token file.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$EPICHECK_TOKEN_FILE`, falling back to
    /// `$HOME/.config/epicheck/token`.
    pub fn from_env() -> Self {
        let path = std::env::var_os(TOKEN_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
                home.join(".config").join("epicheck").join("token")
            });
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no token has been cached yet.
    pub fn load(&self) -> io::Result<Option<Token>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Token::new(trimmed)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Persist the token, creating parent directories and restricting the
    /// file to the owner on Unix.
    pub fn save(&self, token: &Token) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.as_str())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// FileSession
// ---------------------------------------------------------------------------

/// `SessionProvider` over the token file.
///
/// The token is read once at construction; `on_session_invalid` drops it
/// from memory and raises a flag the caller can inspect after the operation
/// to prompt for re-login. The file itself is left for the login flow to
/// overwrite.
pub struct FileSession {
    token: Mutex<Option<Token>>,
    invalidated: AtomicBool,
}

impl FileSession {
    pub fn load(store: &TokenStore) -> io::Result<Self> {
        Ok(Self {
            token: Mutex::new(store.load()?),
            invalidated: AtomicBool::new(false),
        })
    }

    pub fn with_token(token: Token) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            invalidated: AtomicBool::new(false),
        }
    }

    /// True once the remote rejected the session during this process run.
    pub fn was_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }
}

impl SessionProvider for FileSession {
    fn token(&self) -> Option<Token> {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn on_session_invalid(&self) {
        warn!("session token rejected by the intranet; re-login required");
        self.invalidated.store(true, Ordering::Release);
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_roundtrips_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("nested").join("token"));
        store.save(&Token::new("abc123")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Token::new("abc123")));
    }

    #[cfg(unix)]
    #[test]
    fn saved_token_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save(&Token::new("abc123")).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        store.save(&Token::new("abc123")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_session_invalidate_drops_token_and_sets_flag() {
        let session = FileSession::with_token(Token::new("abc123"));
        assert!(session.token().is_some());
        assert!(!session.was_invalidated());

        session.on_session_invalid();
        assert!(session.token().is_none());
        assert!(session.was_invalidated());
    }
}
