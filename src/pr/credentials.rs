//! GitHub token lookup.
//!
//! Tokens are looked up in order: an explicit token, the `GITHUB_TOKEN`
//! environment variable, the token store, then (when allowed) an interactive
//! prompt whose answer is saved to the store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dialoguer::{theme::ColorfulTheme, Password};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::TOKEN_ENV;
use crate::error::{Error, Result};

/// Persistent storage for a token.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

/// Token kept in a JSON file readable only by the owner.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        let file: TokenFile = serde_json::from_str(&text)?;
        Ok(Some(file.token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&TokenFile {
            token: token.to_string(),
        })?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        std::io::Write::write_all(&mut file, text.as_bytes())?;

        // `mode` only applies to newly created files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        debug!("Saved token to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory token store.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            token: Mutex::new(token.map(str::to_string)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Resolves the token used for hosting API calls.
pub struct CredentialProvider<'a> {
    explicit: Option<String>,
    store: &'a dyn TokenStore,
    interactive: bool,
}

impl<'a> CredentialProvider<'a> {
    pub fn new(store: &'a dyn TokenStore) -> Self {
        Self {
            explicit: None,
            store,
            interactive: false,
        }
    }

    /// Use `token` ahead of every other source.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.explicit = token.filter(|t| !t.is_empty());
        self
    }

    /// Allow prompting on the terminal as a last resort.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn token(&self) -> Result<String> {
        if let Some(token) = &self.explicit {
            return Ok(token.clone());
        }

        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                debug!("Using token from {}", TOKEN_ENV);
                return Ok(token);
            }
        }

        if let Some(token) = self.store.load()? {
            debug!("Using stored token");
            return Ok(token);
        }

        if self.interactive {
            let token = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("GitHub token")
                .interact()
                .map_err(|e| Error::configuration(format!("cannot read token: {e}")))?;
            self.store.save(&token)?;
            return Ok(token);
        }

        Err(Error::Configuration {
            message: "no GitHub token available".to_string(),
            hint: Some(format!("pass --token or set {TOKEN_ENV}")),
        })
    }

    /// Remove the stored token.
    pub fn forget(&self) -> Result<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard(Option<String>);

    impl EnvGuard {
        fn set(value: Option<&str>) -> Self {
            let previous = std::env::var(TOKEN_ENV).ok();
            match value {
                Some(v) => std::env::set_var(TOKEN_ENV, v),
                None => std::env::remove_var(TOKEN_ENV),
            }
            Self(previous)
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.0 {
                Some(v) => std::env::set_var(TOKEN_ENV, v),
                None => std::env::remove_var(TOKEN_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_explicit_token_wins() {
        let _env = EnvGuard::set(Some("from-env"));
        let store = MemoryTokenStore::new(Some("stored"));
        let provider = CredentialProvider::new(&store).with_token(Some("explicit".into()));
        assert_eq!(provider.token().unwrap(), "explicit");
    }

    #[test]
    #[serial]
    fn test_environment_before_store() {
        let _env = EnvGuard::set(Some("from-env"));
        let store = MemoryTokenStore::new(Some("stored"));
        let provider = CredentialProvider::new(&store).with_token(Some(String::new()));
        assert_eq!(provider.token().unwrap(), "from-env");
    }

    #[test]
    #[serial]
    fn test_store_fallback_and_forget() {
        let _env = EnvGuard::set(None);
        let store = MemoryTokenStore::new(Some("stored"));
        let provider = CredentialProvider::new(&store);
        assert_eq!(provider.token().unwrap(), "stored");

        provider.forget().unwrap();
        let error = provider.token().unwrap_err();
        assert!(error.to_string().contains("no GitHub token"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert_eq!(store.load().unwrap(), None);
        store.save("ghp_example").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("ghp_example"));

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, r#"{"token":"ghp_example"}"#);

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("token.json"));
        store.save("secret").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        assert!(FileTokenStore::new(path).load().is_err());
    }
}
