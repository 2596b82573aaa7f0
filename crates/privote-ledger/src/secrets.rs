//! Voter secret storage
//!
//! The secret is generated on first use and then reused for every vote the
//! voter casts. It stays on the voter's side; stores only ever write it to
//! local storage.

use privote_runtime::{Result, VoterSecret};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub trait SecretStore: Send {
    fn load(&self) -> Result<Option<VoterSecret>>;

    fn store(&mut self, secret: &VoterSecret) -> Result<()>;

    fn load_or_create(&mut self) -> Result<VoterSecret> {
        if let Some(secret) = self.load()? {
            return Ok(secret);
        }

        let secret = VoterSecret::random();
        self.store(&secret)?;
        info!("generated new voter secret");
        Ok(secret)
    }
}

#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secret: Option<VoterSecret>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret: VoterSecret) -> Self {
        Self { secret: Some(secret) }
    }
}

impl SecretStore for MemorySecretStore {
    fn load(&self) -> Result<Option<VoterSecret>> {
        Ok(self.secret.clone())
    }

    fn store(&mut self, secret: &VoterSecret) -> Result<()> {
        self.secret = Some(secret.clone());
        Ok(())
    }
}

/// Keeps the secret as a single hex64 line in a file.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStore for FileSecretStore {
    fn load(&self) -> Result<Option<VoterSecret>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        debug!(path = ?self.path, "loaded voter secret");
        VoterSecret::from_hex(&content).map(Some)
    }

    fn store(&mut self, secret: &VoterSecret) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", secret.to_hex()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}
