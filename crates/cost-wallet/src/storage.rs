//! Secret storage for the session token.
//!
//! Two backings implement [`SecretStorage`]: a plain in-memory map and an
//! encrypted file. Entries in the file are sealed with ChaCha20-Poly1305
//! under a per-entry key derived from a master key with BLAKE3.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use parking_lot::{Mutex, RwLock};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, WalletError};

/// Key under which the backend bearer token is stored.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Size of the master key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

const FILE_VERSION: u32 = 1;

/// Key/value store for secrets.
pub trait SecretStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backing cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backing cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backing cannot be written.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Unencrypted in-memory storage.
#[derive(Debug, Default)]
pub struct MemorySecretStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySecretStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStorage for MemorySecretStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// Master key for [`EncryptedFileStorage`]. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Generate a random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `Storage` unless `bytes` is exactly [`KEY_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            WalletError::storage(format!("key must be exactly {KEY_SIZE} bytes, got {}", bytes.len()))
        })?;
        Ok(Self { bytes })
    }

    /// Read a base64 key file, creating it with a fresh key if missing.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, written or decoded.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let encoded = Zeroizing::new(fs::read_to_string(path)?);
            let bytes = Zeroizing::new(
                STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| WalletError::storage(format!("invalid key file: {e}")))?,
            );
            return Self::from_bytes(&bytes);
        }

        let key = Self::generate();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = Zeroizing::new(STANDARD.encode(key.bytes));
        fs::write(path, encoded.as_bytes())?;
        restrict_permissions(path)?;
        debug!(path = %path.display(), "generated storage key");
        Ok(key)
    }

    fn derive_for_entry(&self, entry: &str) -> Self {
        let context = format!("cost-wallet secret-storage v1 {entry}");
        Self {
            bytes: blake3::derive_key(&context, &self.bytes),
        }
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305> {
        ChaCha20Poly1305::new_from_slice(&self.bytes)
            .map_err(|e| WalletError::storage(format!("failed to create cipher: {e}")))
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Seal `plaintext` as `nonce || ciphertext || tag`.
fn seal(key: &MasterKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let ciphertext = key
        .cipher()?
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| WalletError::storage(format!("encryption failed: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Open a value produced by [`seal`].
fn open(key: &MasterKey, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(WalletError::storage(format!(
            "sealed value too short: expected at least {} bytes, got {}",
            NONCE_SIZE + TAG_SIZE,
            sealed.len()
        )));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
    key.cipher()?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|e| WalletError::storage(format!("decryption failed: {e}")))
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: BTreeMap<String, String>,
}

/// Storage persisted to an encrypted JSON file.
///
/// Values are sealed individually; keys are stored in the clear.
#[derive(Debug)]
pub struct EncryptedFileStorage {
    path: PathBuf,
    master_key: MasterKey,
    lock: Mutex<()>,
}

impl EncryptedFileStorage {
    /// Use the file at `path`; it is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, master_key: MasterKey) -> Self {
        Self {
            path: path.into(),
            master_key,
            lock: Mutex::new(()),
        }
    }

    /// Path of the storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StorageFile> {
        if !self.path.exists() {
            return Ok(StorageFile {
                version: FILE_VERSION,
                entries: BTreeMap::new(),
            });
        }
        let content = fs::read_to_string(&self.path)?;
        let file: StorageFile = serde_json::from_str(&content)?;
        if file.version != FILE_VERSION {
            return Err(WalletError::storage(format!(
                "unsupported storage file version {}",
                file.version
            )));
        }
        Ok(file)
    }

    fn save(&self, file: &StorageFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(file)?)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SecretStorage for EncryptedFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock();
        let file = self.load()?;
        let Some(encoded) = file.entries.get(key) else {
            return Ok(None);
        };
        let sealed = STANDARD
            .decode(encoded)
            .map_err(|e| WalletError::storage(format!("corrupt entry '{key}': {e}")))?;
        let plaintext = open(&self.master_key.derive_for_entry(key), &sealed)?;
        let value = String::from_utf8(plaintext.to_vec())
            .map_err(|_| WalletError::storage(format!("entry '{key}' is not UTF-8")))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let sealed = seal(&self.master_key.derive_for_entry(key), value.as_bytes())?;
        file.entries.insert(key.to_string(), STANDARD.encode(sealed));
        self.save(&file)?;
        debug!(key, "secret stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        if file.entries.remove(key).is_some() {
            self.save(&file)?;
            debug!(key, "secret deleted");
        }
        Ok(())
    }
}
