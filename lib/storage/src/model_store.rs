// Directory-backed store for serialized model blobs
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "model";
const DESCRIPTION_EXTENSION: &str = "json";

/// Blob description, stored beside each blob and printed by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDescription {
    pub name: String,
    pub size: u64,
    /// Hex sha256 of the stored bytes
    pub checksum: String,
    /// RFC 3339, UTC
    pub created_at: String,
}

pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create model store at {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{name}.{BLOB_EXTENSION}")))
    }

    fn description_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(format!("{name}.{DESCRIPTION_EXTENSION}")))
    }

    fn read_description(&self, name: &str) -> Result<Option<BlobDescription>> {
        let path = self.description_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)
            .with_context(|| format!("failed to read description of '{name}'"))?;
        let description = serde_json::from_slice(&raw)
            .with_context(|| format!("description of '{name}' is not valid JSON"))?;
        Ok(Some(description))
    }

    /// Store `bytes` under `name`, replacing any previous blob atomically.
    ///
    /// The returned description is also written beside the blob, and
    /// [`ModelStore::load`] checks the blob against its checksum.
    pub fn save(&self, name: &str, bytes: &[u8]) -> Result<BlobDescription> {
        let path = self.blob_path(name)?;
        let description = BlobDescription {
            name: name.to_string(),
            size: bytes.len() as u64,
            checksum: checksum(bytes),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let encoded = serde_json::to_vec_pretty(&description)?;

        AtomicFile::new(&path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(bytes))
            .with_context(|| format!("failed to write blob '{name}'"))?;
        AtomicFile::new(self.description_path(name)?, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&encoded))
            .with_context(|| format!("failed to write description of '{name}'"))?;

        tracing::info!(
            name,
            size = description.size,
            checksum = %description.checksum,
            "blob saved"
        );
        Ok(description)
    }

    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(name)?;
        if !path.exists() {
            return Err(anyhow!("model '{}' not found in {}", name, self.root.display()));
        }
        let bytes = fs::read(&path).with_context(|| format!("failed to read blob '{name}'"))?;

        let expected = self
            .read_description(name)?
            .ok_or_else(|| anyhow!("model '{}' has no recorded checksum", name))?;
        let actual = checksum(&bytes);
        if actual != expected.checksum {
            return Err(anyhow!(
                "checksum mismatch for model '{}': expected {}, got {}",
                name,
                expected.checksum,
                actual
            ));
        }

        tracing::info!(name, size = bytes.len(), "blob loaded");
        Ok(bytes)
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.blob_path(name)?.exists())
    }

    pub fn describe(&self, name: &str) -> Result<Option<BlobDescription>> {
        let path = self.blob_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        match self.read_description(name)? {
            Some(description) => Ok(Some(description)),
            None => describe_file(name, &path).map(Some),
        }
    }

    /// Delete a blob and its description; returns whether the blob existed.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.blob_path(name)?;
        let description_path = self.description_path(name)?;
        if description_path.exists() {
            fs::remove_file(&description_path)?;
        }
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!(name, "blob deleted");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// All stored blobs, sorted by name.
    pub fn list(&self) -> Result<Vec<BlobDescription>> {
        let mut blobs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_name(name).is_err() {
                continue;
            }
            if let Some(description) = self.describe(name)? {
                blobs.push(description);
            }
        }
        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow!("model name must not be empty"));
    }
    if name.starts_with('.') {
        return Err(anyhow!("model name '{}' must not start with '.'", name));
    }
    if name.contains(['/', '\\']) || name.contains('\0') {
        return Err(anyhow!("model name '{}' must not contain path separators", name));
    }
    Ok(())
}

fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

fn describe_file(name: &str, path: &Path) -> Result<BlobDescription> {
    let bytes = fs::read(path).with_context(|| format!("failed to read blob '{name}'"))?;
    let modified: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    Ok(BlobDescription {
        name: name.to_string(),
        size: bytes.len() as u64,
        checksum: checksum(&bytes),
        created_at: modified.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
