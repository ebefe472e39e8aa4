//! File-based SaveStorage implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{BlobPath, Result, SaveStorage, StorageError};
use crate::types::{FragmentName, SlotIndex};

const HEADER_FILE: &str = "header.json";
const SETTINGS_FILE: &str = "settings.json";
const FRAGMENT_DIR: &str = "fragments";
const FRAGMENT_EXTENSION: &str = "frag";

/// File-based implementation of [`SaveStorage`].
///
/// # File Format
///
/// ```text
/// {base_dir}/
///   ├── settings.json
///   └── slot-{index}/
///       ├── header.json
///       └── fragments/
///           ├── {fragment}.frag
///           └── ...
/// ```
///
/// Every write goes to a temp file first and is renamed into place, so a
/// crash mid-write leaves the previous version of that blob intact.
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_dir`, creating the directory if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir).map_err(StorageError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn slot_dir(&self, slot: SlotIndex) -> PathBuf {
        self.base_dir.join(BlobPath::slot_directory(slot))
    }

    fn fragment_dir(&self, slot: SlotIndex) -> PathBuf {
        self.slot_dir(slot).join(FRAGMENT_DIR)
    }

    /// Map a logical blob path to its file on disk.
    pub fn file_path(&self, path: &BlobPath) -> Result<PathBuf> {
        path.validate()?;
        let file = match path {
            BlobPath::Header(slot) => self.slot_dir(*slot).join(HEADER_FILE),
            BlobPath::Fragment { slot, name } => self
                .fragment_dir(*slot)
                .join(format!("{}.{}", name, FRAGMENT_EXTENSION)),
            BlobPath::UserSettings => self.base_dir.join(SETTINGS_FILE),
        };
        Ok(file)
    }
}

#[async_trait]
impl SaveStorage for FileStorage {
    async fn write_blob(&self, path: &BlobPath, bytes: &[u8]) -> Result<()> {
        let file = self.file_path(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_name = file.clone().into_os_string();
        temp_name.push(".tmp");
        let temp_file = PathBuf::from(temp_name);

        fs::write(&temp_file, bytes).await?;

        // Atomic rename
        fs::rename(&temp_file, &file).await?;

        tracing::debug!("Wrote {} ({} bytes) to {}", path, bytes.len(), file.display());

        Ok(())
    }

    async fn read_blob(&self, path: &BlobPath) -> Result<Option<Vec<u8>>> {
        let file = self.file_path(path)?;

        match fs::read(&file).await {
            Ok(bytes) => {
                tracing::debug!("Read {} ({} bytes)", path, bytes.len());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn list_fragments(&self, slot: SlotIndex) -> Result<Vec<FragmentName>> {
        let mut names = Vec::new();

        let mut entries = match fs::read_dir(self.fragment_dir(slot)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(StorageError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(name) = filename
                    .strip_suffix(FRAGMENT_EXTENSION)
                    .and_then(|s| s.strip_suffix('.'))
            {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    async fn list_slots(&self) -> Result<Vec<SlotIndex>> {
        let mut slots = Vec::new();

        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            if let Some(slot) = entry
                .file_name()
                .to_str()
                .and_then(BlobPath::parse_slot_directory)
            {
                slots.push(slot);
            }
        }

        slots.sort_unstable();
        Ok(slots)
    }

    async fn delete_slot(&self, slot: SlotIndex) -> Result<bool> {
        let dir = self.slot_dir(slot);

        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!("Deleted slot directory: {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
