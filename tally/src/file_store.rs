//! Slot store backed by one JSON file per key.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tally_core::storage::{SlotStore, StorageError};

/// Keeps each slot in `<root>/<key>.json`
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    root: PathBuf,
}

impl FileSlotStore {
    /// Opens (creating if needed) the directory at `root`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened slot directory");
        Ok(Self { root })
    }

    /// Directory holding the slot files
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys made only of ASCII letters, digits, `-` and `_` are used as-is;
/// anything else is hex-encoded behind a `~` so it cannot escape the root.
fn file_stem(key: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let plain = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if plain {
        return key.to_string();
    }

    let mut out = String::with_capacity(1 + key.len() * 2);
    out.push('~');
    for b in key.bytes() {
        out.push(char::from(HEX[usize::from(b >> 4)]));
        out.push(char::from(HEX[usize::from(b & 0x0f)]));
    }
    out
}

impl SlotStore for FileSlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");

        if let Err(error) = replace_via(&staging, &target, value) {
            match fs::remove_file(&staging) {
                Ok(()) => {},
                Err(cleanup) if cleanup.kind() == io::ErrorKind::NotFound => {},
                Err(cleanup) => {
                    tracing::warn!(
                        path = %staging.display(),
                        error = %cleanup,
                        "Failed to remove staging file"
                    );
                },
            }
            return Err(error.into());
        }

        tracing::trace!(key, bytes = value.len(), "Wrote slot");
        Ok(())
    }
}

/// Writes `value` to `staging`, syncs it, then renames it over `target`
fn replace_via(staging: &Path, target: &Path, value: &str) -> io::Result<()> {
    let mut file = fs::File::create(staging)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(staging, target)
}
