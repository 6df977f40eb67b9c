use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use crate::types::error::{DatabaseError, Result};

/// Advisory lock on a data directory (`flock(2)` on Unix).
///
/// Held for the lifetime of an open `Database`; released automatically when
/// dropped. This keeps two processes from opening the same data directory,
/// which the engine otherwise does not defend against.
#[derive(Debug)]
pub struct DirLock {
    _file: File,
}

impl DirLock {
    const LOCK_FILENAME: &'static str = ".lock";

    /// Try to take the lock without blocking. Fails with `Locked` if another
    /// process holds it.
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(Self::LOCK_FILENAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.try_lock_exclusive()
            .map_err(|_| DatabaseError::Locked {
                path: data_dir.to_path_buf(),
            })?;
        Ok(Self { _file: file })
    }
}
