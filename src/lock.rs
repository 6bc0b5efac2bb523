//! At most one relocation pass at a time
//!
//! Re-triggering while a pass is running would race two passes over the same
//! windows. The binary holds an exclusive `flock` for the whole pass.

use anyhow::{bail, Context, Result};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::paths;

/// Lock file path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_lock_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(paths::LOCK_FILE));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(paths::LOCK_FILE))
}

/// Released when dropped
pub struct PassLock {
    _lock: Flock<File>,
    path: PathBuf,
}

impl PassLock {
    pub fn acquire() -> Result<Self> {
        Self::acquire_at(default_lock_path()?)
    }

    /// Fails immediately instead of waiting when another pass holds the lock
    pub fn acquire_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create lock directory: {}", parent.display()))?;
        }

        let file = File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .context(format!("Failed to open lock file {}", path.display()))?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                debug!(path = %path.display(), "Acquired relocation lock");
                Ok(Self { _lock: lock, path })
            }
            Err((_, Errno::EWOULDBLOCK)) => {
                bail!("Another relocation pass is already running (lock held on {})", path.display())
            }
            Err((_, errno)) => Err(errno).context(format!("Failed to lock {}", path.display())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
