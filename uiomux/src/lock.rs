// SPDX-License-Identifier: Apache-2.0

use nix::fcntl::{flock, FlockArg};
use std::{
    fs::{File, OpenOptions},
    io,
    os::fd::AsRawFd,
    path::Path,
};

/// Exclusive advisory lock on one hardware unit.
///
/// Backed by `flock(2)` on a private open of the unit's device node. Locks on
/// separate opens of the same node exclude each other, whether they belong to
/// one process or several.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    pub fn open(node: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(node)?;
        Ok(Self { file })
    }

    /// Blocks until the lock is held.
    pub fn lock(&self) -> io::Result<()> {
        flock(self.file.as_raw_fd(), FlockArg::LockExclusive)?;
        Ok(())
    }

    /// Takes the lock only if nobody else holds it.
    pub fn try_lock(&self) -> io::Result<bool> {
        match flock(self.file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
            Ok(()) => Ok(true),
            Err(e) if e == nix::errno::Errno::EWOULDBLOCK => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn unlock(&self) -> io::Result<()> {
        flock(self.file.as_raw_fd(), FlockArg::Unlock)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locks_exclude_each_other() {
        let node = std::env::temp_dir().join(format!("uiomux-lock-{}", std::process::id()));
        fs::write(&node, []).unwrap();

        let a = FileLock::open(&node).unwrap();
        let b = FileLock::open(&node).unwrap();

        a.lock().unwrap();
        assert!(!b.try_lock().unwrap());
        a.unlock().unwrap();
        assert!(b.try_lock().unwrap());
        b.unlock().unwrap();

        fs::remove_file(&node).unwrap();
    }
}
