// SPDX-License-Identifier: Apache-2.0

use std::{
    io,
    sync::{Arc, Condvar, Mutex},
};
use uiomux::FileLock;

/// Mutual exclusion over one physical engine.
///
/// Every handle driving the same unit must hold an implementation that
/// excludes all the others. The lock is taken before the first register
/// write of a transform and released after its completion is acknowledged,
/// which may be several calls later.
pub trait UnitLock {
    /// Blocks until this handle owns the unit.
    fn acquire(&self) -> io::Result<()>;

    fn release(&self) -> io::Result<()>;
}

impl UnitLock for FileLock {
    fn acquire(&self) -> io::Result<()> {
        self.lock()
    }

    fn release(&self) -> io::Result<()> {
        self.unlock()
    }
}

impl<L: UnitLock + ?Sized> UnitLock for Arc<L> {
    fn acquire(&self) -> io::Result<()> {
        (**self).acquire()
    }

    fn release(&self) -> io::Result<()> {
        (**self).release()
    }
}

/// In-process unit lock for handles that share a register block without a
/// device node, such as simulated engines.
///
/// Share it between handles through an [`Arc`].
#[derive(Debug, Default)]
pub struct ProcessLock {
    held: Mutex<bool>,
    available: Condvar,
}

impl ProcessLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitLock for ProcessLock {
    fn acquire(&self) -> io::Result<()> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| io::Error::other("unit lock poisoned"))?;
        while *held {
            held = self
                .available
                .wait(held)
                .map_err(|_| io::Error::other("unit lock poisoned"))?;
        }
        *held = true;
        Ok(())
    }

    fn release(&self) -> io::Result<()> {
        let mut held = self
            .held
            .lock()
            .map_err(|_| io::Error::other("unit lock poisoned"))?;
        *held = false;
        self.available.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::Duration,
    };

    #[test]
    fn test_process_lock_excludes() {
        let lock = Arc::new(ProcessLock::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let lock = lock.clone();
                let inside = inside.clone();
                let peak = peak.clone();
                thread::spawn(move || {
                    for _ in 0..20 {
                        lock.acquire().unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(50));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        lock.release().unwrap();
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
