//! Process liveness probing.
//!
//! A lifecycle marker's presence does not guarantee its shell is alive, so
//! every consumer re-verifies through this trait. Kept behind an interface
//! so sweeps can be tested against fake process tables.

/// Zero-effect liveness check for a process id.
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe backed by `kill(pid, 0)`.
pub struct UnixProcessProbe;

impl ProcessProbe for UnixProcessProbe {
    fn is_alive(&self, pid: u32) -> bool {
        let pid_t: libc::pid_t = match pid.try_into() {
            Ok(p) => p,
            Err(_) => return false,
        };

        if unsafe { libc::kill(pid_t, 0) } == 0 {
            return true;
        }

        // EPERM means the process exists but belongs to another user; treat
        // it as alive so we never reclaim a store we cannot verify.
        let err = std::io::Error::last_os_error();
        matches!(err.raw_os_error(), Some(libc::EPERM))
    }
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashSet;

    /// Probe with a fixed set of "alive" pids.
    #[derive(Default)]
    pub struct FakeProbe {
        alive: HashSet<u32>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_alive(mut self, pid: u32) -> Self {
            self.alive.insert(pid);
            self
        }
    }

    impl ProcessProbe for FakeProbe {
        fn is_alive(&self, pid: u32) -> bool {
            self.alive.contains(&pid)
        }
    }
}
