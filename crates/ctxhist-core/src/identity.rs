//! Shell identity resolution.
//!
//! The (tty, pid) pair partitions storage: every shell process writes only
//! to the store named by its own identifier. Resolution must never fail the
//! caller; a process without a controlling terminal gets the "unknown"
//! sentinel and still receives a usable identifier.

use std::ffi::CStr;

/// Stable identifier for the calling process, computed from its controlling
/// terminal and pid. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellIdentity {
    pub tty: String,
    pub pid: u32,
    pub ppid: u32,
    pub identifier: String,
    pub parent_identifier: Option<String>,
}

impl ShellIdentity {
    /// Resolve the identity of the current process. Pure read of OS state.
    pub fn resolve() -> Self {
        let tty = controlling_tty_name();
        let pid = std::process::id();
        let ppid = unsafe { libc::getppid() } as u32;

        Self {
            identifier: format!("{}_{}", tty, pid),
            parent_identifier: parent_identifier(&tty, ppid),
            tty,
            pid,
            ppid,
        }
    }
}

/// Parent identifier, or `None` when the process has been reparented to
/// init (no traceable parent shell).
fn parent_identifier(tty: &str, ppid: u32) -> Option<String> {
    if ppid == 1 {
        None
    } else {
        Some(format!("{}_{}", tty, ppid))
    }
}

/// Name of the controlling terminal on stdout, sanitized for use inside a
/// filename (`/dev/pts/3` becomes `pts-3`). Falls back to "unknown" when
/// stdout is not a terminal, e.g. running under a pipe.
fn controlling_tty_name() -> String {
    let fd = libc::STDOUT_FILENO;
    if unsafe { libc::isatty(fd) } != 1 {
        return "unknown".to_string();
    }

    // ttyname returns a pointer into static storage; copy it out before any
    // other libc call can clobber it.
    let ptr = unsafe { libc::ttyname(fd) };
    if ptr.is_null() {
        return "unknown".to_string();
    }
    let raw = unsafe { CStr::from_ptr(ptr) };
    match raw.to_str() {
        Ok(path) => sanitize_tty_path(path),
        Err(_) => "unknown".to_string(),
    }
}

fn sanitize_tty_path(path: &str) -> String {
    let trimmed = path.strip_prefix("/dev/").unwrap_or(path);
    trimmed.trim_start_matches('/').replace('/', "-")
}
