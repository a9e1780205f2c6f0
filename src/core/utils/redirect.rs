// src/core/utils/redirect.rs

//! Scoped redirection of a standard stream to a file.
//!
//! The guard swaps the stream's file descriptor on construction and restores
//! the original on drop, so the redirection holds for exactly the scope of
//! the guard on every exit path, including early returns and panics.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, RawFd};

pub struct StdioRedirect {
    stream_fd: RawFd,
    saved_fd: RawFd,
}

impl StdioRedirect {
    fn new(stream_fd: RawFd, target: &File) -> io::Result<Self> {
        // SAFETY: dup/dup2 on descriptors we own; failures are checked.
        let saved_fd = unsafe { libc::dup(stream_fd) };
        if saved_fd < 0 {
            return Err(io::Error::last_os_error());
        }
        if unsafe { libc::dup2(target.as_raw_fd(), stream_fd) } < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(saved_fd) };
            return Err(err);
        }
        Ok(Self { stream_fd, saved_fd })
    }

    /// Redirects stdout into `target` until the guard drops.
    pub fn stdout_to(target: &File) -> io::Result<Self> {
        Self::new(libc::STDOUT_FILENO, target)
    }

    /// Redirects stderr into `target` until the guard drops.
    pub fn stderr_to(target: &File) -> io::Result<Self> {
        Self::new(libc::STDERR_FILENO, target)
    }
}

impl Drop for StdioRedirect {
    fn drop(&mut self) {
        // SAFETY: restoring the descriptor saved in new().
        unsafe {
            libc::dup2(self.saved_fd, self.stream_fd);
            libc::close(self.saved_fd);
        }
    }
}
