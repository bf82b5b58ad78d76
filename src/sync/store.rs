//! Positional block I/O and the filesystem calls behind it.
//!
//! Workers never touch a shared file cursor: every read and write names its
//! offset explicitly, so one handle can be read sequentially while writes
//! land behind the read position.

use std::fs::File;
use std::io;

// =============================================================================
// Block storage
// =============================================================================

/// Random-access storage a worker reads blocks from and writes blocks to.
pub(crate) trait BlockStore: Sync {
    /// Read into `buf` at `offset`, returning the number of bytes read.
    /// A return of 0 means end of file.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;

    /// Write all of `buf` at `offset`.
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()>;

    /// Deallocate `[offset, offset + len)` while keeping the file length.
    fn punch_hole(&self, offset: u64, len: u64) -> io::Result<()>;

    /// Truncate or extend to exactly `len` bytes.
    fn set_len(&self, len: u64) -> io::Result<()>;

    /// Hint that `[offset, offset + len)` will be read sequentially.
    fn read_ahead(&self, _offset: u64, _len: u64) -> io::Result<()> {
        Ok(())
    }

    /// Fill `buf` as far as the data goes, looping over short reads.
    ///
    /// Returns fewer than `buf.len()` bytes only at end of file.
    fn read_block(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_at(&mut buf[filled..], offset + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl BlockStore for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::unix::fs::FileExt::read_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        std::os::windows::fs::FileExt::seek_read(self, buf, offset)
    }

    #[cfg(unix)]
    fn write_all_at(&self, buf: &[u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::write_all_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn write_all_at(&self, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        while !buf.is_empty() {
            match self.seek_write(buf, offset) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => {
                    buf = &buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn punch_hole(&self, offset: u64, len: u64) -> io::Result<()> {
        punch_hole(self, offset, len)
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }

    fn read_ahead(&self, offset: u64, len: u64) -> io::Result<()> {
        read_ahead(self, offset, len)
    }
}

// =============================================================================
// Filesystem calls
// =============================================================================

/// Linux-specific: deallocate a range with fallocate(2).
///
/// `FALLOC_FL_KEEP_SIZE` is mandatory with `FALLOC_FL_PUNCH_HOLE`; the
/// file length never changes. Filesystems without hole support answer
/// `EOPNOTSUPP`.
#[cfg(target_os = "linux")]
fn punch_hole(file: &File, offset: u64, len: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let offset = libc::off_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    let len = libc::off_t::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length out of range"))?;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let result = unsafe {
        libc::fallocate(
            file.as_raw_fd(),
            libc::FALLOC_FL_PUNCH_HOLE | libc::FALLOC_FL_KEEP_SIZE,
            offset,
            len,
        )
    };

    if result < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn punch_hole(_file: &File, _offset: u64, _len: u64) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Hole punching not supported on this platform",
    ))
}

/// Advise the kernel that `[offset, offset + len)` will be read sequentially.
///
/// Purely a hint. Callers treat an "unsupported" answer as success.
#[cfg(target_os = "linux")]
fn read_ahead(file: &File, offset: u64, len: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let offset = libc::off_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    let len = libc::off_t::try_from(len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "length out of range"))?;

    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    // posix_fadvise returns the error number instead of setting errno.
    let result =
        unsafe { libc::posix_fadvise(file.as_raw_fd(), offset, len, libc::POSIX_FADV_SEQUENTIAL) };

    if result != 0 {
        return Err(io::Error::from_raw_os_error(result));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn read_ahead(_file: &File, _offset: u64, _len: u64) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "Read-ahead hints not supported on this platform",
    ))
}

// =============================================================================
// Tests
// =============================================================================
