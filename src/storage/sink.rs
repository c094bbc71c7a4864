use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use memmap2::{Advice, MmapMut, MmapOptions};
use thiserror::Error;

use crate::core::messages::ParsedMessage;

/// Page alignment required by direct I/O; also the bounce-buffer alignment.
pub const DIRECT_ALIGNMENT: usize = 4096;

/// Initial size of the memory-mapped sink file. Grown by doubling.
const INITIAL_MMAP_LEN: u64 = 1024 * 1024 * 1024;

/// How records reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Store into a shared writable mapping of the sink file.
    Mmap,
    /// Page-aligned writes that bypass the page cache (`O_DIRECT`).
    Direct,
    /// Standard buffered writes through the page cache.
    Buffered,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to size {path:?} to {len} bytes: {source}")]
    Allocate {
        path: PathBuf,
        len: u64,
        #[source]
        source: io::Error,
    },
    #[error("failed to map {path:?}: {source}")]
    Map {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write failed: {0}")]
    Write(#[from] io::Error),
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },
}

// Page-aligned heap buffer for direct and buffered writes.
struct AlignedBuf {
    ptr: NonNull<u8>,
    layout: Layout,
}

unsafe impl Send for AlignedBuf {}

impl AlignedBuf {
    fn zeroed(size: usize) -> Self {
        assert!(
            size >= DIRECT_ALIGNMENT && size % DIRECT_ALIGNMENT == 0,
            "buffer size must be a positive multiple of {}",
            DIRECT_ALIGNMENT
        );
        let layout = Layout::from_size_align(size, DIRECT_ALIGNMENT).expect("buffer layout");
        let raw = unsafe { alloc_zeroed(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            handle_alloc_error(layout);
        };
        Self { ptr, layout }
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.layout.size()
    }

    #[inline(always)]
    fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// Exclusive owner of the sink file between `open` and `finalize`.
///
/// One thread drives a sink; the writer worker holds it for the lifetime
/// of the pipeline. Write failures after open are counted and logged but
/// never tear the sink down.
pub struct FileSink {
    file: File,
    path: PathBuf,
    mode: WriteMode,
    mmap: Option<MmapMut>,
    mapped_len: u64,
    buffer: AlignedBuf,
    cursor: usize,
    total_written: Arc<AtomicU64>,
    write_errors: Arc<AtomicU64>,
}

impl FileSink {
    /// Opens (create + truncate) the sink file for the given mode.
    ///
    /// `buffer_size` sizes the bounce buffer and must be a positive
    /// multiple of [`DIRECT_ALIGNMENT`]. For `Mmap` the file is
    /// pre-extended and mapped here; any failure is fatal to the open.
    pub fn open(
        path: &Path,
        mode: WriteMode,
        buffer_size: usize,
        total_written: Arc<AtomicU64>,
        write_errors: Arc<AtomicU64>,
    ) -> Result<FileSink, SinkError> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(true);
        #[cfg(target_os = "linux")]
        if mode == WriteMode::Direct {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_DIRECT);
        }

        let file = options.open(path).map_err(|source| SinkError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut sink = FileSink {
            file,
            path: path.to_path_buf(),
            mode,
            mmap: None,
            mapped_len: 0,
            buffer: AlignedBuf::zeroed(buffer_size),
            cursor: 0,
            total_written,
            write_errors,
        };

        if mode == WriteMode::Mmap {
            sink.map(INITIAL_MMAP_LEN)?;
        }

        Ok(sink)
    }

    /// Appends one record. Errors are absorbed into the failure counter.
    pub fn write_record(&mut self, msg: &ParsedMessage) {
        match self.mode {
            WriteMode::Mmap => self.write_record_mmap(msg),
            WriteMode::Direct | WriteMode::Buffered => self.write_record_buffered(msg),
        }
    }

    /// Pushes buffered bytes to the file. A no-op for `Mmap`, whose stores
    /// already landed in the mapping.
    pub fn flush(&mut self) {
        if let Err(e) = self.flush_inner() {
            self.record_failure(&e);
        }
    }

    /// Flushes, then closes the sink. For `Mmap` the mapping is synced and
    /// unmapped and the file truncated to the exact written length.
    pub fn finalize(mut self) {
        self.flush();

        if self.mode == WriteMode::Mmap {
            if let Some(mmap) = self.mmap.take() {
                if let Err(e) = mmap.flush() {
                    tracing::error!("failed to sync mapping for {}: {}", self.path.display(), e);
                    self.write_errors.fetch_add(1, Ordering::Relaxed);
                }
            }
            let len = self.total_written.load(Ordering::Relaxed);
            if let Err(e) = self.file.set_len(len) {
                tracing::error!("failed to truncate {}: {}", self.path.display(), e);
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        // File handle closes on drop.
    }

    fn record_failure(&self, error: &SinkError) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
        tracing::error!("sink write to {} failed: {}", self.path.display(), error);
    }

    fn map(&mut self, len: u64) -> Result<(), SinkError> {
        self.file.set_len(len).map_err(|source| SinkError::Allocate {
            path: self.path.clone(),
            len,
            source,
        })?;
        let mmap = unsafe {
            MmapOptions::new()
                .len(len as usize)
                .map_mut(&self.file)
                .map_err(|source| SinkError::Map {
                    path: self.path.clone(),
                    source,
                })?
        };
        // Advisory only; a refusal changes nothing observable.
        let _ = mmap.advise(Advice::Sequential);
        self.mmap = Some(mmap);
        self.mapped_len = len;
        Ok(())
    }

    // Sync, unmap, extend, remap. Doubles until `needed` fits.
    fn grow_mapping(&mut self, needed: u64) -> Result<(), SinkError> {
        let mut new_len = self.mapped_len.max(INITIAL_MMAP_LEN);
        while new_len < needed {
            new_len *= 2;
        }
        if let Some(mmap) = self.mmap.take() {
            if let Err(e) = mmap.flush() {
                tracing::warn!("sync before remap of {} failed: {}", self.path.display(), e);
            }
        }
        self.map(new_len)
    }

    fn write_record_mmap(&mut self, msg: &ParsedMessage) {
        let size = msg.body.wire_size();
        let offset = self.total_written.load(Ordering::Relaxed);

        if offset + size as u64 > self.mapped_len {
            if let Err(e) = self.grow_mapping(offset + size as u64) {
                self.record_failure(&e);
                return;
            }
        }
        let Some(mmap) = self.mmap.as_mut() else {
            // A previous remap failure left the sink unmapped.
            self.write_errors.fetch_add(1, Ordering::Relaxed);
            return;
        };

        let offset = offset as usize;
        msg.body.encode_into(&mut mmap[offset..offset + size]);
        self.total_written.fetch_add(size as u64, Ordering::Relaxed);
    }

    fn write_record_buffered(&mut self, msg: &ParsedMessage) {
        let size = msg.body.wire_size();
        if self.cursor + size > self.buffer.len() {
            self.flush();
        }
        let cursor = self.cursor;
        msg.body.encode_into(&mut self.buffer.as_mut_slice()[cursor..cursor + size]);
        self.cursor += size;
    }

    fn flush_inner(&mut self) -> Result<(), SinkError> {
        if self.cursor == 0 {
            return Ok(());
        }
        let cursor = self.cursor;
        self.cursor = 0;

        match self.mode {
            WriteMode::Mmap => Ok(()),
            WriteMode::Buffered => {
                self.file.write_all(&self.buffer.as_slice()[..cursor])?;
                self.total_written.fetch_add(cursor as u64, Ordering::Relaxed);
                Ok(())
            }
            WriteMode::Direct => {
                // Direct I/O wants page-granular lengths; pad with zeros
                // and commit only the real cursor.
                let padded = (cursor + DIRECT_ALIGNMENT - 1) & !(DIRECT_ALIGNMENT - 1);
                self.buffer.as_mut_slice()[cursor..padded].fill(0);
                let written = self.file.write(&self.buffer.as_slice()[..padded])?;
                if written != padded {
                    return Err(SinkError::ShortWrite {
                        expected: padded,
                        written,
                    });
                }
                self.total_written.fetch_add(cursor as u64, Ordering::Relaxed);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_buffer_alignment() {
        let buf = AlignedBuf::zeroed(DIRECT_ALIGNMENT * 4);
        assert_eq!(buf.ptr.as_ptr() as usize % DIRECT_ALIGNMENT, 0);
        assert_eq!(buf.len(), DIRECT_ALIGNMENT * 4);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "multiple")]
    fn test_aligned_buffer_rejects_unaligned_size() {
        let _ = AlignedBuf::zeroed(1000);
    }

    #[test]
    fn test_direct_padding_math() {
        for (cursor, padded) in [
            (1usize, DIRECT_ALIGNMENT),
            (DIRECT_ALIGNMENT - 1, DIRECT_ALIGNMENT),
            (DIRECT_ALIGNMENT, DIRECT_ALIGNMENT),
            (DIRECT_ALIGNMENT + 1, DIRECT_ALIGNMENT * 2),
        ] {
            assert_eq!(
                (cursor + DIRECT_ALIGNMENT - 1) & !(DIRECT_ALIGNMENT - 1),
                padded
            );
        }
    }
}
