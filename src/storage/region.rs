use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Memory-mapped byte region for use as ring storage.
///
/// Rings only borrow [`Region::as_mut_slice`]; the region must outlive them.
pub struct Region {
    mmap: MmapMut,
    file: Option<File>,
}

impl Region {
    /// Private anonymous mapping, zero-filled.
    pub fn anonymous(len: usize) -> io::Result<Self> {
        let mmap = MmapOptions::new().len(len).map_anon()?;
        Ok(Self { mmap, file: None })
    }

    /// Creates (or truncates) `path`, sizes it to `len` and maps it shared.
    pub fn create<P: AsRef<Path>>(path: P, len: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        file.set_len(len as u64)?;

        // SAFETY: the file was just created for this mapping; external
        // modification while mapped is the caller's responsibility.
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        Ok(Self {
            mmap,
            file: Some(file),
        })
    }

    /// Maps an existing file over its full length.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len() as usize;
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "cannot map an empty file",
            ));
        }

        // SAFETY: as for `create`.
        let mmap = unsafe { MmapOptions::new().len(len).map_mut(&file)? };
        Ok(Self {
            mmap,
            file: Some(file),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }

    /// Flushes a file-backed region to disk. No-op for anonymous regions.
    pub fn flush(&self) -> io::Result<()> {
        if self.file.is_some() {
            self.mmap.flush()
        } else {
            Ok(())
        }
    }

    pub fn flush_async(&self) -> io::Result<()> {
        if self.file.is_some() {
            self.mmap.flush_async()
        } else {
            Ok(())
        }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
