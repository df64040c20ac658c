//! Disk IO helpers for load/save (spec §4.H, §6 "Persisted file format").
//!
//! Save is atomic: the new content is written to a temp file in the same
//! directory, fsynced, then renamed over the target. A rename within one
//! filesystem is atomic, so a crash mid-write never leaves a truncated file
//! in the target's place.

use std::io;
use std::path::Path;

use core_text::Buffer;

/// Result of attempting to open a file as a document.
pub enum OpenFileResult {
    Success(Buffer),
    Error(io::Error),
}

/// Read `path` into a new [`Buffer`] named after its file name.
pub fn open_file(path: &Path) -> OpenFileResult {
    match std::fs::File::open(path) {
        Ok(file) => {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("untitled");
            match Buffer::from_reader(name, file) {
                Ok(buffer) => OpenFileResult::Success(buffer),
                Err(err) => {
                    tracing::error!(target: "io", path = %path.display(), %err, "buffer decode failed");
                    OpenFileResult::Error(io::Error::new(io::ErrorKind::InvalidData, err))
                }
            }
        }
        Err(err) => {
            tracing::error!(target: "io", path = %path.display(), %err, "file open failed");
            OpenFileResult::Error(err)
        }
    }
}

/// Write `content` to `path` atomically. Appends exactly one trailing line
/// feed if `content` doesn't already end in one; never writes a BOM.
pub fn write_file_atomic(path: &Path, content: &str) -> io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

    {
        use std::io::Write;
        tmp.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            tmp.write_all(b"\n")?;
        }
        tmp.as_file().sync_all()?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
