//! Read/write capabilities for caption text.

use crate::error::{CaptionError, Result};
use std::fs;
use std::path::Path;

/// Where caption text lives. Reads and writes are whole-file.
pub trait CaptionStore {
    fn read(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// Captions as plain UTF-8 files on disk. Text is stored byte for byte,
/// trailing newlines included.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsCaptionStore;

impl CaptionStore for FsCaptionStore {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| CaptionError::read(path, e))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).map_err(|e| CaptionError::write(path, e))
    }
}
