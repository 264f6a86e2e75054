// Standard filesystem adapter - File checks through std::fs

use std::fs;
use std::path::Path;

use crate::ports::FsPort;

/// Filesystem adapter over `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFsAdapter;

impl StdFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl FsPort for StdFsAdapter {
    fn file_exists(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        fs::metadata(path).ok().filter(|m| m.is_file()).map(|m| m.len())
    }
}
