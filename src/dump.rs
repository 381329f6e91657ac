//! VDOM export.
//!
//! A dump is a point-in-time snapshot of the page's serialized visible
//! structure. It is produced fresh on every page-load-finished event,
//! written to the configured dump path (overwriting the previous dump), and
//! not retained beyond that.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::page::Page;

/// Extension appended to the dump path to locate the analyzer's result file
pub const RESULT_SUFFIX: &str = ".res";

/// Opaque serialized page structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VdomDump {
    bytes: Vec<u8>,
}

impl VdomDump {
    /// Raw dump bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in the dump
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Overwrite `path` with the dump contents, creating parent directories
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.bytes)
    }
}

/// Serialize the page's visible structure.
///
/// Pure with respect to the page; the caller guarantees the page has
/// finished loading.
pub fn dump<P: Page + ?Sized>(page: &P) -> VdomDump {
    VdomDump {
        bytes: page.structure(),
    }
}

/// Path of the result file the analyzer writes for a given dump path.
///
/// The suffix is appended literally: `/tmp/page.vdom` -> `/tmp/page.vdom.res`.
pub fn result_path(dump_path: impl AsRef<Path>) -> PathBuf {
    let mut s = OsString::from(dump_path.as_ref().as_os_str());
    s.push(RESULT_SUFFIX);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::MockPage;

    #[test]
    fn test_dump_is_pure_snapshot() {
        let page = MockPage::with_structure(b"<node x=1/>".to_vec());
        let first = dump(&page);
        let second = dump(&page);
        assert_eq!(first, second);
        assert_eq!(first.as_bytes(), b"<node x=1/>");
    }

    #[test]
    fn test_write_overwrites_previous_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.vdom");

        dump(&MockPage::with_structure(b"first".to_vec()))
            .write_to(&path)
            .unwrap();
        dump(&MockPage::with_structure(b"second".to_vec()))
            .write_to(&path)
            .unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_result_path_appends_suffix() {
        assert_eq!(
            result_path("/tmp/page.vdom"),
            PathBuf::from("/tmp/page.vdom.res")
        );
        // Appended, not an extension swap
        assert_eq!(result_path("/tmp/page"), PathBuf::from("/tmp/page.res"));
    }
}
