//! Bounded, persistent URL cursor.
//!
//! Backs the manual sequential-browsing feature: an ordered list of URLs
//! loaded from a plain-text file, one entry per line, with a cursor that
//! survives restarts via the settings store. The iterator itself moves the
//! cursor freely in both directions; detecting out-of-range results and
//! re-clamping is the caller's job (the pipeline applies the wrap rule).

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::MAX_URL_LINE_LEN;

/// Result type for URL list operations
pub type UrlsResult<T> = Result<T, UrlsError>;

/// Errors that can occur loading a URL list file
#[derive(Debug)]
pub enum UrlsError {
    /// The list file could not be opened or read
    Unreadable(PathBuf, std::io::Error),
}

impl std::fmt::Display for UrlsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlsError::Unreadable(path, err) => {
                write!(f, "Cannot read URL list {}: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for UrlsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UrlsError::Unreadable(_, err) => Some(err),
        }
    }
}

/// Cursor over an ordered list of scheme-stripped URLs.
#[derive(Debug, Clone, Default)]
pub struct UrlIterator {
    urls: Vec<String>,
    cur: i64,
    count: usize,
}

impl UrlIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor by one and return it. No upper bound is enforced
    /// here; the caller detects `index >= count` and re-clamps.
    pub fn next(&mut self) -> i64 {
        self.cur += 1;
        self.cur
    }

    /// Retreat the cursor by one and return it. May go negative; the
    /// caller detects out-of-range results and re-clamps.
    pub fn prev(&mut self) -> i64 {
        self.cur -= 1;
        self.cur
    }

    /// Current cursor position
    pub fn cur(&self) -> i64 {
        self.cur
    }

    /// Move the cursor to an absolute position
    pub fn set_cur(&mut self, cur: i64) {
        self.cur = cur;
    }

    /// Declared list length used for range checks
    pub fn count(&self) -> usize {
        self.count
    }

    /// Override the declared list length
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Actual number of loaded URLs
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// The loaded list, in file order
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// URL at an absolute index
    pub fn url_at(&self, index: usize) -> Option<&str> {
        self.urls.get(index).map(String::as_str)
    }

    /// URL under the cursor, when the cursor is in range
    pub fn current_url(&self) -> Option<&str> {
        if self.cur < 0 {
            return None;
        }
        self.url_at(self.cur as usize)
    }

    /// (Re)load the list from a file.
    ///
    /// Lines are capped at [`MAX_URL_LINE_LEN`], blank lines are skipped,
    /// and a leading `scheme://` prefix is stripped. On open failure the
    /// previous list stays intact and the error is returned for the caller
    /// to surface as a warning. A persisted cursor outside the new list
    /// resets to 0.
    pub fn load(&mut self, path: impl AsRef<Path>) -> UrlsResult<usize> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| UrlsError::Unreadable(path.to_path_buf(), err))?;

        self.urls = contents
            .lines()
            .map(truncate_line)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(strip_scheme)
            .map(|line| line.trim().to_string())
            .collect();
        self.count = self.urls.len();

        if self.cur < 0 || self.cur >= self.count as i64 {
            self.cur = 0;
        }
        Ok(self.count)
    }
}

/// Cap a line at `MAX_URL_LINE_LEN` bytes on a char boundary.
fn truncate_line(line: &str) -> &str {
    if line.len() <= MAX_URL_LINE_LEN {
        return line;
    }
    let mut end = MAX_URL_LINE_LEN;
    while end > 0 && !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Strip a leading `scheme://` prefix (alphabetic scheme only).
fn strip_scheme(line: &str) -> &str {
    if let Some(pos) = line.find("://") {
        let scheme = &line[..pos];
        if !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return &line[pos + 3..];
        }
    }
    line
}
