//! Result-file ingestion.
//!
//! The analyzer writes its findings as a single JSON object next to the
//! VDOM dump (`<dumpPath>.res`). The file is produced by an independently
//! built tool, so nothing about it can be assumed well-formed: ingestion
//! walks a fixed failure ladder (missing, unreadable, empty, unparseable,
//! wrong root type) and then projects fields leniently — a missing or
//! type-mismatched field is treated as absent, never as an error, so a
//! partial result still renders whatever is present.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default border width for overlay items
pub const DEFAULT_BORDER_WIDTH: u32 = 2;

/// Default border color for overlay items
pub const DEFAULT_BORDER_COLOR: &str = "red";

/// Default border style for overlay items
pub const DEFAULT_BORDER_STYLE: &str = "solid";

/// Result type for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur while ingesting a result file.
///
/// Each variant carries enough context to debug the external tool's output;
/// none of them are fatal to the host — they abort only the current
/// annotation pass.
#[derive(Debug)]
pub enum IngestError {
    /// The result file does not exist
    FileMissing(PathBuf),
    /// The result file exists but could not be read
    Unreadable(PathBuf, std::io::Error),
    /// The result file is empty
    Empty(PathBuf),
    /// The result file is not valid JSON; carries the parser's position and
    /// message so they can be shown verbatim
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    /// The root JSON value is not an object
    NotAnObject(PathBuf),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::FileMissing(path) => {
                write!(f, "Result file not found: {}", path.display())
            }
            IngestError::Unreadable(path, err) => {
                write!(f, "Cannot read result file {}: {}", path.display(), err)
            }
            IngestError::Empty(path) => {
                write!(f, "Result file is empty: {}", path.display())
            }
            IngestError::Parse {
                path,
                line,
                message,
                ..
            } => {
                write!(
                    f,
                    "Result file {} is not valid JSON (line {}): {}",
                    path.display(),
                    line,
                    message
                )
            }
            IngestError::NotAnObject(path) => {
                write!(
                    f,
                    "Result file {} does not contain a JSON object",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Unreadable(_, err) => Some(err),
            _ => None,
        }
    }
}

/// A point the page should be scrolled to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JumpTo {
    pub x: i64,
    pub y: i64,
}

/// One region of interest reported by the analyzer.
///
/// Coordinates stay optional at this layer: an item with a missing or
/// malformed coordinate is skipped by the annotator, not rejected here.
/// Border fields default per item, never per document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub w: Option<i64>,
    pub h: Option<i64>,
    pub desc: Option<String>,
    pub title: Option<String>,
    pub no_highlight: bool,
    pub border_width: u32,
    pub border_color: String,
    pub border_style: String,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            w: None,
            h: None,
            desc: None,
            title: None,
            no_highlight: false,
            border_width: DEFAULT_BORDER_WIDTH,
            border_color: DEFAULT_BORDER_COLOR.to_string(),
            border_style: DEFAULT_BORDER_STYLE.to_string(),
        }
    }
}

impl Item {
    /// The item's pixel rectangle, if all four coordinates are present
    pub fn rect(&self) -> Option<(i64, i64, i64, i64)> {
        Some((self.x?, self.y?, self.w?, self.h?))
    }
}

/// Typed projection of one analyzer result file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnnotationResult {
    /// Label identifying which analyzer produced the result
    pub program: Option<String>,
    /// Ordered overlay groups; items of one group highlight together
    pub groups: Vec<Vec<Item>>,
    /// Point to scroll the page to
    pub jump_to: Option<JumpTo>,
    /// Free text for the page summary panel
    pub summary: Option<String>,
}

impl AnnotationResult {
    /// Total number of items across all groups
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }
}

/// Read and validate an analyzer result file.
pub fn ingest(path: impl AsRef<Path>) -> IngestResult<AnnotationResult> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(IngestError::FileMissing(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|err| IngestError::Unreadable(path.to_path_buf(), err))?;

    if contents.is_empty() {
        return Err(IngestError::Empty(path.to_path_buf()));
    }

    let value: Value = serde_json::from_str(&contents).map_err(|err| IngestError::Parse {
        path: path.to_path_buf(),
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    })?;

    let root = match value {
        Value::Object(map) => map,
        _ => return Err(IngestError::NotAnObject(path.to_path_buf())),
    };

    Ok(project(&root))
}

/// Project the root object into the typed result. Everything past the root
/// check is optional; wrong-typed fields read as absent.
fn project(root: &serde_json::Map<String, Value>) -> AnnotationResult {
    let program = root
        .get("program")
        .and_then(Value::as_str)
        .map(str::to_string);

    let groups = root
        .get("groups")
        .and_then(Value::as_array)
        .map(|raw_groups| {
            raw_groups
                .iter()
                .filter_map(Value::as_array)
                .map(|raw_items| {
                    raw_items
                        .iter()
                        .filter_map(Value::as_object)
                        .map(project_item)
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default();

    let jump_to = root.get("jump_to").and_then(Value::as_object).and_then(|j| {
        Some(JumpTo {
            x: as_integer(j.get("x")?)?,
            y: as_integer(j.get("y")?)?,
        })
    });

    let summary = root
        .get("summary")
        .and_then(Value::as_str)
        .map(str::to_string);

    AnnotationResult {
        program,
        groups,
        jump_to,
        summary,
    }
}

fn project_item(raw: &serde_json::Map<String, Value>) -> Item {
    Item {
        x: raw.get("x").and_then(as_integer),
        y: raw.get("y").and_then(as_integer),
        w: raw.get("w").and_then(as_integer),
        h: raw.get("h").and_then(as_integer),
        desc: raw.get("desc").and_then(Value::as_str).map(str::to_string),
        title: raw.get("title").and_then(Value::as_str).map(str::to_string),
        no_highlight: raw
            .get("noHighlight")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        border_width: raw
            .get("borderWidth")
            .and_then(as_integer)
            .and_then(|w| u32::try_from(w).ok())
            .unwrap_or(DEFAULT_BORDER_WIDTH),
        border_color: raw
            .get("borderColor")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BORDER_COLOR)
            .to_string(),
        border_style: raw
            .get("borderStyle")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BORDER_STYLE)
            .to_string(),
    }
}

/// Integer-convertible read: accepts integers and whole-valued doubles.
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_result(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.vdom.res");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ingest(dir.path().join("absent.res")).unwrap_err();
        assert!(matches!(err, IngestError::FileMissing(_)));
    }

    #[test]
    fn test_unreadable_file() {
        // A directory at the result path is readable as a path but not as a file
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.vdom.res");
        fs::create_dir(&path).unwrap();
        let err = ingest(&path).unwrap_err();
        assert!(matches!(err, IngestError::Unreadable(_, _)));
    }

    #[test]
    fn test_empty_file() {
        let (_dir, path) = write_result("");
        let err = ingest(&path).unwrap_err();
        assert!(matches!(err, IngestError::Empty(_)));
    }

    #[test]
    fn test_parse_error_carries_line() {
        let (_dir, path) = write_result("{\n  \"groups\": [\n");
        match ingest(&path).unwrap_err() {
            IngestError::Parse { line, message, .. } => {
                assert!(line >= 1);
                assert!(!message.is_empty());
            }
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_root() {
        let (_dir, path) = write_result("[1, 2, 3]");
        let err = ingest(&path).unwrap_err();
        assert!(matches!(err, IngestError::NotAnObject(_)));
    }

    #[test]
    fn test_full_example() {
        let (_dir, path) = write_result(
            r#"{"program":"findtitles",
                "groups":[[{"x":10,"y":20,"w":100,"h":30,"desc":"Title"}]],
                "jump_to":{"x":0,"y":20}}"#,
        );
        let result = ingest(&path).unwrap();

        assert_eq!(result.program.as_deref(), Some("findtitles"));
        assert_eq!(result.groups.len(), 1);
        let item = &result.groups[0][0];
        assert_eq!(item.rect(), Some((10, 20, 100, 30)));
        assert_eq!(item.desc.as_deref(), Some("Title"));
        assert_eq!(item.border_width, DEFAULT_BORDER_WIDTH);
        assert_eq!(item.border_color, DEFAULT_BORDER_COLOR);
        assert_eq!(item.border_style, DEFAULT_BORDER_STYLE);
        assert_eq!(result.jump_to, Some(JumpTo { x: 0, y: 20 }));
        assert_eq!(result.summary, None);
    }

    #[test]
    fn test_parsed_fields_reserialize_faithfully() {
        let (_dir, path) = write_result(
            r#"{"program":"findtitles",
                "groups":[[{"x":10,"y":20,"w":100,"h":30,"desc":"Title","title":"T"}]],
                "jump_to":{"x":0,"y":20},
                "summary":"two headings"}"#,
        );
        let result = ingest(&path).unwrap();
        let value = serde_json::to_value(&result).unwrap();

        // Strings round-trip byte-for-byte, integers numerically
        assert_eq!(value["program"], "findtitles");
        assert_eq!(value["summary"], "two headings");
        let item = &value["groups"][0][0];
        assert_eq!(item["x"], 10);
        assert_eq!(item["y"], 20);
        assert_eq!(item["w"], 100);
        assert_eq!(item["h"], 30);
        assert_eq!(item["desc"], "Title");
        assert_eq!(item["title"], "T");
        assert_eq!(value["jump_to"]["x"], 0);
        assert_eq!(value["jump_to"]["y"], 20);
    }

    #[test]
    fn test_empty_groups_with_summary() {
        let (_dir, path) = write_result(r#"{"groups":[],"summary":"ok"}"#);
        let result = ingest(&path).unwrap();
        assert!(result.groups.is_empty());
        assert_eq!(result.summary.as_deref(), Some("ok"));
    }

    #[test]
    fn test_type_mismatched_fields_read_as_absent() {
        let (_dir, path) = write_result(
            r#"{"program":12,"groups":{"not":"an array"},"jump_to":"nope","summary":[1]}"#,
        );
        let result = ingest(&path).unwrap();
        assert_eq!(result, AnnotationResult::default());
    }

    #[test]
    fn test_non_array_group_entries_are_dropped() {
        let (_dir, path) = write_result(r#"{"groups":[[{"x":1,"y":2,"w":3,"h":4}], "junk", 7]}"#);
        let result = ingest(&path).unwrap();
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.item_count(), 1);
    }

    #[test]
    fn test_item_defaults_are_per_item() {
        let (_dir, path) = write_result(
            r#"{"groups":[[
                {"x":1,"y":2,"w":3,"h":4,"borderColor":"blue","borderWidth":5},
                {"x":5,"y":6,"w":7,"h":8}
            ]]}"#,
        );
        let result = ingest(&path).unwrap();
        let group = &result.groups[0];
        assert_eq!(group[0].border_color, "blue");
        assert_eq!(group[0].border_width, 5);
        assert_eq!(group[1].border_color, DEFAULT_BORDER_COLOR);
        assert_eq!(group[1].border_width, DEFAULT_BORDER_WIDTH);
    }

    #[test]
    fn test_item_with_malformed_coordinate_survives_ingestion() {
        let (_dir, path) =
            write_result(r#"{"groups":[[{"x":"ten","y":20,"w":100,"h":30,"desc":"d"}]]}"#);
        let result = ingest(&path).unwrap();
        let item = &result.groups[0][0];
        assert_eq!(item.x, None);
        assert_eq!(item.y, Some(20));
        assert_eq!(item.rect(), None);
        assert_eq!(item.desc.as_deref(), Some("d"));
    }

    #[test]
    fn test_partial_jump_to_is_absent() {
        let (_dir, path) = write_result(r#"{"jump_to":{"x":5}}"#);
        let result = ingest(&path).unwrap();
        assert_eq!(result.jump_to, None);
    }

    #[test]
    fn test_whole_double_coordinates_convert() {
        let (_dir, path) = write_result(r#"{"groups":[[{"x":10.0,"y":20.0,"w":1.5,"h":30}]]}"#);
        let result = ingest(&path).unwrap();
        let item = &result.groups[0][0];
        assert_eq!(item.x, Some(10));
        assert_eq!(item.y, Some(20));
        assert_eq!(item.w, None);
    }

    #[test]
    fn test_no_highlight_flag() {
        let (_dir, path) =
            write_result(r#"{"groups":[[{"x":1,"y":1,"w":1,"h":1,"noHighlight":true}]]}"#);
        let result = ingest(&path).unwrap();
        assert!(result.groups[0][0].no_highlight);
    }
}
