//! Source text access and offset to line/column resolution.

use crate::collections::ConcurrentMap;
use crate::span::{SYNTHETIC_OFFSET, UNDEFINED_OFFSET};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A resolved 1-based position, or one of the sentinel non-positions.
///
/// Line and column are either both real or both the same sentinel; the only
/// constructors are [`LineColumn::new`] and the associated constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineColumn {
    line: i32,
    column: i32,
}

impl LineColumn {
    pub const UNDEFINED: LineColumn = LineColumn::sentinel(-1);
    pub const SYNTHETIC: LineColumn = LineColumn::sentinel(-2);
    pub const FAKE_OVERRIDE: LineColumn = LineColumn::sentinel(-3);
    /// Offsets that fall outside the available source text.
    pub const UNKNOWN: LineColumn = LineColumn::sentinel(0);

    const fn sentinel(value: i32) -> LineColumn {
        LineColumn {
            line: value,
            column: value,
        }
    }

    pub fn new(line: usize, column: usize) -> LineColumn {
        match (i32::try_from(line), i32::try_from(column)) {
            (Ok(line), Ok(column)) if line >= 1 && column >= 1 => LineColumn { line, column },
            _ => LineColumn::UNKNOWN,
        }
    }

    pub fn line(&self) -> i32 {
        self.line
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn is_real(&self) -> bool {
        self.line >= 1
    }
}

impl fmt::Display for LineColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LineColumn::UNDEFINED => write!(f, "<undefined>"),
            LineColumn::SYNTHETIC => write!(f, "<synthetic>"),
            LineColumn::FAKE_OVERRIDE => write!(f, "<fake-override>"),
            LineColumn::UNKNOWN => write!(f, "<unknown>"),
            _ => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

/// Resolve a character offset pair against the lines of a file.
///
/// Each line contributes its length plus one for the newline. The first line
/// whose cumulative offset exceeds `start` contains it. Sentinel offsets never
/// touch `lines`.
pub fn resolve_position<S: AsRef<str>>(lines: &[S], start: i32, end: i32) -> LineColumn {
    if start == UNDEFINED_OFFSET || end == UNDEFINED_OFFSET {
        return LineColumn::UNDEFINED;
    }
    if start == SYNTHETIC_OFFSET || end == SYNTHETIC_OFFSET {
        return LineColumn::SYNTHETIC;
    }
    let Ok(start) = usize::try_from(start) else {
        return LineColumn::UNKNOWN;
    };

    let mut before = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let cumulative = before + line.as_ref().chars().count() + 1;
        if start < cumulative {
            return LineColumn::new(index + 1, start - before + 1);
        }
        before = cumulative;
    }
    LineColumn::UNKNOWN
}

/// Supplies the text of source files as ordered lines.
pub trait SourceProvider: Send + Sync {
    /// Lines of the file at `path`. A file that cannot be found yields no lines.
    fn lines(&self, path: &Path) -> Vec<String>;
}

/// Reads sources from disk, optionally relative to a root directory.
#[derive(Debug, Clone, Default)]
pub struct FsSourceProvider {
    root: Option<PathBuf>,
}

impl FsSourceProvider {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl SourceProvider for FsSourceProvider {
    fn lines(&self, path: &Path) -> Vec<String> {
        let full = match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        };
        match std::fs::read_to_string(&full) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(err) => {
                warn!("no source text for {}: {}", full.display(), err);
                Vec::new()
            }
        }
    }
}

/// Sources held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemorySourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceProvider for InMemorySourceProvider {
    fn lines(&self, path: &Path) -> Vec<String> {
        self.files
            .get(path)
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// Memoises file lines per path on top of a [`SourceProvider`].
pub struct SourceCache {
    provider: Arc<dyn SourceProvider>,
    lines: ConcurrentMap<PathBuf, Arc<[String]>>,
}

impl SourceCache {
    pub fn new(provider: Arc<dyn SourceProvider>) -> Self {
        Self {
            provider,
            lines: ConcurrentMap::new(),
        }
    }

    pub fn from_provider(provider: impl SourceProvider + 'static) -> Self {
        Self::new(Arc::new(provider))
    }

    pub fn lines(&self, path: &Path) -> Arc<[String]> {
        if let Some(lines) = self.lines.get_cloned(&path.to_path_buf()) {
            return lines;
        }
        let loaded: Arc<[String]> = self.provider.lines(path).into();
        self.lines.get_or_insert_with(path.to_path_buf(), || loaded)
    }

    /// Resolve offsets in `path`. Sentinel offsets do not load the file.
    pub fn resolve(&self, path: &Path, start: i32, end: i32) -> LineColumn {
        if start < 0 || end < 0 {
            return resolve_position::<String>(&[], start, end);
        }
        resolve_position(&self.lines(path), start, end)
    }
}

impl fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCache")
            .field("files", &self.lines.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolves_first_and_later_lines() {
        let lines = ["fun a() {}", "", "  class B"];
        assert_eq!(resolve_position(&lines, 0, 3), LineColumn::new(1, 1));
        assert_eq!(resolve_position(&lines, 4, 5), LineColumn::new(1, 5));
        assert_eq!(resolve_position(&lines, 11, 11), LineColumn::new(2, 1));
        assert_eq!(resolve_position(&lines, 14, 19), LineColumn::new(3, 3));
    }

    #[test]
    fn out_of_range_offsets_are_unknown() {
        let lines = ["abc"];
        assert_eq!(resolve_position(&lines, 4, 4), LineColumn::UNKNOWN);
        assert_eq!(resolve_position(&lines, -7, 2), LineColumn::UNKNOWN);
        assert_eq!(resolve_position::<&str>(&[], 0, 0), LineColumn::UNKNOWN);
    }

    #[test]
    fn invalid_line_column_collapses_to_unknown() {
        assert_eq!(LineColumn::new(0, 4), LineColumn::UNKNOWN);
        assert_eq!(LineColumn::new(3, 0), LineColumn::UNKNOWN);
        assert!(LineColumn::new(1, 1).is_real());
        assert!(!LineColumn::SYNTHETIC.is_real());
    }
}
