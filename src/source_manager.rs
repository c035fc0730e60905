use hashbrown::HashMap;
use serde::Serialize;
use std::sync::Arc;
use std::{
    cmp::Ordering,
    num::NonZeroU32,
    path::{Path, PathBuf},
};

/// Source ID for identifying source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub(crate) NonZeroU32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl SourceId {
    /// Id 1 is reserved for builtin definitions (predefined macros).
    pub const BUILTIN: SourceId = SourceId(NonZeroU32::MIN);

    pub(crate) fn from_index(index: usize) -> Self {
        // index 0 maps to id 2, id 1 is the builtin pseudo file
        let raw = (index as u32).saturating_add(2);
        SourceId(NonZeroU32::new(raw).unwrap_or(NonZeroU32::MIN))
    }

    pub(crate) fn to_u32(self) -> u32 {
        self.0.get()
    }

    fn index(self) -> Option<usize> {
        let id = self.to_u32();
        if id < 2 { None } else { Some(id as usize - 2) }
    }

    pub fn is_builtin(self) -> bool {
        self == Self::BUILTIN
    }
}

/// Source ID and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLoc {
    pub source_id: SourceId,
    pub offset: u32,
}

impl Default for SourceLoc {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SourceLoc {
    pub fn new(source_id: SourceId, offset: u32) -> Self {
        SourceLoc { source_id, offset }
    }

    pub fn builtin() -> Self {
        SourceLoc::new(SourceId::BUILTIN, 0)
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl std::fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceLoc(source_id={}, offset={})", self.source_id, self.offset)
    }
}

/// Half-open byte range `[start, end)` inside one source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    source_id: SourceId,
    start: u32,
    end: u32,
}

impl Default for SourceSpan {
    fn default() -> Self {
        Self::empty()
    }
}

impl SourceSpan {
    pub fn new(start: SourceLoc, end: SourceLoc) -> Self {
        if start.source_id != end.source_id {
            // start and end live in different buffers (e.g. a construct that
            // begins in a header and ends in the includer): degrade to an
            // empty span at the start location
            return Self::new_with_length(start.source_id, start.offset, 0);
        }
        Self {
            source_id: start.source_id,
            start: start.offset,
            end: end.offset.max(start.offset),
        }
    }

    pub fn new_with_length(source_id: SourceId, offset: u32, length: u32) -> Self {
        Self {
            source_id,
            start: offset,
            end: offset.saturating_add(length),
        }
    }

    pub fn empty() -> Self {
        Self::new(SourceLoc::builtin(), SourceLoc::builtin())
    }

    pub fn start(&self) -> SourceLoc {
        SourceLoc::new(self.source_id, self.start)
    }

    pub fn end(&self) -> SourceLoc {
        SourceLoc::new(self.source_id, self.end)
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn offset(&self) -> u32 {
        self.start
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_source_id_builtin(&self) -> bool {
        self.source_id.is_builtin()
    }

    /// True when `other` lies completely inside this span (same file).
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.source_id == other.source_id && self.start <= other.start && other.end <= self.end
    }

    /// Merge two source spans into a single span covering both
    pub fn merge(self, other: SourceSpan) -> SourceSpan {
        if self.source_id != other.source_id {
            return self;
        }
        SourceSpan {
            source_id: self.source_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SourceSpan(source_id={}, start={}, end={})",
            self.source_id, self.start, self.end
        )
    }
}

/// Represents a single #line directive entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDirective {
    pub physical_line: u32,
    pub logical_line: u32,
    pub logical_file: Option<String>,
}

impl LineDirective {
    pub(crate) fn new(physical_line: u32, logical_line: u32, logical_file: Option<String>) -> Self {
        LineDirective {
            physical_line,
            logical_line,
            logical_file,
        }
    }
}

impl Ord for LineDirective {
    fn cmp(&self, other: &Self) -> Ordering {
        self.physical_line.cmp(&other.physical_line)
    }
}

impl PartialOrd for LineDirective {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Indicates the kind of source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    /// Content supplied for a path (disk or in-memory provider)
    Real,
    /// Synthesized buffers (predefined macros, macro files)
    Virtual,
}

/// Stores all #line directives for a single file, sorted by physical line
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    pub(crate) entries: Vec<LineDirective>,
}

impl LineMap {
    pub(crate) fn new() -> Self {
        LineMap { entries: Vec::new() }
    }

    /// Entries arriving out of order are inserted at their sorted position.
    pub(crate) fn add_entry(&mut self, entry: LineDirective) {
        let idx = self.entries.partition_point(|e| e.physical_line <= entry.physical_line);
        self.entries.insert(idx, entry);
    }

    /// Find the presumed location for a given physical line
    pub(crate) fn presumed_location(&self, physical_line: u32) -> (u32, Option<&str>) {
        let idx = self.entries.partition_point(|e| e.physical_line <= physical_line);

        if idx == 0 {
            (physical_line, None)
        } else {
            let entry = &self.entries[idx - 1];
            let logical_line = entry.logical_line + (physical_line - entry.physical_line);
            (logical_line, entry.logical_file.as_deref())
        }
    }
}

/// File information for tracking source files
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub file_id: SourceId,
    pub path: PathBuf,
    pub(crate) buffer: Arc<str>,
    pub(crate) kind: FileKind,
    pub line_starts: Vec<u32>,
    pub line_map: LineMap,
    /// Location of the `#include` that brought this file in
    pub include_loc: Option<SourceLoc>,
}

impl FileInfo {
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }
}

fn compute_line_starts(text: &str) -> Vec<u32> {
    let mut line_starts = vec![0];
    for (i, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            line_starts.push((i + 1) as u32);
        }
    }
    line_starts
}

/// Owns every buffer that takes part in one translation unit.
#[derive(Debug, Clone, Default)]
pub struct SourceManager {
    file_infos: Vec<FileInfo>,
    path_to_id: HashMap<PathBuf, SourceId>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a buffer for `path`; the same path added twice yields two ids
    /// (a file included twice is scanned twice).
    pub fn add_buffer(&mut self, text: impl Into<Arc<str>>, path: &str, include_loc: Option<SourceLoc>) -> SourceId {
        self.add_file_entry(text.into(), PathBuf::from(path), include_loc, FileKind::Real)
    }

    pub fn add_virtual_buffer(&mut self, text: impl Into<Arc<str>>, name: &str) -> SourceId {
        self.add_file_entry(text.into(), PathBuf::from(format!("<{}>", name)), None, FileKind::Virtual)
    }

    fn add_file_entry(
        &mut self,
        buffer: Arc<str>,
        path: PathBuf,
        include_loc: Option<SourceLoc>,
        kind: FileKind,
    ) -> SourceId {
        let file_id = SourceId::from_index(self.file_infos.len());
        if kind == FileKind::Real {
            self.path_to_id.entry(path.clone()).or_insert(file_id);
        }
        let line_starts = compute_line_starts(&buffer);
        self.file_infos.push(FileInfo {
            file_id,
            path,
            buffer,
            kind,
            line_starts,
            line_map: LineMap::new(),
            include_loc,
        });
        file_id
    }

    pub fn get_file_info(&self, source_id: SourceId) -> Option<&FileInfo> {
        self.file_infos.get(source_id.index()?)
    }

    pub fn get_buffer(&self, source_id: SourceId) -> Option<&str> {
        self.get_file_info(source_id).map(|info| &*info.buffer)
    }

    pub(crate) fn get_buffer_arc(&self, source_id: SourceId) -> Option<Arc<str>> {
        self.get_file_info(source_id).map(|info| info.buffer.clone())
    }

    /// First id registered for `path`
    pub fn get_file_id(&self, path: &Path) -> Option<SourceId> {
        self.path_to_id.get(path).copied()
    }

    pub fn path(&self, source_id: SourceId) -> Option<&Path> {
        self.get_file_info(source_id).map(|info| info.path.as_path())
    }

    pub(crate) fn get_line_map_mut(&mut self, source_id: SourceId) -> Option<&mut LineMap> {
        let index = source_id.index()?;
        self.file_infos.get_mut(index).map(|fi| &mut fi.line_map)
    }

    /// Text covered by `span`, `None` for builtin or out-of-range spans
    pub fn get_source_text(&self, span: SourceSpan) -> Option<&str> {
        let buffer = self.get_buffer(span.source_id())?;
        buffer.get(span.start().offset() as usize..span.end().offset() as usize)
    }

    /// Line and column (both 1-based) for a source location
    pub fn get_line_column(&self, loc: SourceLoc) -> Option<(u32, u32)> {
        let file_info = self.get_file_info(loc.source_id())?;
        let offset = loc.offset();
        let idx = file_info.line_starts.partition_point(|&start| start <= offset);
        if idx == 0 {
            return Some((1, offset + 1));
        }
        let line_idx = idx - 1;
        let column = offset - file_info.line_starts[line_idx];
        Some((line_idx as u32 + 1, column + 1))
    }

    /// Presumed location (logical line, column, file name) honoring `#line`
    pub fn get_presumed_location(&self, loc: SourceLoc) -> Option<(u32, u32, Option<&str>)> {
        let file_info = self.get_file_info(loc.source_id())?;
        let (physical_line, column) = self.get_line_column(loc)?;
        let (logical_line, logical_file) = file_info.line_map.presumed_location(physical_line);
        let filename = logical_file.or_else(|| file_info.path.to_str());
        Some((logical_line, column, filename))
    }

    pub fn file_count(&self) -> usize {
        self.file_infos.len()
    }
}
