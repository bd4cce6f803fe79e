/// Directory listing provider
///
/// One row per file matching a path with an optional wildcard file name.
/// The file list is fixed at `initialize`; metadata is read when each row is
/// pulled.

use std::cmp::Ordering;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use chrono::{DateTime, Local};
use regex::{Regex, RegexBuilder};
use crate::core::{Column, Comparer, DataType, ProviderRecord, QueryError, Value};
use crate::expression::Expression;
use crate::parser::{DirectoryOrder, SortOrder};
use crate::state::QueryState;
use super::Provider;

/// Directory plus file-name mask, resolved against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSearch {
    directory: PathBuf,
    mask: String,
    recursive: bool,
}

impl FileSearch {
    /// `pattern` is either a directory (all files) or a path whose last
    /// component may contain `*` and `?`.
    #[must_use]
    pub fn new(base: &Path, pattern: &str, recursive: bool) -> Self {
        let path = base.join(pattern);
        if pattern.is_empty() || path.is_dir() {
            return Self {
                directory: path,
                mask: "*".to_string(),
                recursive,
            };
        }
        let mask = path
            .file_name()
            .map_or_else(|| "*".to_string(), |n| n.to_string_lossy().into_owned());
        let directory = path.parent().map_or_else(|| base.to_path_buf(), Path::to_path_buf);
        Self {
            directory,
            mask,
            recursive,
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn mask(&self) -> &str {
        &self.mask
    }

    /// Files in enumeration order.
    pub fn find(&self, comparer: &Comparer) -> Result<Vec<PathBuf>, QueryError> {
        let mask = mask_regex(&self.mask, comparer)?;
        let mut files = Vec::new();
        let mut pending = vec![self.directory.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    if self.recursive {
                        pending.push(entry.path());
                    }
                    continue;
                }
                let path = entry.path();
                if path.is_file() && mask.is_match(&entry.file_name().to_string_lossy()) {
                    files.push(path);
                }
            }
        }
        log::debug!(
            "{} file(s) match {} in {}",
            files.len(),
            self.mask,
            self.directory.display()
        );
        Ok(files)
    }
}

fn mask_regex(mask: &str, comparer: &Comparer) -> Result<Regex, QueryError> {
    let mut source = String::with_capacity(mask.len() + 2);
    source.push('^');
    for ch in mask.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Ok(RegexBuilder::new(&source)
        .case_insensitive(!comparer.is_case_sensitive())
        .build()?)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn by_name(comparer: &Comparer, a: &Path, b: &Path) -> Ordering {
    comparer
        .compare_strings(&file_name(a), &file_name(b))
        .then_with(|| comparer.compare_strings(&a.to_string_lossy(), &b.to_string_lossy()))
}

/// Orders a listing. Descending is the exact reverse of ascending.
pub fn sort_files(files: &mut Vec<PathBuf>, order: DirectoryOrder, comparer: &Comparer) {
    let direction = match order {
        DirectoryOrder::Name(direction) => {
            files.sort_by(|a, b| by_name(comparer, a, b));
            direction
        }
        DirectoryOrder::WriteTime(direction) => {
            let mut keyed: Vec<(SystemTime, PathBuf)> = files.drain(..).map(|p| (write_time(&p), p)).collect();
            keyed.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| by_name(comparer, a, b)));
            files.extend(keyed.into_iter().map(|(_, p)| p));
            direction
        }
    };
    if direction == SortOrder::Desc {
        files.reverse();
    }
}

fn timestamp(time: io::Result<SystemTime>) -> Value {
    let time = time.unwrap_or(SystemTime::UNIX_EPOCH);
    Value::DateTime(DateTime::<Local>::from(time).naive_local())
}

fn attributes(name: &str, metadata: &Metadata) -> String {
    let mut flags = Vec::new();
    if metadata.permissions().readonly() {
        flags.push("ReadOnly");
    }
    if name.starts_with('.') {
        flags.push("Hidden");
    }
    if flags.is_empty() {
        flags.push("Normal");
    }
    flags.join(", ")
}

pub struct DirectoryProvider {
    path: Expression,
    recursive: bool,
    order: Option<DirectoryOrder>,
    aliases: Vec<String>,
    columns: Vec<Column>,
    files: Vec<PathBuf>,
    position: usize,
    record: ProviderRecord,
}

impl DirectoryProvider {
    #[must_use]
    pub fn new(path: Expression, recursive: bool, order: Option<DirectoryOrder>, aliases: Vec<String>) -> Self {
        Self {
            path,
            recursive,
            order,
            aliases,
            columns: Self::schema(),
            files: Vec::new(),
            position: 0,
            record: ProviderRecord::default(),
        }
    }

    #[must_use]
    pub fn schema() -> Vec<Column> {
        vec![
            Column::new("FullName", DataType::String),
            Column::new("Name", DataType::String),
            Column::new("Extension", DataType::String),
            Column::new("Length", DataType::Integer),
            Column::new("CreationTime", DataType::DateTime),
            Column::new("LastWriteTime", DataType::DateTime),
            Column::new("LastAccessTime", DataType::DateTime),
            Column::new("Attributes", DataType::String),
        ]
    }

    fn fill(&mut self, path: &Path, metadata: &Metadata) {
        let full_name = path.to_string_lossy().into_owned();
        let name = file_name(path);
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let attributes = attributes(&name, metadata);

        self.record.columns = vec![
            Value::String(full_name.clone()),
            Value::String(name),
            Value::String(extension),
            Value::Integer(i64::try_from(metadata.len()).unwrap_or(i64::MAX)),
            timestamp(metadata.created().or_else(|_| metadata.modified())),
            timestamp(metadata.modified()),
            timestamp(metadata.accessed().or_else(|_| metadata.modified())),
            Value::String(attributes),
        ];
        self.record.original_columns.clone_from(&self.record.columns);
        self.record.line_no += 1;
        self.record.total_line_no += 1;
        self.record.source = full_name;
    }
}

impl Provider for DirectoryProvider {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn initialize(&mut self, state: &mut QueryState) -> Result<(), QueryError> {
        let pattern = self
            .path
            .evaluate(state, &ProviderRecord::default())?
            .to_text(state.culture(), None)?;
        let search = FileSearch::new(&state.current_directory, &pattern, self.recursive);
        let mut files = search.find(&state.comparer)?;
        if let Some(order) = self.order {
            sort_files(&mut files, order, &state.comparer);
        }
        self.files = files;
        self.position = 0;
        self.record.clear();
        Ok(())
    }

    fn next_record(&mut self, _state: &mut QueryState) -> Result<bool, QueryError> {
        while self.position < self.files.len() {
            let path = self.files[self.position].clone();
            self.position += 1;
            match fs::metadata(&path) {
                Ok(metadata) => {
                    self.fill(&path, &metadata);
                    return Ok(true);
                }
                // Listed at initialize, gone by now
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }
        self.record.clear();
        Ok(false)
    }

    fn record(&self) -> &ProviderRecord {
        &self.record
    }

    fn uninitialize(&mut self) {
        self.files.clear();
        self.position = 0;
    }
}
