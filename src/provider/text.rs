use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use crate::core::{Column, DataType, ProviderRecord, QueryError, Value};
use crate::expression::Expression;
use crate::parser::{DirectoryOrder, SortOrder};
use crate::state::QueryState;
use super::directory::{sort_files, FileSearch};
use super::Provider;

/// One row per line of every file matching a pattern, files in ascending
/// name order. Each file is opened when the previous one is exhausted.
pub struct TextProvider {
    path: Expression,
    aliases: Vec<String>,
    columns: Vec<Column>,
    files: Vec<PathBuf>,
    next_file: usize,
    reader: Option<BufReader<File>>,
    buffer: Vec<u8>,
    record: ProviderRecord,
}

impl TextProvider {
    #[must_use]
    pub fn new(path: Expression, aliases: Vec<String>) -> Self {
        Self {
            path,
            aliases,
            columns: Self::schema(),
            files: Vec::new(),
            next_file: 0,
            reader: None,
            buffer: Vec::new(),
            record: ProviderRecord::default(),
        }
    }

    #[must_use]
    pub fn schema() -> Vec<Column> {
        vec![Column::new("Line", DataType::String)]
    }

    fn open_next(&mut self) -> Result<bool, QueryError> {
        let Some(path) = self.files.get(self.next_file) else {
            return Ok(false);
        };
        self.next_file += 1;
        log::debug!("reading {}", path.display());
        self.reader = Some(BufReader::new(File::open(path)?));
        self.record.line_no = 0;
        self.record.source = path.to_string_lossy().into_owned();
        Ok(true)
    }
}

impl Provider for TextProvider {
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
        let search = FileSearch::new(&state.current_directory, &pattern, false);
        let mut files = search.find(&state.comparer)?;
        sort_files(&mut files, DirectoryOrder::Name(SortOrder::Asc), &state.comparer);
        self.files = files;
        self.next_file = 0;
        self.reader = None;
        self.record.clear();
        Ok(())
    }

    fn next_record(&mut self, _state: &mut QueryState) -> Result<bool, QueryError> {
        loop {
            let Some(reader) = self.reader.as_mut() else {
                if self.open_next()? {
                    continue;
                }
                self.record.clear();
                return Ok(false);
            };

            self.buffer.clear();
            if reader.read_until(b'\n', &mut self.buffer)? == 0 {
                self.reader = None;
                continue;
            }
            while matches!(self.buffer.last(), Some(b'\n' | b'\r')) {
                self.buffer.pop();
            }

            let line = Value::String(String::from_utf8_lossy(&self.buffer).into_owned());
            self.record.columns = vec![line];
            self.record.original_columns.clone_from(&self.record.columns);
            self.record.line_no += 1;
            self.record.total_line_no += 1;
            return Ok(true);
        }
    }

    fn record(&self) -> &ProviderRecord {
        &self.record
    }

    fn uninitialize(&mut self) {
        self.reader = None;
        self.files.clear();
        self.next_file = 0;
    }
}
