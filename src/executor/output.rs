/// Row output
///
/// Query results leave the engine as lines of delimited text written to an
/// `OutputSink`.

use std::io::Write;
use crate::core::{Culture, ProviderRecord, QueryError};
use crate::state::{HeadingMode, OutputOptions};

/// Line-oriented consumer of formatted rows.
pub trait OutputSink {
    fn write_line(&mut self, line: &str) -> Result<(), QueryError>;
}

impl OutputSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> Result<(), QueryError> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes each line followed by `\n`.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), QueryError> {
        writeln!(self.writer, "{line}")?;
        Ok(())
    }
}

/// Formats rows per the session output options and writes them to the
/// output sink and, if present, the log sink.
///
/// With `auto_size` every row is held back until `finish` so each column
/// can be padded to its widest cell.
pub struct RowFormatter {
    options: OutputOptions,
    names: Vec<String>,
    buffered: Vec<Vec<String>>,
    heading_written: bool,
}

impl RowFormatter {
    #[must_use]
    pub fn new(options: &OutputOptions, names: Vec<String>) -> Self {
        Self {
            options: options.clone(),
            names,
            buffered: Vec::new(),
            heading_written: false,
        }
    }

    pub fn write_record<'o>(
        &mut self,
        record: &ProviderRecord,
        culture: &Culture,
        output: &mut dyn OutputSink,
        mut log: Option<&mut (dyn OutputSink + 'o)>,
    ) -> Result<(), QueryError> {
        let cells = record
            .columns
            .iter()
            .map(|v| v.to_text(culture, None))
            .collect::<Result<Vec<_>, _>>()?;

        if self.options.auto_size {
            self.buffered.push(cells);
            return Ok(());
        }
        if !self.heading_written {
            self.heading_written = true;
            for line in self.heading(&[]) {
                emit(&line, output, log.as_deref_mut())?;
            }
        }
        emit(&cells.join(&self.options.delimiter), output, log)
    }

    /// Flushes buffered rows. Writes the heading even when no row was
    /// produced.
    pub fn finish<'o>(&mut self, output: &mut dyn OutputSink, mut log: Option<&mut (dyn OutputSink + 'o)>) -> Result<(), QueryError> {
        if !self.options.auto_size {
            if !self.heading_written {
                self.heading_written = true;
                for line in self.heading(&[]) {
                    emit(&line, output, log.as_deref_mut())?;
                }
            }
            return Ok(());
        }

        let widths = self.widths();
        self.heading_written = true;
        for line in self.heading(&widths) {
            emit(&line, output, log.as_deref_mut())?;
        }
        for row in std::mem::take(&mut self.buffered) {
            emit(&self.pad(&row, &widths), output, log.as_deref_mut())?;
        }
        Ok(())
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = if self.options.heading == HeadingMode::Off {
            vec![0; self.names.len()]
        } else {
            self.names.iter().map(|n| n.chars().count()).collect()
        };
        for row in &self.buffered {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        widths
    }

    // Every column but the last is padded to its width
    fn pad(&self, cells: &[String], widths: &[usize]) -> String {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| match widths.get(i) {
                Some(&w) if i < last => format!("{cell:<w$}"),
                _ => cell.clone(),
            })
            .collect::<Vec<_>>()
            .join(&self.options.delimiter)
    }

    fn heading(&self, widths: &[usize]) -> Vec<String> {
        if self.options.heading == HeadingMode::Off || self.names.is_empty() {
            return Vec::new();
        }
        let mut lines = if widths.is_empty() {
            vec![self.names.join(&self.options.delimiter)]
        } else {
            vec![self.pad(&self.names, widths)]
        };
        if self.options.heading == HeadingMode::Rule {
            let rule: Vec<String> = self
                .names
                .iter()
                .enumerate()
                .map(|(i, n)| "-".repeat(widths.get(i).copied().unwrap_or_else(|| n.chars().count())))
                .collect();
            lines.push(rule.join(&self.options.delimiter));
        }
        lines
    }
}

fn emit<'o>(line: &str, output: &mut dyn OutputSink, log: Option<&mut (dyn OutputSink + 'o)>) -> Result<(), QueryError> {
    output.write_line(line)?;
    if let Some(log) = log {
        log.write_line(line)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    fn record(values: &[Value]) -> ProviderRecord {
        ProviderRecord::new(values.to_vec())
    }

    fn run(options: &OutputOptions, rows: &[Vec<Value>]) -> Vec<String> {
        let mut formatter = RowFormatter::new(options, vec!["Name".into(), "Size".into()]);
        let mut out: Vec<String> = Vec::new();
        let culture = Culture::invariant();
        for row in rows {
            formatter.write_record(&record(row), &culture, &mut out, None).unwrap();
        }
        formatter.finish(&mut out, None).unwrap();
        out
    }

    fn rows() -> Vec<Vec<Value>> {
        vec![
            vec![Value::String("a.log".into()), Value::Integer(10)],
            vec![Value::String("longer.log".into()), Value::Integer(2)],
        ]
    }

    #[test]
    fn test_plain_with_heading() {
        let out = run(&OutputOptions::default(), &rows());
        assert_eq!(out, vec!["Name\tSize", "a.log\t10", "longer.log\t2"]);
    }

    #[test]
    fn test_heading_rule_and_delimiter() {
        let options = OutputOptions {
            delimiter: ",".into(),
            heading: HeadingMode::Rule,
            auto_size: false,
        };
        let out = run(&options, &rows());
        assert_eq!(out[..2], ["Name,Size".to_string(), "----,----".to_string()]);
    }

    #[test]
    fn test_auto_size_pads_columns() {
        let options = OutputOptions {
            delimiter: " ".into(),
            heading: HeadingMode::Rule,
            auto_size: true,
        };
        let out = run(&options, &rows());
        assert_eq!(
            out,
            vec!["Name       Size", "---------- ----", "a.log      10", "longer.log 2"]
        );
    }

    #[test]
    fn test_heading_off_and_empty_result() {
        let options = OutputOptions {
            heading: HeadingMode::Off,
            ..OutputOptions::default()
        };
        assert_eq!(run(&options, &rows()).len(), 2);
        assert_eq!(run(&OutputOptions::default(), &[]), vec!["Name\tSize"]);
    }

    #[test]
    fn test_log_sink_receives_rows() {
        let mut formatter = RowFormatter::new(&OutputOptions::default(), vec!["x".into()]);
        let mut out: Vec<String> = Vec::new();
        let mut log: Vec<String> = Vec::new();
        formatter
            .write_record(&record(&[Value::Integer(1)]), &Culture::invariant(), &mut out, Some(&mut log))
            .unwrap();
        assert_eq!(out, log);
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write_line("one").unwrap();
        sink.write_line("two").unwrap();
        assert_eq!(sink.into_inner(), b"one\ntwo\n");
    }
}
