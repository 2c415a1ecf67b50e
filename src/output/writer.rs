use crate::error::Error;
use crate::flatten::Row;
use crate::source::{ArrayElement, Record};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// Counters from writing a JSON array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayStats {
    pub elements: usize,
    /// Payloads that were not JSON and were written as string literals
    pub text_elements: usize,
}

/// Write every record as one element of a JSON array
///
/// JSON payloads are embedded verbatim; anything else becomes a string.
/// `pretty` indents the array and structured records only: payload text,
/// whitespace and key order included, is copied as it arrived.
pub fn write_json_array<W: Write>(
    mut writer: W,
    records: &[Record],
    pretty: bool,
) -> serde_json::Result<ArrayStats> {
    let mut stats = ArrayStats::default();

    let elements: Vec<ArrayElement<'_>> = records
        .iter()
        .enumerate()
        .map(|(index, record)| match record.array_element() {
            Ok(element) => element,
            Err(err) => {
                warn!(record = index, "Writing payload as a string: {}", err);
                stats.text_elements += 1;
                ArrayElement::Text(record.lossy_text().into_owned())
            }
        })
        .collect();
    stats.elements = elements.len();

    if pretty {
        serde_json::to_writer_pretty(&mut writer, &elements)?;
    } else {
        serde_json::to_writer(&mut writer, &elements)?;
    }
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    writer.flush().map_err(serde_json::Error::io)?;

    Ok(stats)
}

/// CSV table writer: a header line, then one line per row
pub struct TableWriter<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
    rows_written: usize,
    rows_skipped: usize,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W, header: &[String]) -> io::Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(header)?;
        Ok(TableWriter {
            writer,
            width: header.len(),
            rows_written: 0,
            rows_skipped: 0,
        })
    }

    /// Write one row; a row that cannot be written is logged and skipped
    pub fn write_row(&mut self, row: &Row) {
        if row.len() != self.width {
            warn!(expected = self.width, found = row.len(), "Skipping row with wrong width");
            self.rows_skipped += 1;
            return;
        }

        match self.writer.write_record(row) {
            Ok(()) => self.rows_written += 1,
            Err(err) => {
                warn!("Failed to write row: {}", err);
                self.rows_skipped += 1;
            }
        }
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    /// Flush buffered rows and hand back the inner writer
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}

/// An output file that only appears at its final path once complete
///
/// Content goes to a temporary file next to the destination and is renamed
/// into place by [`OutputFile::commit`]. Dropping it uncommitted removes the
/// temporary file.
pub struct OutputFile {
    path: PathBuf,
    file: NamedTempFile,
}

impl OutputFile {
    /// Create the parent directories and a temporary file beside `path`
    pub fn create(path: &Path) -> Result<Self, Error> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        std::fs::create_dir_all(dir).map_err(|source| Error::OutputCreate {
            path: dir.to_path_buf(),
            source,
        })?;

        let file = NamedTempFile::new_in(dir).map_err(|source| Error::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(OutputFile {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Move the finished file to its destination
    pub fn commit(self) -> Result<(), Error> {
        let OutputFile { path, file } = self;
        file.persist(&path)
            .map_err(|err| Error::write(&path, err.error))?;
        Ok(())
    }
}
