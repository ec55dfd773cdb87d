//! Flat-file helpers: line lists, CSV tables, timestamped outputs

use crate::time::file_stamp;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fail with `MissingFiles` unless every path exists
///
/// Checked before any processing starts so a run never half-completes
/// because of an absent input.
pub fn confirm_files<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let missing: Vec<PathBuf> = paths
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.exists())
        .map(Path::to_path_buf)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingFiles(missing))
    }
}

/// Load a one-entry-per-line text file, trimming and skipping blank lines
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_start_matches('\u{feff}').trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    debug!(path = %path.display(), entries = lines.len(), "Loaded line list");
    Ok(lines)
}

/// Load a position-aligned line list: interior blank lines are kept as empty
/// entries, trailing blank lines are dropped
pub fn load_entries(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        entries.push(line.trim_start_matches('\u{feff}').trim().to_string());
    }
    while entries.last().is_some_and(|e| e.is_empty()) {
        entries.pop();
    }
    debug!(path = %path.display(), entries = entries.len(), "Loaded aligned list");
    Ok(entries)
}

/// Load a headerless CSV file as raw rows of varying length
pub fn load_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(path = %path.display(), rows = rows.len(), "Loaded CSV rows");
    Ok(rows)
}

/// Deserialize every record of a CSV file that has a header row
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    debug!(path = %path.display(), records = records.len(), "Loaded CSV records");
    Ok(records)
}

/// Path `<dir>/<prefix>_<timestamp>.<extension>`
pub fn stamped_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    path_at(dir, prefix, &file_stamp(), extension)
}

/// Path `<dir>/<prefix>_<stamp>.<extension>` for a given stamp
pub fn path_at(dir: &Path, prefix: &str, stamp: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, stamp, extension))
}

/// Create a file that must not already exist
///
/// Outputs are always fresh snapshots; an existing file is never replaced.
pub fn create_new(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                Error::InvalidInput(format!("refusing to overwrite {}", path.display()))
            } else {
                Error::Io(e)
            }
        })
}

/// Render a header and rows as CSV bytes
pub fn render_table<H, R, S>(headings: &[H], rows: R) -> Result<Vec<u8>>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<S>>,
    S: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headings.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Write `contents` to a new file, removing it again if the write fails
fn write_new(path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = create_new(path)?;
    if let Err(e) = file.write_all(contents).and_then(|()| file.flush()) {
        drop(file);
        remove_output(path);
        return Err(Error::Io(e));
    }
    Ok(())
}

fn remove_output(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove partial output");
    }
}

/// Write a header and rows as CSV to a new file
pub fn write_table<H, R, S>(path: &Path, headings: &[H], rows: R) -> Result<()>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<S>>,
    S: AsRef<[u8]>,
{
    write_new(path, &render_table(headings, rows)?)?;
    debug!(path = %path.display(), "Wrote CSV table");
    Ok(())
}

/// Output files of one run, rendered in memory and written together
///
/// `commit` writes nothing if any target already exists, and removes the
/// files it has written when a later write fails, so a run either leaves
/// every output or none.
#[derive(Debug, Default)]
pub struct OutputSet {
    files: Vec<(PathBuf, Vec<u8>)>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a CSV table
    pub fn add_table<H, R, S>(&mut self, path: PathBuf, headings: &[H], rows: R) -> Result<()>
    where
        H: AsRef<str>,
        R: IntoIterator<Item = Vec<S>>,
        S: AsRef<[u8]>,
    {
        let contents = render_table(headings, rows)?;
        self.files.push((path, contents));
        Ok(())
    }

    /// Queue a line list
    pub fn add_lines<S: AsRef<str>>(&mut self, path: PathBuf, lines: &[S]) {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(line.as_ref());
            contents.push('\n');
        }
        self.files.push((path, contents.into_bytes()));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every queued file; returns their paths in queue order
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let existing: Vec<String> = self
            .files
            .iter()
            .filter(|(path, _)| path.exists())
            .map(|(path, _)| path.display().to_string())
            .collect();
        if !existing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "refusing to overwrite {}",
                existing.join(", ")
            )));
        }

        let mut written: Vec<PathBuf> = Vec::with_capacity(self.files.len());
        for (path, contents) in self.files {
            if let Err(e) = write_new(&path, &contents) {
                warn!(path = %path.display(), removed = written.len(), "Output write failed; removing earlier outputs");
                written.iter().for_each(|done| remove_output(done));
                return Err(e);
            }
            debug!(path = %path.display(), bytes = contents.len(), "Wrote output");
            written.push(path);
        }
        Ok(written)
    }
}
