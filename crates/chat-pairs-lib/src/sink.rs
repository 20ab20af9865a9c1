//! Tabular output of question/answer pairs.
//!
//! Rows are written to a sibling `.<name>.partial` file which is renamed over
//! the destination only once every row has been flushed. If anything fails
//! the partial file is removed and the destination keeps its previous
//! contents, so a failed run never leaves half a dataset behind.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::OutputFormat;
use crate::error::{PairsError, Result};
use crate::model::qa_pair::QaPair;

/// Column headers, in order.
pub const COLUMNS: [&str; 2] = ["question", "answer"];

/// Called after each row with the number of rows written so far.
pub type RowCallback<'a> = &'a dyn Fn(usize);

/// Path of the temporary file used while writing `path`.
pub fn partial_path(path: &Path) -> Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        PairsError::configuration(format!("output path '{}' has no file name", path.display()))
    })?;
    let mut partial = std::ffi::OsString::from(".");
    partial.push(name);
    partial.push(".partial");
    Ok(path.with_file_name(partial))
}

/// Write `pairs` to `path` in `format`, replacing the file atomically.
///
/// # Returns
///
/// The number of rows written (header excluded).
///
/// # Errors
///
/// Any I/O or encoding failure. The destination is untouched in that case.
pub fn write_pairs<I>(
    path: &Path,
    format: OutputFormat,
    pairs: I,
    on_row: Option<RowCallback<'_>>,
) -> Result<usize>
where
    I: IntoIterator<Item = QaPair>,
{
    let partial = partial_path(path)?;
    let file = File::create(&partial)?;

    // Remove the partial file on every early return below.
    let guard = scopeguard::guard(partial, |p| {
        if let Err(e) = fs::remove_file(&p) {
            tracing::warn!(path = %p.display(), error = %e, "could not remove partial output");
        }
    });

    let written = match format {
        OutputFormat::Csv => write_csv(file, pairs, on_row)?,
        OutputFormat::Jsonl => write_jsonl(file, pairs, on_row)?,
    };

    fs::rename(&*guard, path)?;
    let _ = scopeguard::ScopeGuard::into_inner(guard);

    tracing::info!(path = %path.display(), rows = written, format = format.as_str(), "wrote pairs");
    Ok(written)
}

fn write_csv<I>(file: File, pairs: I, on_row: Option<RowCallback<'_>>) -> Result<usize>
where
    I: IntoIterator<Item = QaPair>,
{
    // Header is written by hand so an empty dataset still gets one.
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    wtr.write_record(COLUMNS)?;

    let mut rows = 0usize;
    for pair in pairs {
        wtr.serialize(&pair)?;
        rows += 1;
        if let Some(cb) = on_row {
            cb(rows);
        }
    }

    let file = wtr.into_inner().map_err(|e| PairsError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(rows)
}

fn write_jsonl<I>(file: File, pairs: I, on_row: Option<RowCallback<'_>>) -> Result<usize>
where
    I: IntoIterator<Item = QaPair>,
{
    let mut w = BufWriter::new(file);
    let mut rows = 0usize;
    for pair in pairs {
        serde_json::to_writer(&mut w, &pair)?;
        w.write_all(b"\n")?;
        rows += 1;
        if let Some(cb) = on_row {
            cb(rows);
        }
    }

    let file = w.into_inner().map_err(|e| PairsError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(rows)
}
