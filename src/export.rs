//! Writes search results to timestamp-named CSV or JSON files.
use std::{
    collections::BTreeSet,
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use clap::ValueEnum;
use log::{debug, info};
use serde_json::{Map, Value};

use crate::{MemoError, Note, Result};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Exports `notes` into `dir` and returns the path written.
///
/// Files are named `export_YYYYMMDD-HHMMSS.<ext>`; a `-N` suffix is added
/// when that name is taken, so earlier exports are never overwritten.
pub fn export_notes(notes: &[Note], format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let (path, file) = create_unique(dir, &stamp, format.extension())?;
    debug!("Exporting {} notes to {}", notes.len(), path.display());

    match format {
        ExportFormat::Csv => write_csv(notes, file)?,
        ExportFormat::Json => write_json(notes, file)?,
    }

    info!("Exported {} notes to {}", notes.len(), path.display());
    Ok(path)
}

fn create_unique(dir: &Path, stamp: &str, ext: &str) -> Result<(PathBuf, File)> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("export_{stamp}.{ext}")
        } else {
            format!("export_{stamp}-{attempt}.{ext}")
        };
        let path = dir.join(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(MemoError::Io(e)),
        }
    }
}

/// Columns are the sorted union of every key seen; absent values are empty.
fn write_csv(notes: &[Note], file: File) -> Result<()> {
    let rows: Vec<Map<String, Value>> = notes
        .iter()
        .map(|note| match serde_json::to_value(note) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(e) => Err(MemoError::Serialization(e)),
        })
        .collect::<Result<_>>()?;

    let columns: BTreeSet<&str> = rows.iter().flat_map(|r| r.keys().map(String::as_str)).collect();

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&columns)?;
    for row in &rows {
        writer.write_record(columns.iter().map(|key| cell(row.get(*key))))?;
    }
    writer.flush()?;
    Ok(())
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_json(notes: &[Note], mut file: File) -> Result<()> {
    serde_json::to_writer_pretty(&mut file, notes)?;
    file.write_all(b"\n")?;
    Ok(())
}
