//! JSON Lines helpers shared by the graph loader and plan storage.
//!
//! Reading is resilient: a malformed line is reported and skipped rather than
//! failing the whole load. Writing is atomic: records go to a sibling `.tmp`
//! file which is then renamed over the target, so a crash mid-write leaves the
//! previous file intact.

use crate::error::{Error, Result, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MalformedLine {
    /// 1-based line number
    pub line_number: usize,
    /// Parser message
    pub error: String,
}

/// Read every parseable record from a JSONL file.
///
/// Blank lines are ignored. Each record is returned with its 1-based line
/// number so callers can report later validation failures precisely.
pub(crate) async fn read_jsonl_resilient<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<(usize, T)>, Vec<MalformedLine>)> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut malformed = Vec::new();
    let mut line_number = 0;
    let mut buf = Vec::new();

    // Invalid UTF-8 is a malformed line, not an I/O error
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        line_number += 1;
        let parsed = std::str::from_utf8(&buf)
            .map_err(|e| e.to_string())
            .and_then(|line| {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    serde_json::from_str::<T>(trimmed)
                        .map(Some)
                        .map_err(|e| e.to_string())
                }
            });
        match parsed {
            Ok(Some(record)) => records.push((line_number, record)),
            Ok(None) => {}
            Err(error) => malformed.push(MalformedLine { line_number, error }),
        }
        buf.clear();
    }

    Ok((records, malformed))
}

/// Atomically replace `path` with one JSON line per value.
pub(crate) async fn write_jsonl_atomic<T, I>(path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let temp_path = temp_path_for(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        // Best-effort cleanup; the original file is untouched
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await.map_err(Error::Io)?;
    let mut writer = BufWriter::new(file);

    for value in values {
        let json = serde_json::to_string(&value).map_err(StorageError::Serialization)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    Ok(())
}

/// `plans.jsonl` -> `plans.jsonl.tmp`, `plans` -> `plans.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}
