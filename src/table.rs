//! Delimited-file persistence for [`ChannelRecord`] rows (header + one row per record).

use crate::error::HarvestError;
use crate::record::ChannelRecord;
use crate::util::{create_with_backoff, open_with_backoff, remove_with_backoff, replace_file_atomic_backoff, temp_sibling};
use anyhow::Result;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Persisted column order.
pub const HEADER: [&str; 8] = [
    "channelId",
    "title",
    "description",
    "publishedAt",
    "subscriberCount",
    "viewCount",
    "videoCount",
    "query",
];

#[derive(Clone, Debug)]
pub struct TableFile {
    path: PathBuf,
}

impl TableFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    #[inline] pub fn path(&self) -> &Path { &self.path }
    #[inline] pub fn exists(&self) -> bool { self.path.exists() }

    /// All persisted rows, or an empty list when the file does not exist.
    /// Anything unparseable is a `StorageRead` error; rows are never skipped.
    pub fn load(&self) -> Result<Vec<ChannelRecord>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        if !self.path.is_file() {
            return Err(self.read_err("not a regular file").into());
        }
        let f = open_with_backoff(&self.path, 16, 50).map_err(|e| self.read_err(e))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(f));

        let headers = rdr.headers().map_err(|e| self.read_err(e))?;
        if !headers.iter().eq(HEADER.iter().copied()) {
            let found: Vec<&str> = headers.iter().collect();
            return Err(self.read_err(format!("unexpected header {:?}, expected {:?}", found, HEADER)).into());
        }

        let mut rows = Vec::new();
        for row in rdr.deserialize::<ChannelRecord>() {
            rows.push(row.map_err(|e| self.read_err(e))?);
        }
        Ok(rows)
    }

    /// Replace the file with exactly `rows`. Written to a sibling temp file first,
    /// so an interrupted save leaves the previous content in place.
    pub fn save(&self, rows: &[ChannelRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }
        let tmp = temp_sibling(&self.path);
        if let Err(e) = self.write_rows(&tmp, rows) {
            let _ = remove_with_backoff(&tmp, 4, 50);
            return Err(e);
        }
        replace_file_atomic_backoff(&tmp, &self.path).map_err(|e| self.write_err(format!("{e:#}")))?;
        Ok(())
    }

    fn write_rows(&self, tmp: &Path, rows: &[ChannelRecord]) -> Result<()> {
        let f = create_with_backoff(tmp, 16, 50).map_err(|e| self.write_err(e))?;
        // header written by hand so an empty store still round-trips
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::with_capacity(256 * 1024, f));
        wtr.write_record(HEADER).map_err(|e| self.write_err(e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| self.write_err(e))?;
        }
        let mut buf = wtr.into_inner().map_err(|e| self.write_err(e.error()))?;
        buf.flush().map_err(|e| self.write_err(e))?;
        let file = buf.into_inner().map_err(|e| self.write_err(e.error()))?;
        file.sync_all().map_err(|e| self.write_err(e))?;
        Ok(())
    }

    fn read_err(&self, reason: impl ToString) -> HarvestError {
        HarvestError::StorageRead { path: self.path.clone(), reason: reason.to_string() }
    }

    fn write_err(&self, reason: impl ToString) -> HarvestError {
        HarvestError::StorageWrite { path: self.path.clone(), reason: reason.to_string() }
    }
}
