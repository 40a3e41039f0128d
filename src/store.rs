//! Accumulated channel records plus the membership set used for dedupe.
//!
//! `collected` and `seen` change together in [`ResultStore::append`]; nothing
//! else mutates them after load. Persistence goes through [`TableFile`].

use crate::record::ChannelRecord;
use crate::table::TableFile;
use ahash::AHashSet;
use anyhow::Result;
use std::path::Path;

pub struct ResultStore {
    table: TableFile,
    collected: Vec<ChannelRecord>,
    seen: AHashSet<String>,
    checkpoint_every: usize,
    checkpoints: u64,
}

impl ResultStore {
    /// Empty store writing to `path`. Call [`Self::resume`] to pick up persisted rows.
    pub fn new(path: impl AsRef<Path>, checkpoint_every: usize) -> Self {
        Self {
            table: TableFile::new(path),
            collected: Vec::new(),
            seen: AHashSet::new(),
            checkpoint_every: checkpoint_every.max(1),
            checkpoints: 0,
        }
    }

    /// `new` followed by `resume`.
    pub fn open(path: impl AsRef<Path>, checkpoint_every: usize) -> Result<Self> {
        let mut store = Self::new(path, checkpoint_every);
        store.resume()?;
        Ok(store)
    }

    /// Read persisted rows and their id set. Missing file → empty; malformed → error.
    /// A repeated id keeps its first row.
    pub fn load(&self) -> Result<(Vec<ChannelRecord>, AHashSet<String>)> {
        let rows = self.table.load()?;
        let mut seen = AHashSet::with_capacity(rows.len());
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.insert(row.channel_id.clone()) {
                records.push(row);
            } else {
                tracing::warn!("duplicate channelId {} in {}; keeping first row", row.channel_id, self.table.path().display());
            }
        }
        Ok((records, seen))
    }

    /// Replace in-memory state with what is persisted. Returns the number of rows loaded.
    pub fn resume(&mut self) -> Result<usize> {
        let (records, seen) = self.load()?;
        self.collected = records;
        self.seen = seen;
        if self.collected.is_empty() {
            tracing::info!("No previous data at {}. Starting fresh.", self.table.path().display());
        } else {
            tracing::info!("Resuming from {} saved channels.", self.collected.len());
        }
        Ok(self.collected.len())
    }

    /// Add a record unless its id is already present. Returns whether it was added.
    pub fn append(&mut self, record: ChannelRecord) -> bool {
        if self.seen.contains(&record.channel_id) {
            return false;
        }
        self.seen.insert(record.channel_id.clone());
        self.collected.push(record);
        true
    }

    /// True when the record count is a positive multiple of the checkpoint interval.
    #[inline]
    pub fn checkpoint_due(&self) -> bool {
        !self.collected.is_empty() && self.collected.len() % self.checkpoint_every == 0
    }

    /// Overwrite persisted storage with every record collected so far.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.table.save(&self.collected)?;
        self.checkpoints += 1;
        tracing::info!("Saved {} channels so far...", self.collected.len());
        Ok(())
    }

    /// Last write of a run, regardless of where the cadence stands.
    pub fn flush_final(&mut self) -> Result<()> {
        self.table.save(&self.collected)?;
        tracing::info!("Final save: {} channels written to {}", self.collected.len(), self.table.path().display());
        Ok(())
    }

    #[inline] pub fn contains(&self, channel_id: &str) -> bool { self.seen.contains(channel_id) }
    #[inline] pub fn len(&self) -> usize { self.collected.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.collected.is_empty() }
    #[inline] pub fn records(&self) -> &[ChannelRecord] { &self.collected }
    #[inline] pub fn ids(&self) -> &AHashSet<String> { &self.seen }
    #[inline] pub fn checkpoint_every(&self) -> usize { self.checkpoint_every }
    /// Cadence checkpoints written by this store (the final flush is not counted).
    #[inline] pub fn checkpoints(&self) -> u64 { self.checkpoints }
    #[inline] pub fn path(&self) -> &Path { self.table.path() }
}
