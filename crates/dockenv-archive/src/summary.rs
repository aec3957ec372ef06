//! Listing of archive contents

use crate::error::{RebaseError, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use tar::{Archive, EntryType};

/// Kind of an archive entry, as far as listings care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    HardLink,
    Other,
}

impl From<EntryType> for EntryKind {
    fn from(kind: EntryType) -> Self {
        match kind {
            EntryType::Regular | EntryType::Continuous => EntryKind::File,
            EntryType::Directory => EntryKind::Directory,
            EntryType::Symlink => EntryKind::Symlink,
            EntryType::Link => EntryKind::HardLink,
            _ => EntryKind::Other,
        }
    }
}

/// One line of an archive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySummary {
    /// Entry name (lossy UTF-8)
    pub name: String,
    pub size: u64,
    pub kind: EntryKind,
}

/// List the entries of a tar stream in archive order.
pub fn summarize<R: Read>(reader: R) -> Result<Vec<EntrySummary>> {
    let mut archive = Archive::new(reader);
    let mut summaries = Vec::new();
    for entry in archive.entries().map_err(RebaseError::ReadHeader)? {
        let entry = entry.map_err(RebaseError::ReadHeader)?;
        summaries.push(EntrySummary {
            name: String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
            size: entry.size(),
            kind: entry.header().entry_type().into(),
        });
    }
    Ok(summaries)
}
