//! Container and entry types for the object store.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::path;

/// A top-level namespace in the object store (a bucket).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Store-wide unique name.
    pub name: String,
    /// Region the container lives in.
    pub region: String,
    /// Aggregate size of all objects in bytes.
    pub size: u64,
    /// Number of objects, or `None` when the backend could not count them.
    pub object_count: Option<u64>,
    /// Creation time.
    pub created: DateTime<Utc>,
}

impl Container {
    /// Create a container record.
    pub fn new(name: impl Into<String>, region: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            size: 0,
            object_count: Some(0),
            created,
        }
    }

    /// Set the aggregate size and object count.
    pub fn with_usage(mut self, size: u64, object_count: Option<u64>) -> Self {
        self.size = size;
        self.object_count = object_count;
        self
    }
}

/// A pseudo-directory derived from a common key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Last path segment.
    pub name: CompactString,
    /// Full prefix, always ending with the delimiter.
    pub full_path: String,
    /// Number of objects below this prefix, when the source reports it.
    pub file_count: Option<u64>,
    /// Aggregate size below this prefix, when the source reports it.
    pub size: Option<u64>,
}

impl FolderEntry {
    /// Create a folder from its full prefix. A missing trailing delimiter is
    /// added.
    pub fn new(full_path: impl Into<String>) -> Self {
        let mut full_path = full_path.into();
        if !path::is_folder_path(&full_path) {
            full_path.push(path::DELIMITER);
        }
        Self {
            name: path::leaf_name(&full_path).into(),
            full_path,
            file_count: None,
            size: None,
        }
    }

    /// Set the reported item count and size.
    pub fn with_usage(mut self, file_count: Option<u64>, size: Option<u64>) -> Self {
        self.file_count = file_count;
        self.size = size;
        self
    }
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Last path segment.
    pub name: CompactString,
    /// Full object key, never ending with the delimiter.
    pub full_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

impl FileEntry {
    /// Create a file entry from its object key.
    pub fn new(full_path: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        let full_path = full_path.into();
        Self {
            name: path::leaf_name(&full_path).into(),
            full_path,
            size,
            last_modified,
        }
    }
}

/// A single row in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entry {
    Folder(FolderEntry),
    File(FileEntry),
}

impl Entry {
    /// Display name of the entry.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::File(f) => &f.name,
        }
    }

    /// Full key or prefix of the entry.
    pub fn full_path(&self) -> &str {
        match self {
            Self::Folder(f) => &f.full_path,
            Self::File(f) => &f.full_path,
        }
    }

    /// Check if this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Folders and files directly under one prefix, as split by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub folders: Vec<FolderEntry>,
    pub files: Vec<FileEntry>,
    /// Prefix the listing was produced for.
    pub current_prefix: String,
}

impl Listing {
    /// Create an empty listing for a prefix.
    pub fn empty(prefix: impl Into<String>) -> Self {
        Self {
            current_prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.folders.len() + self.files.len()
    }

    /// Check if the listing has no rows.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }

    /// All rows, folders first.
    pub fn entries(&self) -> impl Iterator<Item = Entry> + '_ {
        self.folders
            .iter()
            .cloned()
            .map(Entry::Folder)
            .chain(self.files.iter().cloned().map(Entry::File))
    }
}
