//! The knowledge entry type and its on-disk frontmatter representation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Question,
    Answer,
    Note,
    Issue,
    Milestone,
}

impl EntryType {
    /// The uppercase prefix used in `<TYPE>_<N>.md` filenames and
    /// `[[TYPE_N]]` cross-references.
    pub fn prefix(self) -> &'static str {
        match self {
            EntryType::Question => "QUESTION",
            EntryType::Answer => "ANSWER",
            EntryType::Note => "NOTE",
            EntryType::Issue => "ISSUE",
            EntryType::Milestone => "MILESTONE",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "QUESTION" => Some(EntryType::Question),
            "ANSWER" => Some(EntryType::Answer),
            "NOTE" => Some(EntryType::Note),
            "ISSUE" => Some(EntryType::Issue),
            "MILESTONE" => Some(EntryType::Milestone),
            _ => None,
        }
    }
}

/// Status bucket an entry lives in. The directory name on disk differs
/// from the serde form (`in-progress` has a hyphen the Rust identifier
/// can't carry), so [`EntryStatus::dir_name`] is the source of truth for
/// filesystem paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryStatus {
    Open,
    InProgress,
    Completed,
    Archived,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 4] = [
        EntryStatus::Open,
        EntryStatus::InProgress,
        EntryStatus::Completed,
        EntryStatus::Archived,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            EntryStatus::Open => "open",
            EntryStatus::InProgress => "in-progress",
            EntryStatus::Completed => "completed",
            EntryStatus::Archived => "archived",
        }
    }
}

/// Frontmatter fields, serialized as the YAML block at the top of each
/// entry file. `extra` carries type-specific fields the caller supplied
/// that have no fixed column here (e.g. an issue's `severity`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontmatter {
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

/// A fully materialized knowledge entry: frontmatter plus the markdown
/// body that follows it.
#[derive(Debug, Clone)]
pub struct Entry {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl Entry {
    pub fn id(&self) -> &str {
        &self.frontmatter.id
    }

    pub fn filename(&self) -> String {
        format!("{}.md", self.frontmatter.id)
    }
}

/// Fields supplied by the caller when creating an entry; `id` is assigned
/// by the store.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub entry_type: EntryType,
    pub status: EntryStatus,
    pub tags: Vec<String>,
    pub body: String,
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for EntryType {
    fn default() -> Self {
        EntryType::Note
    }
}

impl Default for EntryStatus {
    fn default() -> Self {
        EntryStatus::Open
    }
}

/// Non-empty fields to merge into an existing entry.
#[derive(Debug, Clone, Default)]
pub struct EntryPatch {
    pub status: Option<EntryStatus>,
    pub tags: Option<Vec<String>>,
    pub body: Option<String>,
    pub extra: HashMap<String, serde_yaml::Value>,
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
