//! C9: markdown-file-backed CRUD with YAML frontmatter.

use crate::entry::{Entry, EntryPatch, EntryStatus, EntryType, Frontmatter, NewEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use supervisor_core::Clock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("entry {0} not found")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),
    #[error("malformed entry file: {0}")]
    Malformed(String),
}

/// Event emitted by a successful mutating operation. The gateway forwards
/// these as `knowledge_*` frames; the store itself never talks to the
/// gateway or the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeEvent {
    Created(String),
    Updated(String),
    Deleted(String),
    Linked { from: String, to: String },
    Accepted(String),
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub entry_type: Option<EntryType>,
    pub tag: Option<String>,
    pub statuses: Option<Vec<EntryStatus>>,
}

impl ListFilter {
    fn matches(&self, entry: &Entry) -> bool {
        if let Some(ty) = self.entry_type {
            if entry.frontmatter.entry_type != ty {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !entry.frontmatter.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&entry.frontmatter.status) {
                return false;
            }
        }
        true
    }
}

/// Markdown-file-backed knowledge store rooted at a directory with one
/// subfolder per [`EntryStatus`]. Per-type counters are recovered by
/// scanning existing files at construction time, so ids stay monotonic
/// across restarts without a separate index file.
pub struct KnowledgeStore<C: Clock> {
    root: PathBuf,
    clock: C,
    counters: Mutex<HashMap<EntryType, u64>>,
}

impl<C: Clock> KnowledgeStore<C> {
    /// Create (if needed) the four status subdirectories under `root` and
    /// recover per-type counters from whatever entries already exist.
    pub fn open(root: impl Into<PathBuf>, clock: C) -> Result<Self, KnowledgeError> {
        let root = root.into();
        for status in EntryStatus::ALL {
            fs::create_dir_all(root.join(status.dir_name()))?;
        }
        let counters = Mutex::new(recover_counters(&root)?);
        Ok(Self { root, clock, counters })
    }

    pub fn create(&self, new_entry: NewEntry) -> Result<(Entry, KnowledgeEvent), KnowledgeError> {
        let id = self.next_id(new_entry.entry_type);
        let now = self.timestamp();
        let entry = Entry {
            frontmatter: Frontmatter {
                id: id.clone(),
                entry_type: new_entry.entry_type,
                status: new_entry.status,
                created_at: now.clone(),
                updated_at: now,
                tags: new_entry.tags,
                extra: new_entry.extra,
            },
            body: new_entry.body,
        };
        self.write_entry(&entry)?;
        Ok((entry, KnowledgeEvent::Created(id)))
    }

    pub fn get(&self, id: &str) -> Result<Entry, KnowledgeError> {
        let path = self.locate(id)?;
        read_entry(&path)
    }

    pub fn update(&self, id: &str, patch: EntryPatch) -> Result<(Entry, KnowledgeEvent), KnowledgeError> {
        let old_path = self.locate(id)?;
        let mut entry = read_entry(&old_path)?;
        let status_changed = patch
            .status
            .is_some_and(|status| status != entry.frontmatter.status);

        if let Some(status) = patch.status {
            entry.frontmatter.status = status;
        }
        if let Some(tags) = patch.tags {
            entry.frontmatter.tags = tags;
        }
        if let Some(body) = patch.body {
            entry.body = body;
        }
        entry.frontmatter.extra.extend(patch.extra);
        entry.frontmatter.updated_at = self.timestamp();

        if status_changed {
            fs::remove_file(&old_path)?;
        }
        self.write_entry(&entry)?;
        Ok((entry, KnowledgeEvent::Updated(id.to_string())))
    }

    /// Convenience wrapper around [`Self::update`] that moves an entry to
    /// `Completed` and emits `Accepted` instead of `Updated`.
    pub fn accept(&self, id: &str) -> Result<(Entry, KnowledgeEvent), KnowledgeError> {
        let (entry, _) = self.update(
            id,
            EntryPatch {
                status: Some(EntryStatus::Completed),
                ..Default::default()
            },
        )?;
        Ok((entry, KnowledgeEvent::Accepted(id.to_string())))
    }

    pub fn delete(&self, id: &str) -> Result<KnowledgeEvent, KnowledgeError> {
        let path = self.locate(id)?;
        fs::remove_file(path)?;
        Ok(KnowledgeEvent::Deleted(id.to_string()))
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Entry>, KnowledgeError> {
        let statuses = filter
            .statuses
            .clone()
            .unwrap_or_else(|| EntryStatus::ALL.to_vec());
        let mut entries = Vec::new();
        for status in statuses {
            let dir = self.root.join(status.dir_name());
            if !dir.exists() {
                continue;
            }
            for file in fs::read_dir(&dir)? {
                let file = file?;
                if file.path().extension().and_then(|e| e.to_str()) != Some("md") {
                    continue;
                }
                let entry = read_entry(&file.path())?;
                if filter.matches(&entry) {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    /// Append a `[[TYPE_N]]` cross-reference to `from`'s body.
    pub fn link(&self, from: &str, to: &str) -> Result<KnowledgeEvent, KnowledgeError> {
        let path = self.locate(from)?;
        let mut entry = read_entry(&path)?;
        if !entry.body.ends_with('\n') && !entry.body.is_empty() {
            entry.body.push('\n');
        }
        entry.body.push_str(&format!("[[{to}]]\n"));
        entry.frontmatter.updated_at = self.timestamp();
        self.write_entry(&entry)?;
        Ok(KnowledgeEvent::Linked {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    fn next_id(&self, entry_type: EntryType) -> String {
        let mut counters = self.counters.lock();
        let counter = counters.entry(entry_type).or_insert(0);
        *counter += 1;
        format!("{}_{}", entry_type.prefix(), counter)
    }

    fn timestamp(&self) -> String {
        let millis = self.clock.now_ms();
        chrono::DateTime::from_timestamp_millis(millis as i64)
            .unwrap_or_default()
            .to_rfc3339()
    }

    fn locate(&self, id: &str) -> Result<PathBuf, KnowledgeError> {
        for status in EntryStatus::ALL {
            let candidate = self.root.join(status.dir_name()).join(format!("{id}.md"));
            if candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(KnowledgeError::NotFound(id.to_string()))
    }

    fn write_entry(&self, entry: &Entry) -> Result<(), KnowledgeError> {
        let dir = self.root.join(entry.frontmatter.status.dir_name());
        fs::create_dir_all(&dir)?;
        let path = dir.join(entry.filename());
        let yaml = serde_yaml::to_string(&entry.frontmatter)?;
        let contents = format!("---\n{yaml}---\n\n{}", entry.body);
        fs::write(path, contents)?;
        Ok(())
    }
}

fn read_entry(path: &Path) -> Result<Entry, KnowledgeError> {
    let raw = fs::read_to_string(path)?;
    let rest = raw
        .strip_prefix("---\n")
        .ok_or_else(|| KnowledgeError::Malformed(format!("{}: missing frontmatter", path.display())))?;
    let end = rest
        .find("\n---\n")
        .ok_or_else(|| KnowledgeError::Malformed(format!("{}: unterminated frontmatter", path.display())))?;
    let yaml = &rest[..end];
    let body = rest[end + 5..].trim_start_matches('\n').to_string();
    let frontmatter: Frontmatter = serde_yaml::from_str(yaml)?;
    Ok(Entry { frontmatter, body })
}

fn recover_counters(root: &Path) -> Result<HashMap<EntryType, u64>, KnowledgeError> {
    let mut counters = HashMap::new();
    for status in EntryStatus::ALL {
        let dir = root.join(status.dir_name());
        if !dir.exists() {
            continue;
        }
        for file in fs::read_dir(&dir)? {
            let file = file?;
            let stem = file.path().file_stem().map(|s| s.to_string_lossy().into_owned());
            let Some(stem) = stem else { continue };
            let Some((prefix, n)) = stem.rsplit_once('_') else {
                continue;
            };
            let (Some(entry_type), Ok(n)) = (EntryType::from_prefix(prefix), n.parse::<u64>()) else {
                continue;
            };
            let counter = counters.entry(entry_type).or_insert(0);
            if n > *counter {
                *counter = n;
            }
        }
    }
    Ok(counters)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
