//! C1: the authoritative in-memory store of process records.

use indexmap::IndexMap;
use parking_lot::RwLock;
use supervisor_core::{LogEntry, LogKind, ProcessId, ProcessRecord, Status};
use thiserror::Error;

/// Sort field for [`ProcessRegistry::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    StartTime,
    Name,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Offset/limit pagination; `limit` is always clamped to
/// [`MAX_PAGE_LIMIT`] regardless of what the caller asks for.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

pub const MAX_PAGE_LIMIT: usize = 1000;

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: MAX_PAGE_LIMIT,
        }
    }
}

/// Filter applied before sorting/pagination in [`ProcessRegistry::list`]
/// and [`ProcessRegistry::count`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<Status>,
    pub name_contains: Option<String>,
}

impl ListFilter {
    fn matches(&self, record: &ProcessRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.name_contains {
            let haystack = record.name.as_deref().unwrap_or("");
            if !haystack.contains(needle.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Non-overlapping fields a caller may update on a record. `id`, `command`,
/// and the state-machine invariants are never touched here — callers go
/// through `Status::validate_transition` before supplying a new `status`.
#[derive(Debug, Clone, Default)]
pub struct ProcessPatch {
    pub status: Option<Status>,
    pub end_time: Option<u64>,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<String>,
}

#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("process {0} already exists")]
    AlreadyExists(ProcessId),
    #[error("process {0} not found")]
    NotFound(ProcessId),
}

#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub total: usize,
    pub starting: usize,
    pub running: usize,
    pub stopping: usize,
    pub stopped: usize,
    pub failed: usize,
    pub average_runtime_ms: Option<f64>,
}

/// Holds every known [`ProcessRecord`], keyed by id. An [`IndexMap`] keeps
/// insertion order so ties in [`ProcessRegistry::list`] sort stably.
#[derive(Default)]
pub struct ProcessRegistry {
    records: RwLock<IndexMap<ProcessId, ProcessRecord>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, record: ProcessRecord) -> Result<(), RegistryError> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(RegistryError::AlreadyExists(record.id));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Defensive copy: callers can't mutate stored state through the
    /// returned value.
    pub fn get(&self, id: &ProcessId) -> Option<ProcessRecord> {
        self.records.read().get(id).cloned()
    }

    /// Apply an arbitrary mutation under the write lock, returning whatever
    /// the closure computes. The primitive every other mutating method is
    /// built on.
    pub fn mutate<T>(
        &self,
        id: &ProcessId,
        f: impl FnOnce(&mut ProcessRecord) -> T,
    ) -> Result<T, RegistryError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;
        Ok(f(record))
    }

    /// Merge non-empty patch fields into the record, returning the updated
    /// snapshot.
    pub fn update(&self, id: &ProcessId, patch: ProcessPatch) -> Result<ProcessRecord, RegistryError> {
        self.mutate(id, |record| {
            if let Some(status) = patch.status {
                record.status = status;
            }
            if let Some(end_time) = patch.end_time {
                record.end_time = Some(end_time);
            }
            if let Some(pid) = patch.pid {
                record.pid = Some(pid);
            }
            if let Some(exit_code) = patch.exit_code {
                record.exit_code = Some(exit_code);
            }
            if let Some(exit_signal) = patch.exit_signal {
                record.exit_signal = Some(exit_signal);
            }
            record.clone()
        })
    }

    pub fn push_log(
        &self,
        id: &ProcessId,
        kind: LogKind,
        content: String,
        now_ms: u64,
    ) -> Result<LogEntry, RegistryError> {
        self.mutate(id, |record| record.push_log(kind, content, now_ms))
    }

    pub fn remove(&self, id: &ProcessId) -> Option<ProcessRecord> {
        self.records.write().shift_remove(id)
    }

    pub fn count(&self, filter: &ListFilter) -> usize {
        self.records
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .count()
    }

    /// Filter, sort, then paginate. `page.limit` is always clamped to
    /// [`MAX_PAGE_LIMIT`]. Returns the page along with the total match
    /// count (pre-pagination).
    pub fn list(&self, filter: &ListFilter, sort: (SortField, SortOrder), page: Page) -> (Vec<ProcessRecord>, usize) {
        let records = self.records.read();
        let mut matched: Vec<&ProcessRecord> = records.values().filter(|r| filter.matches(r)).collect();

        let (field, order) = sort;
        matched.sort_by(|a, b| {
            let ordering = match field {
                SortField::StartTime => a.start_time.cmp(&b.start_time),
                SortField::Name => a.name.as_deref().unwrap_or("").cmp(b.name.as_deref().unwrap_or("")),
                SortField::Status => format!("{}", a.status).cmp(&format!("{}", b.status)),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len();
        let limit = page.limit.min(MAX_PAGE_LIMIT);
        let page_records = matched
            .into_iter()
            .skip(page.offset)
            .take(limit)
            .cloned()
            .collect();
        (page_records, total)
    }

    pub fn stats(&self) -> RegistryStats {
        let records = self.records.read();
        let mut stats = RegistryStats {
            total: records.len(),
            ..Default::default()
        };
        let mut runtime_sum = 0u64;
        let mut runtime_count = 0u64;
        for record in records.values() {
            match record.status {
                Status::Starting => stats.starting += 1,
                Status::Running => stats.running += 1,
                Status::Stopping => stats.stopping += 1,
                Status::Stopped => stats.stopped += 1,
                Status::Failed => stats.failed += 1,
            }
            if let Some(runtime) = record.runtime_ms() {
                runtime_sum += runtime;
                runtime_count += 1;
            }
        }
        stats.average_runtime_ms = if runtime_count > 0 {
            Some(runtime_sum as f64 / runtime_count as f64)
        } else {
            None
        };
        stats
    }
}

#[cfg(test)]
#[path = "process_registry_tests.rs"]
mod tests;
