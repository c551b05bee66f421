//! supervisor-knowledge: markdown-file-backed CRUD over questions,
//! answers, notes, issues, and milestones. Invoked only by gateway request
//! handlers — never by the lifecycle controller, registry, or bus.

pub mod entry;
pub mod store;

pub use entry::{Entry, EntryPatch, EntryStatus, EntryType, Frontmatter, NewEntry};
pub use store::{KnowledgeError, KnowledgeEvent, KnowledgeStore, ListFilter};
