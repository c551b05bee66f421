//! supervisor-registry: the two in-memory stores the rest of the
//! workspace is built around — processes (C1) and gateway sessions (C6).
//! Both guard their state with `parking_lot`, never hold a lock across an
//! `.await`, and hand out defensive copies on read.

pub mod process_registry;
pub mod session_registry;

pub use process_registry::{
    ListFilter, Page, ProcessPatch, ProcessRegistry, RegistryError, RegistryStats, SortField,
    SortOrder, MAX_PAGE_LIMIT,
};
pub use session_registry::{
    SessionFilter, SessionInfo, SessionRegistry, SessionRegistryError, SessionState,
    SubscriptionAction, Subscriptions,
};
