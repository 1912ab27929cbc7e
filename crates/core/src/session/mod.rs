//! Session module
//!
//! Identity types, the session store, and snapshot persistence.

mod model;
mod snapshot;
mod store;

pub use model::{AuthPayload, Identity, UserProfile};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore, SESSION_KEY};
pub use store::SessionStore;
