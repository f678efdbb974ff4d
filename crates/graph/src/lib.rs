//! Graph store for the topology editor.
//!
//! The store is the single owner of editor nodes and links and of the id
//! allocator that names them. There is no process-wide id state: every
//! allocation goes through a [`GraphStore`] value.
//!
//! All operations are synchronous. Exactly one mutation of allocator or store
//! state may be in flight at a time; a multi-threaded host must serialize
//! access (e.g. behind a single `Mutex<GraphStore>`).

mod allocator;
mod error;
mod store;

pub use allocator::IdAllocator;
pub use error::GraphError;
pub use store::GraphStore;
