//! Durable session monitoring state for volspike.
//!
//! Persists the mapping session id -> monitoring enabled as one JSON
//! document, rewritten whole on every toggle and read once at startup so
//! monitoring resumes after a restart.

pub mod error;
pub mod registry;
pub mod store;

pub use error::{PersistenceError, PersistenceResult};
pub use registry::SessionRegistry;
pub use store::{SessionStore, DEFAULT_STATUS_FILE};
