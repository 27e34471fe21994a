//! rendezvous-store — registration and discovery storage for a rendezvous point.
//!
//! Peers register under a namespace for a bounded time; others page through
//! live registrations with forgery-resistant cookies. SQLite is the backing
//! store, either in memory (":memory:") or in a file that survives restarts.

mod discovery;
mod error;
mod schema;
mod store;
mod sweeper;
mod table;

pub use discovery::DiscoverPage;
pub use error::StoreError;
pub use schema::is_memory;
pub use store::{RendezvousStore, StoreOptions};
