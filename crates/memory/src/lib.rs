//! Memory store implementations for Kaede.
//!
//! - `RemoteMemoryStore` — the session-oriented HTTP memory service
//! - `InMemoryStore` — ephemeral sessions, used in tests

pub mod in_memory;
pub mod remote;

pub use in_memory::InMemoryStore;
pub use remote::RemoteMemoryStore;
