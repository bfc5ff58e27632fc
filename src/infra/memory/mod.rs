// In-memory collaborators for local runs and tests.

pub mod in_memory_objects;
pub mod static_identity;

pub use in_memory_objects::InMemoryObjectStore;
pub use static_identity::StaticIdentity;
