pub mod profile_cache;
pub mod profile_models;
pub mod profile_service;
pub mod profile_store;

pub use profile_cache::ProfileCache;
pub use profile_models::{Profile, ProfileUpdate};
pub use profile_service::{ProfileError, ProfileService};
pub use profile_store::ProfileStore;
