// Identity and backend ports shared by every feature module.
// The hosted backend (or the local SQLite one) implements these in infra/.

pub mod identity_models;
pub mod identity_ports;

pub use identity_models::*;
pub use identity_ports::*;
