// Doppelganger board client core.
//
// - `core/` = business logic and the ports it talks through
// - `infra/` = implementations of those ports (hosted backend, SQLite, memory)
// - `config` = environment configuration for the binary

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;
