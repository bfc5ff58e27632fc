// The infra module contains implementations of core traits.
// Each backend gets its own submodule.

#[path = "supabase/mod.rs"]
pub mod supabase;

#[path = "sqlite/mod.rs"]
pub mod sqlite;

#[path = "memory/mod.rs"]
pub mod memory;
