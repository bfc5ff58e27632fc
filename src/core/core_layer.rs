// The core module contains all business logic.
// Each feature gets its own submodule; ports live next to the service that uses them.

#[path = "identity/mod.rs"]
pub mod identity;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "profile/mod.rs"]
pub mod profile;

#[path = "avatar/mod.rs"]
pub mod avatar;

#[path = "board/mod.rs"]
pub mod board;

#[path = "auth/mod.rs"]
pub mod auth;
