// Core moderation module - the pattern filter for user text and the report gate.
// Following the same pattern as the other feature modules: models, logic, port.

pub mod moderation_filter;
pub mod moderation_models;
pub mod moderation_rules;
pub mod moderation_service;

pub use moderation_filter::*;
pub use moderation_models::*;
pub use moderation_service::*;
