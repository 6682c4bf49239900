// Palisade: tiered, cost-aware content moderation decision engine.
//
// This is the library root. Each module corresponds to one tier or concern
// of the moderation pipeline.

pub mod classify;
pub mod config;
pub mod context;
pub mod council;
pub mod moderator;
pub mod normalize;
pub mod output;
pub mod provider;
pub mod script;
pub mod types;
