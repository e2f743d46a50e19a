// Roadmap persistence and progress tracking.
// Documents are parsed once into typed topic values; progress is keyed by
// hashed leaf paths and merged server-side under a per-roadmap lock.

pub mod document;
pub mod handlers;
pub mod projector;
pub mod store;
