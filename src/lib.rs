//! Renames photos after AI-generated descriptions of their content.
//!
//! [`orchestrator::Orchestrator`] tracks a collection of photos, sends each
//! one to a [`describer::Describer`] and renames files on disk without ever
//! overwriting an existing one.

pub mod collection;
pub mod config;
pub mod credentials;
pub mod describer;
pub mod detector;
pub mod error;
pub mod mover;
pub mod notifier;
pub mod orchestrator;
pub mod photo;
pub mod sanitizer;
