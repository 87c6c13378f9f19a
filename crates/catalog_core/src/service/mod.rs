//! Content lifecycle services.
//!
//! # Responsibility
//! - Orchestrate content store calls into deletion, retirement and import
//!   use cases.
//! - Keep CLI layers decoupled from storage details.

pub mod cascade_service;
pub mod classifier;
pub mod diagnostics;
pub mod import_service;
pub mod retirement_service;
