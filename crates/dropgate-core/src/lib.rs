//! Dropgate Core Library
//!
//! This crate provides the domain model of the batch upload engine: the type
//! policy, the classifier, the per-user session store, configuration, and the
//! error taxonomy shared across all Dropgate components. It performs no I/O.

pub mod classify;
pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod session;

// Re-export commonly used types
pub use classify::{Classification, Classifier};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use models::{AuditEntry, Comment, InboundFile, PendingFile, UnsupportedFile, UploadOutcome};
pub use policy::{format_size_mb, CategoryKind, CategoryRule, TypePolicy};
pub use session::{Session, SessionStore, UserId};
