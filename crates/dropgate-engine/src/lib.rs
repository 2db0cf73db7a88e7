//! Dropgate Engine Library
//!
//! Ties the core domain to the remote store gateway: destination resolution,
//! the sequential upload orchestrator with in-place progress reporting, the
//! audit recorder, and the intake engine driven by chat events. The chat
//! transport itself stays behind the [`transport::ChatTransport`] boundary.

pub mod audit;
pub mod clock;
pub mod intake;
pub mod orchestrator;
pub mod progress;
pub mod resolver;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types
pub use audit::AuditRecorder;
pub use intake::IntakeEngine;
pub use orchestrator::{ProgressSink, UploadOrchestrator};
pub use progress::ProgressRenderer;
pub use resolver::{DestinationResolver, ResolvedDestination};
pub use transport::{ChatTransport, InboundItem, MessageRef, TransportError};
