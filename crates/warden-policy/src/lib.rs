//! Warden Policy Engine
//!
//! Turns the restriction declarations attached to chat commands into
//! immutable boolean policy trees, and evaluates those trees against
//! incoming invocations.
//!
//! Key features:
//! - Registration-time validation: two or more sibling restrictions need an
//!   explicit AND/OR policy, and a group may not repeat a restriction
//! - One compiled tree per command, shared read-only across invocations
//! - Short-circuit evaluation in declaration order
//! - Fail-closed semantics (a failing or unknown restriction denies, never errors out)
//! - Registry of shared restriction instances, with guild/server owner built-ins
//! - Audit events for registrations, rejections, denials and restriction failures

pub mod build;
pub mod builtin;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod registry;
pub mod types;
pub mod validate;

// Re-export primary types for convenience
pub use build::build;
pub use engine::{AuditSink, InMemoryAuditSink, RestrictionEngine, TracingAuditSink};
pub use error::{CombinationFault, InvalidCombinationError, PolicyError, PolicyResult};
pub use evaluate::{evaluate, evaluate_with_report, RestrictionFailure, Verdict};
pub use registry::{RestrictionRegistry, BUILTIN_RESTRICTIONS};
pub use types::{
    CombiningPolicy, CommandDeclaration, CommandDefinition, GroupPath, PolicyNode,
    RestrictionAuditEvent, RestrictionAuditEventKind, RestrictionGroup,
};
pub use validate::{validate, ValidatedSet};
