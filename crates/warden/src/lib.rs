//! Warden Root Library
//!
//! Startup wiring for the restriction engine: loads configuration, builds
//! the restriction registry from the built-ins plus configured restrictions,
//! and registers every configured command before any invocation is checked.

pub mod config;
pub mod error;

pub use config::{
    InvalidCommandAction, LoggingConfig, RegistrationConfig, RestrictionDefinition,
    RestrictionKind, WardenConfig,
};
pub use error::{RootError, RootResult};

use std::sync::Arc;
use tracing::{error, info};
use warden_core::{CommandName, InvocationContext, Restriction};
use warden_policy::builtin::{HasPermission, HasRole, InChannel, IsUser};
use warden_policy::{
    AuditSink, PolicyError, RestrictionEngine, RestrictionRegistry, TracingAuditSink,
};

impl RestrictionKind {
    /// Construct the predicate described by this configuration entry.
    pub fn instantiate(&self) -> Arc<dyn Restriction> {
        match self {
            RestrictionKind::Permission { permission } => {
                Arc::new(HasPermission(permission.clone()))
            }
            RestrictionKind::Role { role } => Arc::new(HasRole(role.clone())),
            RestrictionKind::User { user } => Arc::new(IsUser(user.clone())),
            RestrictionKind::Channel { channel } => Arc::new(InChannel(channel.clone())),
        }
    }
}

/// A command left unregistered because its declarations were rejected.
#[derive(Debug)]
pub struct RejectedCommand {
    pub name: CommandName,
    pub error: PolicyError,
}

/// Runtime state: the configuration and the engine holding every
/// successfully registered command.
pub struct WardenState {
    pub config: WardenConfig,
    pub engine: RestrictionEngine,
    pub rejected: Vec<RejectedCommand>,
}

impl WardenState {
    /// Decide whether an invocation of `command` may run.
    pub fn check(&self, command: &str, context: &InvocationContext) -> RootResult<bool> {
        Ok(self.engine.is_allowed(&CommandName::new(command), context)?)
    }
}

/// Build the registry: built-ins plus the configured restrictions.
pub fn build_registry(definitions: &[RestrictionDefinition]) -> RootResult<RestrictionRegistry> {
    let mut registry = RestrictionRegistry::with_builtins();
    for definition in definitions {
        registry.register_shared(definition.id.clone(), definition.kind.instantiate())?;
    }
    Ok(registry)
}

/// Initialize warden with audit events forwarded to `tracing`.
pub fn initialize(config: WardenConfig) -> RootResult<WardenState> {
    initialize_with_sink(config, Arc::new(TracingAuditSink))
}

/// Initialize warden, registering every configured command.
///
/// With `on_invalid = "abort"` the first rejected command fails startup.
/// With `"skip"` rejected commands are logged, recorded in
/// [`WardenState::rejected`] and left undispatchable.
pub fn initialize_with_sink(
    config: WardenConfig,
    audit_sink: Arc<dyn AuditSink>,
) -> RootResult<WardenState> {
    config.validate()?;

    let registry = build_registry(&config.restrictions)?;
    info!(
        restrictions = registry.len(),
        commands = config.commands.len(),
        on_invalid = ?config.registration.on_invalid,
        "initializing warden"
    );

    let mut engine = RestrictionEngine::new(Arc::new(registry), audit_sink);
    let mut rejected = Vec::new();
    for declaration in &config.commands {
        let name = declaration.name.clone();
        if let Err(e) = engine.register(declaration.clone()) {
            match config.registration.on_invalid {
                InvalidCommandAction::Abort => return Err(e.into()),
                InvalidCommandAction::Skip => {
                    error!(
                        command = %name,
                        error = %e,
                        "skipping command with rejected restrictions"
                    );
                    rejected.push(RejectedCommand { name, error: e });
                }
            }
        }
    }

    info!(
        registered = engine.commands().len(),
        rejected = rejected.len(),
        "warden initialized"
    );

    Ok(WardenState {
        config,
        engine,
        rejected,
    })
}
