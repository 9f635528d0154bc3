use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use warden_core::{CommandName, InvocationContext, RestrictionId, Timestamp};

use crate::build::build;
use crate::error::{PolicyError, PolicyResult};
use crate::evaluate::evaluate_with_report;
use crate::registry::RestrictionRegistry;
use crate::types::{
    CommandDeclaration, CommandDefinition, RestrictionAuditEvent, RestrictionAuditEventKind,
};
use crate::validate::validate;

// ---------------------------------------------------------------------------
// AuditSink trait: restriction audit event emission
// ---------------------------------------------------------------------------

/// Trait for emitting restriction audit events.
pub trait AuditSink: Send + Sync {
    fn emit(&self, event: &RestrictionAuditEvent) -> Result<(), String>;
}

/// In-memory audit sink for testing.
#[derive(Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<RestrictionAuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<RestrictionAuditEvent> {
        self.events
            .lock()
            .expect("audit sink lock poisoned")
            .clone()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .expect("audit sink lock poisoned")
            .clear();
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: &RestrictionAuditEvent) -> Result<(), String> {
        self.events
            .lock()
            .map_err(|_| "audit sink lock poisoned".to_string())?
            .push(event.clone());
        Ok(())
    }
}

/// Audit sink that forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: &RestrictionAuditEvent) -> Result<(), String> {
        tracing::info!(
            target: "warden::audit",
            kind = ?event.event_kind,
            command = %event.command,
            restriction = ?event.restriction.as_ref().map(|r| r.as_str()),
            summary = ?event.summary,
            at = %event.timestamp.to_rfc3339(),
            "restriction audit event"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RestrictionEngine: per-command policy cache and evaluation entry point
// ---------------------------------------------------------------------------

/// Compiles command declarations once and answers invocation checks.
///
/// Registration takes `&mut self` and happens before the engine is shared;
/// checks take `&self` and may run concurrently.
pub struct RestrictionEngine<C = InvocationContext> {
    registry: Arc<RestrictionRegistry<C>>,
    commands: HashMap<CommandName, CommandDefinition>,
    audit_sink: Arc<dyn AuditSink>,
}

impl<C> RestrictionEngine<C> {
    pub fn new(registry: Arc<RestrictionRegistry<C>>, audit_sink: Arc<dyn AuditSink>) -> Self {
        Self {
            registry,
            commands: HashMap::new(),
            audit_sink,
        }
    }

    /// Validate, compile and cache the policy of one command.
    ///
    /// On error the command is not registered and cannot be checked.
    pub fn register(
        &mut self,
        declaration: CommandDeclaration,
    ) -> PolicyResult<&CommandDefinition> {
        let name = declaration.name.clone();
        match self.compile(&declaration) {
            Ok(definition) => {
                self.emit(
                    RestrictionAuditEventKind::CommandRegistered,
                    &name,
                    None,
                    Some(match &definition.policy {
                        Some(policy) => format!("policy {}", policy),
                        None => "unrestricted".to_string(),
                    }),
                )?;
                tracing::info!(
                    command = %name,
                    restricted = definition.is_restricted(),
                    "command registered"
                );
                Ok(&*self.commands.entry(name).or_insert(definition))
            }
            Err(e) => {
                tracing::error!(command = %name, error = %e, "command registration rejected");
                // The rejection reason outranks a failing sink.
                if let Err(sink_error) = self.emit(
                    RestrictionAuditEventKind::RegistrationRejected,
                    &name,
                    None,
                    Some(e.to_string()),
                ) {
                    tracing::error!(
                        command = %name,
                        error = %sink_error,
                        "failed to audit rejected registration"
                    );
                }
                Err(e)
            }
        }
    }

    fn compile(&self, declaration: &CommandDeclaration) -> PolicyResult<CommandDefinition> {
        if self.commands.contains_key(&declaration.name) {
            return Err(PolicyError::DuplicateCommand(declaration.name.clone()));
        }
        let validated = validate(&declaration.name, &declaration.declarations)?;
        let policy = build(&validated);
        if let Some(ref node) = policy {
            let unknown = node
                .leaves()
                .into_iter()
                .find(|id| !self.registry.contains(id));
            if let Some(unknown) = unknown {
                return Err(PolicyError::UnknownRestriction {
                    command: declaration.name.clone(),
                    restriction: unknown.clone(),
                });
            }
        }
        Ok(CommandDefinition {
            name: declaration.name.clone(),
            policy,
        })
    }

    /// Decide whether an invocation of `command` may run.
    ///
    /// Restrictions that fail count as denial and are audited.
    pub fn is_allowed(&self, command: &CommandName, context: &C) -> PolicyResult<bool> {
        let definition = self
            .commands
            .get(command)
            .ok_or_else(|| PolicyError::UnknownCommand(command.clone()))?;

        let Some(ref policy) = definition.policy else {
            return Ok(true);
        };

        let verdict = evaluate_with_report(policy, &self.registry, context);
        for failure in &verdict.failures {
            self.emit(
                RestrictionAuditEventKind::RestrictionFailed,
                command,
                Some(failure.restriction.clone()),
                Some(failure.reason.clone()),
            )?;
        }
        if !verdict.allowed {
            tracing::debug!(command = %command, "invocation denied by restrictions");
            self.emit(
                RestrictionAuditEventKind::InvocationDenied,
                command,
                None,
                Some(format!("denied by {}", policy)),
            )?;
        }
        Ok(verdict.allowed)
    }

    pub fn command(&self, name: &CommandName) -> Option<&CommandDefinition> {
        self.commands.get(name)
    }

    /// Registered commands sorted by name.
    pub fn commands(&self) -> Vec<&CommandDefinition> {
        let mut commands: Vec<_> = self.commands.values().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    pub fn registry(&self) -> &RestrictionRegistry<C> {
        &self.registry
    }

    fn emit(
        &self,
        event_kind: RestrictionAuditEventKind,
        command: &CommandName,
        restriction: Option<RestrictionId>,
        summary: Option<String>,
    ) -> PolicyResult<()> {
        let event = RestrictionAuditEvent {
            event_kind,
            timestamp: Timestamp::now(),
            command: command.clone(),
            restriction,
            summary,
        };
        self.audit_sink
            .emit(&event)
            .map_err(|e| PolicyError::AuditSinkError(format!("failed to emit audit event: {}", e)))
    }
}
