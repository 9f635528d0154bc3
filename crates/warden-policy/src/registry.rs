use std::collections::HashMap;
use std::sync::Arc;

use warden_core::{InvocationContext, Restriction, RestrictionId};

use crate::builtin::{Everyone, GuildOwner, NoOne, ServerOwner};
use crate::error::{PolicyError, PolicyResult};

/// Restriction ids registered by [`RestrictionRegistry::with_builtins`].
pub const BUILTIN_RESTRICTIONS: &[&str] = &["everyone", "guild-owner", "no-one", "server-owner"];

/// Process-wide mapping from restriction id to a shared predicate instance.
///
/// Populated once at startup, then shared read-only behind an `Arc`.
pub struct RestrictionRegistry<C = InvocationContext> {
    restrictions: HashMap<RestrictionId, Arc<dyn Restriction<C>>>,
}

impl<C> Default for RestrictionRegistry<C> {
    fn default() -> Self {
        Self {
            restrictions: HashMap::new(),
        }
    }
}

impl<C> RestrictionRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<RestrictionId>,
        restriction: impl Restriction<C> + 'static,
    ) -> PolicyResult<()> {
        self.register_shared(id, Arc::new(restriction))
    }

    pub fn register_shared(
        &mut self,
        id: impl Into<RestrictionId>,
        restriction: Arc<dyn Restriction<C>>,
    ) -> PolicyResult<()> {
        let id = id.into();
        if self.restrictions.contains_key(&id) {
            return Err(PolicyError::DuplicateRestriction(id));
        }
        tracing::debug!(restriction = %id, "restriction registered");
        self.restrictions.insert(id, restriction);
        Ok(())
    }

    pub fn get(&self, id: &RestrictionId) -> Option<&Arc<dyn Restriction<C>>> {
        self.restrictions.get(id)
    }

    pub fn contains(&self, id: &RestrictionId) -> bool {
        self.restrictions.contains_key(id)
    }

    /// Registered ids in lexical order.
    pub fn ids(&self) -> Vec<&RestrictionId> {
        let mut ids: Vec<_> = self.restrictions.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.restrictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty()
    }
}

impl RestrictionRegistry<InvocationContext> {
    /// A registry holding the built-in restrictions.
    pub fn with_builtins() -> Self {
        let mut restrictions: HashMap<RestrictionId, Arc<dyn Restriction>> = HashMap::new();
        restrictions.insert("everyone".into(), Arc::new(Everyone));
        restrictions.insert("guild-owner".into(), Arc::new(GuildOwner));
        restrictions.insert("no-one".into(), Arc::new(NoOne));
        restrictions.insert("server-owner".into(), Arc::new(ServerOwner));
        Self { restrictions }
    }
}
