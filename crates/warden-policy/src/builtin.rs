//! Built-in restriction predicates over [`InvocationContext`].
//!
//! Guild-scoped checks return `Ok(false)` for direct messages: without a
//! guild member there is nothing to check, and denial is the answer.

use warden_core::{ChannelId, InvocationContext, Restriction, RestrictionResult, UserId};

/// Allows every invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Everyone;

impl Restriction for Everyone {
    fn allows(&self, _context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(true)
    }
}

/// Allows no invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOne;

impl Restriction for NoOne {
    fn allows(&self, _context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(false)
    }
}

/// Allows the owner of the guild the message was posted in.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuildOwner;

impl Restriction for GuildOwner {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(context.member().map(|m| m.is_owner()).unwrap_or(false))
    }
}

/// Same check as [`GuildOwner`], registered under the older "server" naming.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerOwner;

impl Restriction for ServerOwner {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        GuildOwner.allows(context)
    }
}

/// Allows guild members holding a named permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasPermission(pub String);

impl Restriction for HasPermission {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(context
            .member()
            .map(|m| m.has_permission(&self.0))
            .unwrap_or(false))
    }
}

/// Allows guild members holding a named role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasRole(pub String);

impl Restriction for HasRole {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(context.member().map(|m| m.has_role(&self.0)).unwrap_or(false))
    }
}

/// Allows one specific user, in guilds and direct messages alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsUser(pub UserId);

impl Restriction for IsUser {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(context.message.author == self.0)
    }
}

/// Allows messages posted in one specific channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InChannel(pub ChannelId);

impl Restriction for InChannel {
    fn allows(&self, context: &InvocationContext) -> RestrictionResult<bool> {
        Ok(context.message.channel == self.0)
    }
}
