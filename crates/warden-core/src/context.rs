//! Invocation context handed to restriction predicates.
//!
//! Platform adapters build one [`InvocationContext`] per inbound message. The
//! policy engine never inspects it; only predicates do.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, GuildId, Timestamp, UserId};

/// A guild (server) as seen at the time of the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub owner: UserId,
}

/// The guild-scoped view of the message author.
///
/// Only present for messages posted in a guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: UserId,
    pub guild: Guild,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Member {
    pub fn is_owner(&self) -> bool {
        self.guild.owner == self.user
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// An inbound chat message that triggered a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: UserId,
    pub channel: ChannelId,
    #[serde(default)]
    pub content: String,
    /// `None` for direct messages.
    #[serde(default)]
    pub member: Option<Member>,
}

impl Message {
    pub fn guild(&self) -> Option<&Guild> {
        self.member.as_ref().map(|m| &m.guild)
    }
}

/// Per-invocation data inspected by restriction predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    pub message: Message,
    #[serde(default = "Timestamp::now")]
    pub received_at: Timestamp,
}

impl InvocationContext {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            received_at: Timestamp::now(),
        }
    }

    /// A direct message from `author`; carries no guild membership.
    pub fn direct(
        author: impl Into<UserId>,
        channel: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(Message {
            author: author.into(),
            channel: channel.into(),
            content: content.into(),
            member: None,
        })
    }

    /// A message posted by `member` in one of its guild's channels.
    pub fn in_guild(
        member: Member,
        channel: impl Into<ChannelId>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(Message {
            author: member.user.clone(),
            channel: channel.into(),
            content: content.into(),
            member: Some(member),
        })
    }

    pub fn member(&self) -> Option<&Member> {
        self.message.member.as_ref()
    }

    pub fn guild(&self) -> Option<&Guild> {
        self.message.guild()
    }
}
