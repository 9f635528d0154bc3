use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::{CommandName, RestrictionId, Timestamp};

// ---------------------------------------------------------------------------
// CombiningPolicy: how sibling restrictions merge into one decision
// ---------------------------------------------------------------------------

/// Boolean operator applied to the members of one restriction group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombiningPolicy {
    /// Every member must allow the invocation.
    #[serde(alias = "all_of")]
    And,
    /// At least one member must allow the invocation.
    #[serde(alias = "any_of")]
    Or,
}

impl fmt::Display for CombiningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombiningPolicy::And => write!(f, "and"),
            CombiningPolicy::Or => write!(f, "or"),
        }
    }
}

// ---------------------------------------------------------------------------
// RestrictionGroup: declaration set as authored in configuration
// ---------------------------------------------------------------------------

/// The restriction declarations of one command, or of a nested group
/// within it.
///
/// Declaration order is the restrictions in order, followed by the nested
/// groups in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestrictionGroup {
    #[serde(default)]
    pub restrictions: Vec<RestrictionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<CombiningPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RestrictionGroup>,
}

impl RestrictionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group holding exactly one restriction.
    pub fn single(restriction: impl Into<RestrictionId>) -> Self {
        Self::new().restriction(restriction)
    }

    pub fn restriction(mut self, restriction: impl Into<RestrictionId>) -> Self {
        self.restrictions.push(restriction.into());
        self
    }

    pub fn group(mut self, group: RestrictionGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_policy(mut self, policy: CombiningPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// True when neither this group nor any descendant declares a restriction.
    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty() && self.groups.iter().all(RestrictionGroup::is_empty)
    }

    /// Restrictions plus non-empty nested groups.
    pub fn member_count(&self) -> usize {
        self.restrictions.len() + self.groups.iter().filter(|g| !g.is_empty()).count()
    }
}

// ---------------------------------------------------------------------------
// GroupPath: location of a group inside a command's declarations
// ---------------------------------------------------------------------------

/// Position of a group: `root`, `root.0`, `root.1.0`, ...
///
/// Indices count nested groups in declaration order within their parent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupPath(Vec<usize>);

impl GroupPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for index in &self.0 {
            write!(f, ".{}", index)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PolicyNode: compiled, immutable boolean expression
// ---------------------------------------------------------------------------

/// Compiled restriction policy of a command.
///
/// Leaves hold restriction ids; the live predicates are looked up in the
/// registry when the tree is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyNode {
    Leaf(RestrictionId),
    And(Vec<PolicyNode>),
    Or(Vec<PolicyNode>),
}

impl PolicyNode {
    pub fn leaf(restriction: impl Into<RestrictionId>) -> Self {
        PolicyNode::Leaf(restriction.into())
    }

    /// All restriction ids in the tree, depth-first in declaration order.
    pub fn leaves(&self) -> Vec<&RestrictionId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a RestrictionId>) {
        match self {
            PolicyNode::Leaf(id) => out.push(id),
            PolicyNode::And(children) | PolicyNode::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for PolicyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, children) = match self {
            PolicyNode::Leaf(id) => return write!(f, "{}", id),
            PolicyNode::And(children) => ("and", children),
            PolicyNode::Or(children) => ("or", children),
        };
        write!(f, "{}(", op)?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A command as submitted for registration.
///
/// Serialized with the root group's fields beside `name`. Unknown keys are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CommandFields", into = "CommandFields")]
pub struct CommandDeclaration {
    pub name: CommandName,
    pub declarations: RestrictionGroup,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandFields {
    name: CommandName,
    #[serde(default)]
    restrictions: Vec<RestrictionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    policy: Option<CombiningPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    groups: Vec<RestrictionGroup>,
}

impl From<CommandFields> for CommandDeclaration {
    fn from(fields: CommandFields) -> Self {
        Self {
            name: fields.name,
            declarations: RestrictionGroup {
                restrictions: fields.restrictions,
                policy: fields.policy,
                groups: fields.groups,
            },
        }
    }
}

impl From<CommandDeclaration> for CommandFields {
    fn from(declaration: CommandDeclaration) -> Self {
        let RestrictionGroup {
            restrictions,
            policy,
            groups,
        } = declaration.declarations;
        Self {
            name: declaration.name,
            restrictions,
            policy,
            groups,
        }
    }
}

impl CommandDeclaration {
    pub fn new(name: impl Into<CommandName>, declarations: RestrictionGroup) -> Self {
        Self {
            name: name.into(),
            declarations,
        }
    }

    pub fn unrestricted(name: impl Into<CommandName>) -> Self {
        Self::new(name, RestrictionGroup::new())
    }
}

/// A registered command with its compiled policy.
///
/// `policy == None` means the command is unrestricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDefinition {
    pub name: CommandName,
    pub policy: Option<PolicyNode>,
}

impl CommandDefinition {
    pub fn is_restricted(&self) -> bool {
        self.policy.is_some()
    }
}

// ---------------------------------------------------------------------------
// Audit types
// ---------------------------------------------------------------------------

/// Types of auditable events emitted by the restriction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestrictionAuditEventKind {
    CommandRegistered,
    RegistrationRejected,
    InvocationDenied,
    RestrictionFailed,
}

/// A structured audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestrictionAuditEvent {
    pub event_kind: RestrictionAuditEventKind,
    pub timestamp: Timestamp,
    pub command: CommandName,
    pub restriction: Option<RestrictionId>,
    pub summary: Option<String>,
}
