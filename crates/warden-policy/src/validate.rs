//! Registration-time validation of restriction declarations.
//!
//! A group with two or more members must name its combining policy, and a
//! group must not list the same restriction twice, including through a
//! nested group that collapses to that restriction. Nested groups are
//! checked depth-first in declaration order; the first fault wins.

use std::collections::HashSet;

use warden_core::{CommandName, RestrictionId};

use crate::error::{CombinationFault, InvalidCombinationError};
use crate::types::{GroupPath, RestrictionGroup};

/// Declarations of one command that passed [`validate`].
///
/// Only `validate` can produce this value, so the tree builder never sees
/// an ambiguous group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSet {
    command: CommandName,
    root: RestrictionGroup,
}

impl ValidatedSet {
    pub fn command(&self) -> &CommandName {
        &self.command
    }

    pub fn root(&self) -> &RestrictionGroup {
        &self.root
    }
}

/// Check a command's declarations for ambiguous combinations.
pub fn validate(
    command: &CommandName,
    declarations: &RestrictionGroup,
) -> Result<ValidatedSet, InvalidCombinationError> {
    validate_group(command, declarations, &GroupPath::root())?;
    tracing::debug!(command = %command, "restriction declarations validated");
    Ok(ValidatedSet {
        command: command.clone(),
        root: declarations.clone(),
    })
}

fn validate_group(
    command: &CommandName,
    group: &RestrictionGroup,
    path: &GroupPath,
) -> Result<(), InvalidCombinationError> {
    // Nested groups that collapse to one leaf count as that leaf here.
    let leaves = group
        .restrictions
        .iter()
        .chain(group.groups.iter().filter_map(collapsed_leaf));
    let mut seen = HashSet::with_capacity(group.restrictions.len());
    for restriction in leaves {
        if !seen.insert(restriction) {
            return Err(InvalidCombinationError {
                command: command.clone(),
                group: path.clone(),
                fault: CombinationFault::DuplicateRestriction {
                    restriction: restriction.clone(),
                },
            });
        }
    }

    let members = group.member_count();
    if members >= 2 && group.policy.is_none() {
        return Err(InvalidCombinationError {
            command: command.clone(),
            group: path.clone(),
            fault: CombinationFault::MissingPolicy {
                restrictions: group.restrictions.clone(),
                nested_groups: members - group.restrictions.len(),
            },
        });
    }
    if members < 2 {
        if let Some(policy) = group.policy {
            tracing::debug!(
                command = %command,
                group = %path,
                policy = %policy,
                "ignoring combining policy on group with fewer than two members"
            );
        }
    }

    for (index, nested) in group.groups.iter().enumerate() {
        validate_group(command, nested, &path.child(index))?;
    }
    Ok(())
}

/// The restriction a group compiles down to when its only member is a
/// single leaf, looking through nested single-member groups.
fn collapsed_leaf(group: &RestrictionGroup) -> Option<&RestrictionId> {
    if group.member_count() != 1 {
        return None;
    }
    match group.restrictions.first() {
        Some(restriction) => Some(restriction),
        None => group
            .groups
            .iter()
            .find(|nested| !nested.is_empty())
            .and_then(collapsed_leaf),
    }
}
