use crate::types::{CombiningPolicy, PolicyNode, RestrictionGroup};
use crate::validate::ValidatedSet;

/// Compile validated declarations into a policy tree.
///
/// Returns `None` when no restriction is declared anywhere, meaning the
/// command is unrestricted. A group with a single member collapses into
/// that member; empty nested groups are dropped.
pub fn build(validated: &ValidatedSet) -> Option<PolicyNode> {
    let node = build_group(validated.root());
    tracing::debug!(
        command = %validated.command(),
        policy = %node.as_ref().map(|n| n.to_string()).unwrap_or_else(|| "unrestricted".into()),
        "compiled restriction policy"
    );
    node
}

fn build_group(group: &RestrictionGroup) -> Option<PolicyNode> {
    let mut children: Vec<PolicyNode> = group
        .restrictions
        .iter()
        .cloned()
        .map(PolicyNode::Leaf)
        .collect();
    children.extend(group.groups.iter().filter_map(build_group));

    match children.len() {
        0 => None,
        1 => children.pop(),
        // Validation guarantees a policy on any group with two or more members.
        _ => Some(match group.policy {
            Some(CombiningPolicy::Or) => PolicyNode::Or(children),
            Some(CombiningPolicy::And) | None => PolicyNode::And(children),
        }),
    }
}
