//! Evaluation of compiled policy trees.
//!
//! Children are evaluated in declared order and evaluation stops as soon as
//! the result is known. A restriction that errors, or an id missing from the
//! registry, counts as `false`.

use warden_core::RestrictionId;

use crate::registry::RestrictionRegistry;
use crate::types::PolicyNode;

/// A restriction that failed to reach a decision during evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionFailure {
    pub restriction: RestrictionId,
    pub reason: String,
}

/// Outcome of evaluating a tree, with any failures that were turned into
/// denials along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allowed: bool,
    pub failures: Vec<RestrictionFailure>,
}

/// Decide whether `context` satisfies `node`.
pub fn evaluate<C>(node: &PolicyNode, registry: &RestrictionRegistry<C>, context: &C) -> bool {
    evaluate_with_report(node, registry, context).allowed
}

/// Like [`evaluate`], also reporting restrictions that failed.
pub fn evaluate_with_report<C>(
    node: &PolicyNode,
    registry: &RestrictionRegistry<C>,
    context: &C,
) -> Verdict {
    let mut failures = Vec::new();
    let allowed = evaluate_node(node, registry, context, &mut failures);
    Verdict { allowed, failures }
}

fn evaluate_node<C>(
    node: &PolicyNode,
    registry: &RestrictionRegistry<C>,
    context: &C,
    failures: &mut Vec<RestrictionFailure>,
) -> bool {
    match node {
        PolicyNode::Leaf(id) => evaluate_leaf(id, registry, context, failures),
        PolicyNode::And(children) => children
            .iter()
            .all(|child| evaluate_node(child, registry, context, failures)),
        PolicyNode::Or(children) => children
            .iter()
            .any(|child| evaluate_node(child, registry, context, failures)),
    }
}

fn evaluate_leaf<C>(
    id: &RestrictionId,
    registry: &RestrictionRegistry<C>,
    context: &C,
    failures: &mut Vec<RestrictionFailure>,
) -> bool {
    let Some(restriction) = registry.get(id) else {
        tracing::warn!(restriction = %id, "restriction not registered, denying");
        failures.push(RestrictionFailure {
            restriction: id.clone(),
            reason: "restriction not registered".to_string(),
        });
        return false;
    };
    match restriction.allows(context) {
        Ok(allowed) => allowed,
        Err(e) => {
            tracing::warn!(restriction = %id, error = %e, "restriction failed, denying");
            failures.push(RestrictionFailure {
                restriction: id.clone(),
                reason: e.to_string(),
            });
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use warden_core::{Restriction, RestrictionError, RestrictionResult};

    /// Returns a fixed answer and counts how often it was asked.
    struct Fixed {
        answer: bool,
        calls: Arc<AtomicUsize>,
    }

    impl Restriction<()> for Fixed {
        fn allows(&self, _context: &()) -> RestrictionResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer)
        }
    }

    struct Failing;

    impl Restriction<()> for Failing {
        fn allows(&self, _context: &()) -> RestrictionResult<bool> {
            Err(RestrictionError::Unavailable("member lookup timed out".into()))
        }
    }

    fn registry() -> (RestrictionRegistry<()>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let yes_calls = Arc::new(AtomicUsize::new(0));
        let no_calls = Arc::new(AtomicUsize::new(0));
        let mut registry = RestrictionRegistry::new();
        registry
            .register(
                "yes",
                Fixed {
                    answer: true,
                    calls: yes_calls.clone(),
                },
            )
            .unwrap();
        registry
            .register(
                "no",
                Fixed {
                    answer: false,
                    calls: no_calls.clone(),
                },
            )
            .unwrap();
        registry.register("failing", Failing).unwrap();
        (registry, yes_calls, no_calls)
    }

    fn leaf(id: &str) -> PolicyNode {
        PolicyNode::leaf(id)
    }

    #[test]
    fn test_leaf() {
        let (registry, _, _) = registry();
        assert!(evaluate(&leaf("yes"), &registry, &()));
        assert!(!evaluate(&leaf("no"), &registry, &()));
    }

    #[test]
    fn test_and_all_true() {
        let (registry, _, _) = registry();
        let node = PolicyNode::And(vec![leaf("yes"), leaf("yes")]);
        assert!(evaluate(&node, &registry, &()));
    }

    #[test]
    fn test_and_short_circuits_on_false() {
        let (registry, yes_calls, no_calls) = registry();
        let node = PolicyNode::And(vec![leaf("no"), leaf("yes")]);
        assert!(!evaluate(&node, &registry, &()));
        assert_eq!(no_calls.load(Ordering::SeqCst), 1);
        assert_eq!(yes_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_and_true_then_false() {
        let (registry, yes_calls, no_calls) = registry();
        let node = PolicyNode::And(vec![leaf("yes"), leaf("no")]);
        assert!(!evaluate(&node, &registry, &()));
        assert_eq!(yes_calls.load(Ordering::SeqCst), 1);
        assert_eq!(no_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_or_false_then_true_evaluates_both() {
        let (registry, yes_calls, no_calls) = registry();
        let node = PolicyNode::Or(vec![leaf("no"), leaf("yes")]);
        assert!(evaluate(&node, &registry, &()));
        assert_eq!(no_calls.load(Ordering::SeqCst), 1);
        assert_eq!(yes_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_or_short_circuits_on_true() {
        let (registry, _, no_calls) = registry();
        let node = PolicyNode::Or(vec![leaf("yes"), leaf("no")]);
        assert!(evaluate(&node, &registry, &()));
        assert_eq!(no_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_or_all_false() {
        let (registry, _, _) = registry();
        let node = PolicyNode::Or(vec![leaf("no"), leaf("no")]);
        assert!(!evaluate(&node, &registry, &()));
    }

    #[test]
    fn test_empty_and_is_true_empty_or_is_false() {
        let (registry, _, _) = registry();
        assert!(evaluate(&PolicyNode::And(vec![]), &registry, &()));
        assert!(!evaluate(&PolicyNode::Or(vec![]), &registry, &()));
    }

    #[test]
    fn test_failing_restriction_denies_and_is_reported() {
        let (registry, _, _) = registry();
        let verdict = evaluate_with_report(&leaf("failing"), &registry, &());
        assert!(!verdict.allowed);
        assert_eq!(verdict.failures.len(), 1);
        assert_eq!(verdict.failures[0].restriction.as_str(), "failing");
        assert!(verdict.failures[0].reason.contains("timed out"));
    }

    #[test]
    fn test_failing_restriction_never_counts_as_true() {
        let (registry, _, _) = registry();
        let node = PolicyNode::Or(vec![leaf("failing"), leaf("no")]);
        assert!(!evaluate(&node, &registry, &()));

        let node = PolicyNode::Or(vec![leaf("failing"), leaf("yes")]);
        let verdict = evaluate_with_report(&node, &registry, &());
        assert!(verdict.allowed);
        assert_eq!(verdict.failures.len(), 1);
    }

    #[test]
    fn test_unregistered_restriction_denies() {
        let (registry, _, _) = registry();
        let verdict = evaluate_with_report(&leaf("ghost"), &registry, &());
        assert!(!verdict.allowed);
        assert_eq!(verdict.failures[0].restriction.as_str(), "ghost");
    }

    #[test]
    fn test_nested_tree() {
        let (registry, _, _) = registry();
        let node = PolicyNode::And(vec![
            leaf("yes"),
            PolicyNode::Or(vec![leaf("no"), PolicyNode::And(vec![leaf("yes"), leaf("yes")])]),
        ]);
        assert!(evaluate(&node, &registry, &()));
    }
}
