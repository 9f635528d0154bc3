use crate::context::InvocationContext;
use crate::error::RestrictionResult;

// ---------------------------------------------------------------------------
// Restriction: a single access check evaluated against one invocation
//
// Implementations are long-lived and shared across concurrent invocations.
// They hold no per-invocation state. A context outside the restriction's
// domain yields Ok(false), never an error.
// ---------------------------------------------------------------------------

pub trait Restriction<C = InvocationContext>: Send + Sync {
    fn allows(&self, context: &C) -> RestrictionResult<bool>;
}

impl<C, F> Restriction<C> for F
where
    F: Fn(&C) -> RestrictionResult<bool> + Send + Sync,
{
    fn allows(&self, context: &C) -> RestrictionResult<bool> {
        self(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestrictionError;

    // Verify the trait object is object-safe
    fn _assert_restriction_object_safe(_: &dyn Restriction) {}

    #[test]
    fn test_closure_restriction() {
        let only_alice = |ctx: &InvocationContext| {
            Ok::<_, RestrictionError>(ctx.message.author.as_str() == "alice")
        };
        let alice = InvocationContext::direct("alice", "dm", "");
        let bob = InvocationContext::direct("bob", "dm", "");
        assert_eq!(only_alice.allows(&alice), Ok(true));
        assert_eq!(only_alice.allows(&bob), Ok(false));
    }

    #[test]
    fn test_restriction_over_custom_context() {
        struct Even;
        impl Restriction<u32> for Even {
            fn allows(&self, context: &u32) -> RestrictionResult<bool> {
                Ok(context % 2 == 0)
            }
        }
        assert_eq!(Even.allows(&4), Ok(true));
        assert_eq!(Even.allows(&3), Ok(false));
    }
}
