use super::{Signal, SignalContext, SignalMetadata};

/// Fragments of `owner.name` call targets that reach the persistence
/// layer, JPA entity-manager verbs included.
const PERSISTENCE_TOKENS: [&str; 16] = [
    "save",
    "saveall",
    "saveandflush",
    "delete",
    "deleteall",
    "deletebyid",
    "persist",
    "merge",
    "remove",
    "update",
    "flush",
    "clear",
    "refresh",
    "createquery",
    "createnativequery",
    "createnamedquery",
];

/// Fires when any call target's lowercased `owner.name` contains a
/// persistence token.
#[derive(Default)]
pub(crate) struct PersistenceCallSignal;

crate::register_signal!(PersistenceCallSignal);

impl Signal for PersistenceCallSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "PERSISTENCE_CALL",
            weight: 0.20,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        context.method.calls.iter().any(|call| {
            let qualified = call.qualified_lower();
            PERSISTENCE_TOKENS
                .iter()
                .any(|token| qualified.contains(token))
        })
    }
}
