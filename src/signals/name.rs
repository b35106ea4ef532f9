use super::{Signal, SignalContext, SignalMetadata};

/// Method-name tokens that suggest mutation. Broad on purpose (`set`,
/// `post`); the confidence weight is the tuning surface.
const MUTATING_NAME_TOKENS: [&str; 22] = [
    "create", "save", "update", "modify", "edit", "delete", "remove", "insert", "add", "set",
    "put", "post", "patch", "persist", "merge", "store", "write", "commit", "submit", "process",
    "execute", "apply",
];

/// Fires when the lowercased handler name contains a mutating token.
#[derive(Default)]
pub(crate) struct NameSignal;

crate::register_signal!(NameSignal);

impl Signal for NameSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "NAME",
            weight: 0.20,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        let name = context.method.name.to_lowercase();
        MUTATING_NAME_TOKENS.iter().any(|token| name.contains(token))
    }
}
