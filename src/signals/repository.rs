use super::{Signal, SignalContext, SignalMetadata};

const MUTATING_REPOSITORY_NAMES: [&str; 8] = [
    "save", "update", "delete", "remove", "create", "insert", "modify", "edit",
];

/// Spring Data derived-query prefixes that imply mutation.
const DERIVED_QUERY_PREFIXES: [&str; 5] =
    ["deleteallby", "removeby", "deleteby", "updateby", "saveby"];

/// Fires on calls into repository or DAO types whose method name looks
/// mutating, including derived-query names.
#[derive(Default)]
pub(crate) struct RepositoryCallSignal;

crate::register_signal!(RepositoryCallSignal);

impl Signal for RepositoryCallSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "REPOSITORY_CALL",
            weight: 0.15,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        context.method.calls.iter().any(|call| {
            let owner = call.owner.to_lowercase();
            if !owner.contains("repository") && !owner.contains("dao") {
                return false;
            }
            let name = call.name.to_lowercase();
            MUTATING_REPOSITORY_NAMES
                .iter()
                .any(|token| name.contains(token))
                || DERIVED_QUERY_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(prefix))
        })
    }
}
