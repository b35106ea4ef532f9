use super::{Signal, SignalContext, SignalMetadata};

const SERVICE_OPERATION_NAMES: [&str; 7] = [
    "process", "handle", "execute", "perform", "apply", "commit", "submit",
];

/// Domain verbs that change business state even without a CRUD name.
const BUSINESS_OPERATION_TOKENS: [&str; 26] = [
    "approve",
    "reject",
    "cancel",
    "activate",
    "deactivate",
    "enable",
    "disable",
    "publish",
    "unpublish",
    "archive",
    "restore",
    "validate",
    "confirm",
    "complete",
    "finalize",
    "authorize",
    "authenticate",
    "register",
    "enroll",
    "subscribe",
    "unsubscribe",
    "transfer",
    "import",
    "export",
    "sync",
    "migrate",
];

/// Fires on calls into service types whose method name is an operation
/// or business-state verb.
#[derive(Default)]
pub(crate) struct ServiceCallSignal;

crate::register_signal!(ServiceCallSignal);

impl Signal for ServiceCallSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "SERVICE_CALL",
            weight: 0.10,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        context.method.calls.iter().any(|call| {
            if !call.owner.to_lowercase().contains("service") {
                return false;
            }
            let name = call.name.to_lowercase();
            SERVICE_OPERATION_NAMES
                .iter()
                .chain(BUSINESS_OPERATION_TOKENS.iter())
                .any(|token| name.contains(token))
        })
    }
}
