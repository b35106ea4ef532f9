use super::{Signal, SignalContext, SignalMetadata};

/// Fires when any emitted verb is POST, PUT, DELETE or PATCH.
#[derive(Default)]
pub(crate) struct VerbSignal;

crate::register_signal!(VerbSignal);

impl Signal for VerbSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "VERB",
            weight: 0.30,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        context.verbs.iter().any(|verb| verb.is_mutating())
    }
}
