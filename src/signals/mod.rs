use crate::classfile::{ClassView, MethodView};
use crate::endpoints::mapping::HttpVerb;

pub(crate) mod name;
pub(crate) mod persistence;
pub(crate) mod repository;
pub(crate) mod service;
pub(crate) mod transaction;
pub(crate) mod verb;

/// Inputs shared by mutation signals.
pub(crate) struct SignalContext<'a> {
    /// Class declaring the handler; class-level annotations apply to it.
    pub(crate) class: &'a ClassView,
    pub(crate) method: &'a MethodView,
    /// Verb set of the endpoint under classification.
    pub(crate) verbs: &'a [HttpVerb],
}

/// Metadata describing a mutation signal.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SignalMetadata {
    pub(crate) id: &'static str,
    /// Contribution to the confidence score when the signal fires.
    pub(crate) weight: f64,
}

/// One orthogonal state-mutation heuristic.
pub(crate) trait Signal {
    fn metadata(&self) -> SignalMetadata;
    fn fires(&self, context: &SignalContext<'_>) -> bool;
}

/// Wrapper struct for signal factory functions to enable inventory
/// collection.
pub(crate) struct SignalFactory(pub fn() -> Box<dyn Signal + Sync>);

inventory::collect!(SignalFactory);

/// Macro to register a signal implementation.
///
/// Usage: `register_signal!(SignalName);`
#[macro_export]
macro_rules! register_signal {
    ($signal_type:ty) => {
        inventory::submit! {
            $crate::signals::SignalFactory(|| Box::new(<$signal_type>::default()))
        }
    };
}

fn all_signals() -> Vec<Box<dyn Signal + Sync>> {
    inventory::iter::<SignalFactory>
        .into_iter()
        .map(|factory| (factory.0)())
        .collect()
}

/// Outcome of classifying one endpoint.
#[derive(Clone, Debug)]
pub(crate) struct MutationVerdict {
    pub(crate) alters_state: bool,
    /// Weighted sum of fired signals, capped at 1.0. Independent of the
    /// boolean verdict.
    pub(crate) confidence: f64,
    pub(crate) fired: Vec<&'static str>,
}

/// Evaluates the registered signals; their disjunction is `alters_state`.
pub(crate) struct MutationClassifier {
    signals: Vec<Box<dyn Signal + Sync>>,
}

impl MutationClassifier {
    pub(crate) fn new() -> Self {
        let mut signals = all_signals();
        signals.sort_by(|left, right| left.metadata().id.cmp(right.metadata().id));
        Self { signals }
    }

    pub(crate) fn classify(&self, context: &SignalContext<'_>) -> MutationVerdict {
        let mut fired = Vec::new();
        let mut confidence = 0.0;
        for signal in &self.signals {
            let metadata = signal.metadata();
            if signal.fires(context) {
                fired.push(metadata.id);
                confidence += metadata.weight;
            }
        }
        MutationVerdict {
            alters_state: !fired.is_empty(),
            confidence: confidence.min(1.0),
            fired,
        }
    }
}
