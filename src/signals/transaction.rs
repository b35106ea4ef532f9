use crate::classfile::{AnnotationUse, ClassView, MethodView};
use crate::endpoints::markers;

use super::{Signal, SignalContext, SignalMetadata};

/// `(is_transactional, read_only)` flags for a handler. A method-level
/// transactional annotation wins; otherwise a class-level one applies to
/// every handler the class declares.
pub(crate) fn transaction_flags(class: &ClassView, method: &MethodView) -> (bool, bool) {
    let (is_transactional, read_only) = flags_from(&method.annotations);
    if is_transactional {
        return (is_transactional, read_only);
    }
    flags_from(&class.annotations)
}

fn flags_from(annotations: &[AnnotationUse]) -> (bool, bool) {
    let mut is_transactional = false;
    let mut read_only = false;
    for annotation in annotations {
        if !markers::is_transactional(annotation) {
            continue;
        }
        is_transactional = true;
        if annotation
            .element("readOnly")
            .and_then(|value| value.expect_bool().ok())
            == Some(true)
        {
            read_only = true;
        }
    }
    (is_transactional, read_only)
}

/// Fires on a transactional annotation whose `readOnly` attribute is not
/// literally `true`.
#[derive(Default)]
pub(crate) struct TransactionSignal;

crate::register_signal!(TransactionSignal);

impl Signal for TransactionSignal {
    fn metadata(&self) -> SignalMetadata {
        SignalMetadata {
            id: "TRANSACTION",
            weight: 0.25,
        }
    }

    fn fires(&self, context: &SignalContext<'_>) -> bool {
        let (is_transactional, read_only) = transaction_flags(context.class, context.method);
        is_transactional && !read_only
    }
}
