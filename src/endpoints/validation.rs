use std::collections::BTreeSet;

use crate::classfile::MethodView;

/// Bean-Validation constraint annotations recognized at parameter scope.
const BEAN_VALIDATION: [&str; 23] = [
    "Valid",
    "Validated",
    "NotNull",
    "NotEmpty",
    "NotBlank",
    "Size",
    "Min",
    "Max",
    "Pattern",
    "Email",
    "Positive",
    "Negative",
    "PositiveOrZero",
    "NegativeOrZero",
    "DecimalMin",
    "DecimalMax",
    "Digits",
    "Future",
    "Past",
    "FutureOrPresent",
    "PastOrPresent",
    "AssertTrue",
    "AssertFalse",
];

/// Annotations that bind the request body and so enable body validation.
const BODY_BINDING: [&str; 3] = ["RequestBody", "ModelAttribute", "RequestPart"];

/// Annotations that bind individual request values.
const VALUE_BINDING: [&str; 4] = ["PathVariable", "RequestParam", "RequestHeader", "CookieValue"];

/// Call-target name fragments that suggest service-layer validation.
const CALL_HINTS: [&str; 7] = [
    "validate",
    "check",
    "verify",
    "assert",
    "validator",
    "constraintviolation",
    "validationfactory",
];

const CUSTOM_TOKENS: [&str; 3] = ["validation", "constraint", "validator"];

/// Collect the validation descriptors for one handler method, from method
/// annotations, parameter annotations, and one-hop call targets.
/// Deduplicated and sorted lexicographically.
pub(crate) fn collect(method: &MethodView) -> Vec<String> {
    let mut descriptors = BTreeSet::new();

    for annotation in &method.annotations {
        match annotation.simple_name() {
            "Valid" | "Validated" => {
                descriptors.insert(format!(
                    "@{} on handler enables method-level validation",
                    annotation.simple_name()
                ));
            }
            simple if !BEAN_VALIDATION.contains(&simple) => {
                let qualified = annotation.qualified_name().to_lowercase();
                if CUSTOM_TOKENS.iter().any(|token| qualified.contains(token)) {
                    descriptors.insert(format!("custom validation annotation @{simple}"));
                }
            }
            _ => {}
        }
    }

    for (position, annotations) in method.parameter_annotations.iter().enumerate() {
        for annotation in annotations {
            let simple = annotation.simple_name();
            if BEAN_VALIDATION.contains(&simple) {
                descriptors.insert(format!("@{simple} on parameter 'param{position}'"));
            }
            if BODY_BINDING.contains(&simple) {
                descriptors.insert(format!(
                    "@{simple} on parameter 'param{position}' enables request-body validation"
                ));
            }
            if VALUE_BINDING.contains(&simple) {
                descriptors.insert(format!(
                    "@{simple} on parameter 'param{position}' binds a request value with potential validation"
                ));
            }
        }
    }

    for call in &method.calls {
        let name = call.name.to_lowercase();
        if CALL_HINTS.iter().any(|hint| name.contains(hint)) {
            descriptors.insert(format!(
                "service-layer validation via {}.{}",
                call.owner.replace('/', "."),
                call.name
            ));
        }
    }

    descriptors.into_iter().collect()
}
