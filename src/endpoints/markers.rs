use crate::classfile::{AnnotationUse, ClassView};

/// Class-level annotations that mark a handler-bearing class.
const CONTROLLER_MARKERS: [&str; 4] = [
    "org/springframework/stereotype/Controller",
    "org/springframework/web/bind/annotation/RestController",
    "org/springframework/web/bind/annotation/ControllerAdvice",
    "org/springframework/web/bind/annotation/RestControllerAdvice",
];

const TRANSACTIONAL_MARKERS: [&str; 3] = [
    "org/springframework/transaction/annotation/Transactional",
    "javax/transaction/Transactional",
    "jakarta/transaction/Transactional",
];

/// The recognized mapping annotation family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MappingKind {
    Request,
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

pub(crate) fn is_controller(class: &ClassView) -> bool {
    class
        .annotations
        .iter()
        .any(|annotation| CONTROLLER_MARKERS.contains(&annotation.internal_name()))
}

pub(crate) fn mapping_kind(annotation: &AnnotationUse) -> Option<MappingKind> {
    let kind = match annotation.internal_name() {
        "org/springframework/web/bind/annotation/RequestMapping" => MappingKind::Request,
        "org/springframework/web/bind/annotation/GetMapping" => MappingKind::Get,
        "org/springframework/web/bind/annotation/PostMapping" => MappingKind::Post,
        "org/springframework/web/bind/annotation/PutMapping" => MappingKind::Put,
        "org/springframework/web/bind/annotation/DeleteMapping" => MappingKind::Delete,
        "org/springframework/web/bind/annotation/PatchMapping" => MappingKind::Patch,
        _ => return None,
    };
    Some(kind)
}

pub(crate) fn is_transactional(annotation: &AnnotationUse) -> bool {
    TRANSACTIONAL_MARKERS.contains(&annotation.internal_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::decode;
    use crate::test_harness::{AnnotationSpec, ClassFileBuilder};

    fn class_with_marker(descriptor: &str) -> ClassView {
        let bytes = ClassFileBuilder::new("com/ex/A", "java/lang/Object")
            .class_annotation(AnnotationSpec::marker(descriptor))
            .finish();
        decode(&bytes).expect("decode class")
    }

    #[test]
    fn recognizes_all_controller_markers() {
        for marker in [
            "Lorg/springframework/stereotype/Controller;",
            "Lorg/springframework/web/bind/annotation/RestController;",
            "Lorg/springframework/web/bind/annotation/ControllerAdvice;",
            "Lorg/springframework/web/bind/annotation/RestControllerAdvice;",
        ] {
            assert!(is_controller(&class_with_marker(marker)), "{marker}");
        }
    }

    #[test]
    fn plain_components_are_not_controllers() {
        let component = class_with_marker("Lorg/springframework/stereotype/Component;");

        assert!(!is_controller(&component));
    }

    #[test]
    fn maps_verb_specific_annotations_to_their_kind() {
        let view = class_with_marker("Lorg/springframework/web/bind/annotation/RestController;");
        let annotation = &view.annotations[0];
        assert_eq!(mapping_kind(annotation), None);

        let cases = [
            ("Lorg/springframework/web/bind/annotation/RequestMapping;", MappingKind::Request),
            ("Lorg/springframework/web/bind/annotation/GetMapping;", MappingKind::Get),
            ("Lorg/springframework/web/bind/annotation/PostMapping;", MappingKind::Post),
            ("Lorg/springframework/web/bind/annotation/PutMapping;", MappingKind::Put),
            ("Lorg/springframework/web/bind/annotation/DeleteMapping;", MappingKind::Delete),
            ("Lorg/springframework/web/bind/annotation/PatchMapping;", MappingKind::Patch),
        ];
        for (descriptor, expected) in cases {
            let view = class_with_marker(descriptor);
            assert_eq!(mapping_kind(&view.annotations[0]), Some(expected));
        }
    }

    #[test]
    fn transactional_is_recognized_across_namespaces() {
        for descriptor in [
            "Lorg/springframework/transaction/annotation/Transactional;",
            "Ljavax/transaction/Transactional;",
            "Ljakarta/transaction/Transactional;",
        ] {
            let view = class_with_marker(descriptor);
            assert!(is_transactional(&view.annotations[0]), "{descriptor}");
        }
    }
}
