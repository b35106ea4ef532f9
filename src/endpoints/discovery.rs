use crate::classfile::{AnnotationUse, ClassView, MethodView};

use super::markers::{self, MappingKind};

/// A handler method together with every mapping annotation it declares,
/// in declaration order.
pub(crate) struct HandlerMethod<'a> {
    pub(crate) method: &'a MethodView,
    pub(crate) mappings: Vec<(&'a AnnotationUse, MappingKind)>,
}

pub(crate) fn is_handler_class(class: &ClassView) -> bool {
    markers::is_controller(class)
}

/// Methods of a controller class that carry at least one mapping
/// annotation, in class-file enumeration order.
pub(crate) fn handler_methods(class: &ClassView) -> Vec<HandlerMethod<'_>> {
    class
        .methods
        .iter()
        .filter_map(|method| {
            let mappings: Vec<(&AnnotationUse, MappingKind)> = method
                .annotations
                .iter()
                .filter_map(|annotation| {
                    markers::mapping_kind(annotation).map(|kind| (annotation, kind))
                })
                .collect();
            if mappings.is_empty() {
                None
            } else {
                Some(HandlerMethod { method, mappings })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::decode;
    use crate::test_harness::{AnnotationSpec, ClassFileBuilder, MethodSpec};

    #[test]
    fn only_mapped_methods_are_handlers() {
        let bytes = ClassFileBuilder::new("com/ex/UserController", "java/lang/Object")
            .class_annotation(AnnotationSpec::marker(
                "Lorg/springframework/web/bind/annotation/RestController;",
            ))
            .method(MethodSpec::new("list", "()Ljava/util/List;").annotation(
                AnnotationSpec::marker("Lorg/springframework/web/bind/annotation/GetMapping;"),
            ))
            .method(MethodSpec::new("helper", "()V"))
            .finish();
        let view = decode(&bytes).expect("decode class");

        assert!(is_handler_class(&view));
        let handlers = handler_methods(&view);
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].method.name, "list");
        assert_eq!(handlers[0].mappings[0].1, MappingKind::Get);
    }

    #[test]
    fn unannotated_classes_are_dropped() {
        let bytes = ClassFileBuilder::new("com/ex/PlainService", "java/lang/Object")
            .method(MethodSpec::new("list", "()Ljava/util/List;").annotation(
                AnnotationSpec::marker("Lorg/springframework/web/bind/annotation/GetMapping;"),
            ))
            .finish();
        let view = decode(&bytes).expect("decode class");

        assert!(!is_handler_class(&view));
    }

    #[test]
    fn methods_keep_every_mapping_annotation() {
        let bytes = ClassFileBuilder::new("com/ex/UserController", "java/lang/Object")
            .class_annotation(AnnotationSpec::marker(
                "Lorg/springframework/web/bind/annotation/RestController;",
            ))
            .method(
                MethodSpec::new("dual", "()V")
                    .annotation(AnnotationSpec::with_paths(
                        "Lorg/springframework/web/bind/annotation/GetMapping;",
                        &["/a"],
                    ))
                    .annotation(AnnotationSpec::with_paths(
                        "Lorg/springframework/web/bind/annotation/PostMapping;",
                        &["/b"],
                    )),
            )
            .finish();
        let view = decode(&bytes).expect("decode class");

        let handlers = handler_methods(&view);
        assert_eq!(handlers[0].mappings.len(), 2);
    }
}
