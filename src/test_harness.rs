use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Annotation to attach to a generated class, method, or parameter.
#[derive(Clone)]
pub(crate) struct AnnotationSpec {
    type_descriptor: String,
    elements: Vec<(String, ElementSpec)>,
}

impl AnnotationSpec {
    pub(crate) fn new(type_descriptor: &str, elements: Vec<(String, ElementSpec)>) -> Self {
        Self {
            type_descriptor: type_descriptor.to_string(),
            elements,
        }
    }

    /// Annotation with no elements, e.g. `@RestController`.
    pub(crate) fn marker(type_descriptor: &str) -> Self {
        Self::new(type_descriptor, Vec::new())
    }

    /// Single `value = {paths...}` element, the common mapping shape.
    pub(crate) fn with_paths(type_descriptor: &str, paths: &[&str]) -> Self {
        Self::new(
            type_descriptor,
            vec![(
                "value".to_string(),
                ElementSpec::Array(
                    paths
                        .iter()
                        .map(|path| ElementSpec::Str(path.to_string()))
                        .collect(),
                ),
            )],
        )
    }
}

/// Element-value forms the harness can encode.
#[derive(Clone)]
pub(crate) enum ElementSpec {
    Str(String),
    Bool(bool),
    Enum {
        type_descriptor: String,
        constant: String,
    },
    Array(Vec<ElementSpec>),
}

impl ElementSpec {
    /// `RequestMethod` enum constant, e.g. `verb_constant("POST")`.
    pub(crate) fn verb_constant(verb: &str) -> Self {
        ElementSpec::Enum {
            type_descriptor: "Lorg/springframework/web/bind/annotation/RequestMethod;".to_string(),
            constant: verb.to_string(),
        }
    }
}

/// Method to emit into a generated class.
pub(crate) struct MethodSpec {
    name: String,
    descriptor: String,
    annotations: Vec<AnnotationSpec>,
    parameter_annotations: Option<Vec<Vec<AnnotationSpec>>>,
    code: Option<Vec<u8>>,
}

impl MethodSpec {
    pub(crate) fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            annotations: Vec::new(),
            parameter_annotations: None,
            code: None,
        }
    }

    pub(crate) fn annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub(crate) fn parameter_annotations(mut self, table: Vec<Vec<AnnotationSpec>>) -> Self {
        self.parameter_annotations = Some(table);
        self
    }

    pub(crate) fn code(mut self, code: Vec<u8>) -> Self {
        self.code = Some(code);
        self
    }
}

/// Minimal class-file writer for test fixtures: identity, annotation
/// tables at class/method/parameter scope, and `Code` bodies.
pub(crate) struct ClassFileBuilder {
    cp: Vec<CpEntry>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    class_annotations: Vec<AnnotationSpec>,
    methods: Vec<MethodSpec>,
}

impl ClassFileBuilder {
    pub(crate) fn new(class_name: &str, super_name: &str) -> Self {
        let mut builder = Self {
            cp: Vec::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            class_annotations: Vec::new(),
            methods: Vec::new(),
        };
        builder.this_class = builder.add_class(class_name);
        builder.super_class = builder.add_class(super_name);
        builder
    }

    pub(crate) fn interface(mut self, name: &str) -> Self {
        let index = self.add_class(name);
        self.interfaces.push(index);
        self
    }

    pub(crate) fn class_annotation(mut self, annotation: AnnotationSpec) -> Self {
        self.class_annotations.push(annotation);
        self
    }

    pub(crate) fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    fn add_utf8(&mut self, value: &str) -> u16 {
        self.cp.push(CpEntry::Utf8(value.to_string()));
        self.cp.len() as u16
    }

    fn add_integer(&mut self, value: i32) -> u16 {
        self.cp.push(CpEntry::Integer(value));
        self.cp.len() as u16
    }

    fn add_class(&mut self, name: &str) -> u16 {
        let name_index = self.add_utf8(name);
        self.cp.push(CpEntry::Class(name_index));
        self.cp.len() as u16
    }

    /// Add a `MethodRef` and return its index, for hand-written bytecode.
    pub(crate) fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.add_class(class);
        let name_index = self.add_utf8(name);
        let descriptor_index = self.add_utf8(descriptor);
        self.cp
            .push(CpEntry::NameAndType(name_index, descriptor_index));
        let name_and_type = self.cp.len() as u16;
        self.cp.push(CpEntry::MethodRef(class_index, name_and_type));
        self.cp.len() as u16
    }

    fn encode_annotation(&mut self, spec: &AnnotationSpec) -> Vec<u8> {
        let mut bytes = Vec::new();
        let type_index = self.add_utf8(&spec.type_descriptor);
        write_u16(&mut bytes, type_index);
        write_u16(&mut bytes, spec.elements.len() as u16);
        let elements = spec.elements.clone();
        for (name, element) in &elements {
            let name_index = self.add_utf8(name);
            write_u16(&mut bytes, name_index);
            self.encode_element(&mut bytes, element);
        }
        bytes
    }

    fn encode_element(&mut self, bytes: &mut Vec<u8>, element: &ElementSpec) {
        match element {
            ElementSpec::Str(value) => {
                bytes.push(b's');
                let index = self.add_utf8(value);
                write_u16(bytes, index);
            }
            ElementSpec::Bool(value) => {
                bytes.push(b'Z');
                let index = self.add_integer(i32::from(*value));
                write_u16(bytes, index);
            }
            ElementSpec::Enum {
                type_descriptor,
                constant,
            } => {
                bytes.push(b'e');
                let type_index = self.add_utf8(type_descriptor);
                let constant_index = self.add_utf8(constant);
                write_u16(bytes, type_index);
                write_u16(bytes, constant_index);
            }
            ElementSpec::Array(values) => {
                bytes.push(b'[');
                write_u16(bytes, values.len() as u16);
                let values = values.clone();
                for value in &values {
                    self.encode_element(bytes, value);
                }
            }
        }
    }

    fn encode_annotation_list(&mut self, specs: &[AnnotationSpec]) -> Vec<u8> {
        let mut content = Vec::new();
        write_u16(&mut content, specs.len() as u16);
        let specs = specs.to_vec();
        for spec in &specs {
            let encoded = self.encode_annotation(spec);
            content.extend_from_slice(&encoded);
        }
        content
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        struct EncodedMethod {
            name_index: u16,
            descriptor_index: u16,
            attributes: Vec<(u16, Vec<u8>)>,
        }

        let class_annotations = std::mem::take(&mut self.class_annotations);
        let class_attribute = if class_annotations.is_empty() {
            None
        } else {
            let content = self.encode_annotation_list(&class_annotations);
            let name_index = self.add_utf8("RuntimeVisibleAnnotations");
            Some((name_index, content))
        };

        let methods = std::mem::take(&mut self.methods);
        let mut encoded_methods = Vec::with_capacity(methods.len());
        for method in methods {
            let name_index = self.add_utf8(&method.name);
            let descriptor_index = self.add_utf8(&method.descriptor);
            let mut attributes = Vec::new();
            if let Some(code) = &method.code {
                let mut content = Vec::new();
                write_u16(&mut content, 2);
                write_u16(&mut content, 2);
                write_u32(&mut content, code.len() as u32);
                content.extend_from_slice(code);
                write_u16(&mut content, 0);
                write_u16(&mut content, 0);
                let attribute_name = self.add_utf8("Code");
                attributes.push((attribute_name, content));
            }
            if !method.annotations.is_empty() {
                let content = self.encode_annotation_list(&method.annotations);
                let attribute_name = self.add_utf8("RuntimeVisibleAnnotations");
                attributes.push((attribute_name, content));
            }
            if let Some(table) = &method.parameter_annotations {
                let mut content = Vec::new();
                content.push(table.len() as u8);
                let table = table.clone();
                for parameter in &table {
                    let encoded = self.encode_annotation_list(parameter);
                    content.extend_from_slice(&encoded);
                }
                let attribute_name = self.add_utf8("RuntimeVisibleParameterAnnotations");
                attributes.push((attribute_name, content));
            }
            encoded_methods.push(EncodedMethod {
                name_index,
                descriptor_index,
                attributes,
            });
        }

        let mut bytes = Vec::new();
        write_u32(&mut bytes, 0xCAFE_BABE);
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, 52);
        write_u16(&mut bytes, (self.cp.len() + 1) as u16);
        for entry in &self.cp {
            entry.write(&mut bytes);
        }
        write_u16(&mut bytes, 0x0021);
        write_u16(&mut bytes, self.this_class);
        write_u16(&mut bytes, self.super_class);
        write_u16(&mut bytes, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            write_u16(&mut bytes, *interface);
        }
        write_u16(&mut bytes, 0);
        write_u16(&mut bytes, encoded_methods.len() as u16);
        for method in &encoded_methods {
            write_u16(&mut bytes, 0x0001);
            write_u16(&mut bytes, method.name_index);
            write_u16(&mut bytes, method.descriptor_index);
            write_u16(&mut bytes, method.attributes.len() as u16);
            for (name_index, content) in &method.attributes {
                write_u16(&mut bytes, *name_index);
                write_u32(&mut bytes, content.len() as u32);
                bytes.extend_from_slice(content);
            }
        }
        match class_attribute {
            Some((name_index, content)) => {
                write_u16(&mut bytes, 1);
                write_u16(&mut bytes, name_index);
                write_u32(&mut bytes, content.len() as u32);
                bytes.extend_from_slice(&content);
            }
            None => write_u16(&mut bytes, 0),
        }
        bytes
    }
}

/// Constant pool entries the harness can emit.
enum CpEntry {
    Utf8(String),
    Integer(i32),
    Class(u16),
    NameAndType(u16, u16),
    MethodRef(u16, u16),
}

impl CpEntry {
    fn write(&self, bytes: &mut Vec<u8>) {
        match self {
            CpEntry::Utf8(value) => {
                bytes.push(1);
                write_u16(bytes, value.len() as u16);
                bytes.extend_from_slice(value.as_bytes());
            }
            CpEntry::Integer(value) => {
                bytes.push(3);
                bytes.extend_from_slice(&value.to_be_bytes());
            }
            CpEntry::Class(name_index) => {
                bytes.push(7);
                write_u16(bytes, *name_index);
            }
            CpEntry::NameAndType(name_index, descriptor_index) => {
                bytes.push(12);
                write_u16(bytes, *name_index);
                write_u16(bytes, *descriptor_index);
            }
            CpEntry::MethodRef(class_index, name_and_type) => {
                bytes.push(10);
                write_u16(bytes, *class_index);
                write_u16(bytes, *name_and_type);
            }
        }
    }
}

fn write_u16(bytes: &mut Vec<u8>, value: u16) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

fn write_u32(bytes: &mut Vec<u8>, value: u32) {
    bytes.extend_from_slice(&value.to_be_bytes());
}

/// Build a zip archive in memory from `(entry name, bytes)` pairs.
pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        for (name, bytes) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start zip entry");
            writer.write_all(bytes).expect("write zip entry");
        }
        writer.finish().expect("finish zip");
    }
    cursor.into_inner()
}

/// Write a WAR built from `entries` into a fresh temp dir. The returned
/// guard must stay alive for the duration of the test.
pub(crate) fn write_temp_war(entries: &[(&str, &[u8])]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("app.war");
    std::fs::write(&path, build_zip(entries)).expect("write war");
    (dir, path)
}
