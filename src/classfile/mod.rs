mod annotations;
mod bytecode;
mod constant_pool;
mod descriptor;
mod reader;

use thiserror::Error;
use tracing::warn;

pub(crate) use annotations::{AnnotationUse, AnnotationValue, PrimitiveValue};
pub(crate) use descriptor::{MethodSignature, parse_method_descriptor};

use annotations::{parse_annotation_list, parse_parameter_annotation_table};
use constant_pool::ConstantPool;
use reader::ByteReader;

/// Newest class-file major version this decoder has been written against
/// (Java 25). Newer files are decoded anyway, with a warning.
const KNOWN_MAJOR_VERSION: u16 = 69;

/// Failures decoding one class file. These never abort an analysis run;
/// the offending entry is skipped.
#[derive(Debug, Error)]
pub(crate) enum DecodeError {
    #[error("truncated class file")]
    TruncatedClassFile,
    #[error("not a class file (magic 0x{0:08x})")]
    BadMagic(u32),
    #[error("bad constant pool: {0}")]
    BadConstantPool(String),
    #[error("malformed annotation table: {0}")]
    MalformedAnnotation(String),
    #[error("invalid method descriptor {0:?}")]
    BadDescriptor(String),
    #[error("malformed method body: {0}")]
    MalformedMethodBody(String),
}

/// Decoded view of one class: identity, annotation tables, and methods.
/// Immutable once decoded.
#[derive(Clone, Debug)]
pub(crate) struct ClassView {
    /// Internal (slash-separated) fully-qualified name.
    pub(crate) name: String,
    #[allow(dead_code)]
    pub(crate) super_name: Option<String>,
    #[allow(dead_code)]
    pub(crate) interfaces: Vec<String>,
    pub(crate) annotations: Vec<AnnotationUse>,
    pub(crate) methods: Vec<MethodView>,
}

impl ClassView {
    /// Dotted fully-qualified name for reporting.
    pub(crate) fn dotted_name(&self) -> String {
        self.name.replace('/', ".")
    }
}

/// Decoded view of one method, in class-file declaration order.
#[derive(Clone, Debug)]
pub(crate) struct MethodView {
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) signature: MethodSignature,
    pub(crate) annotations: Vec<AnnotationUse>,
    /// Indexed by parameter position; never longer than the descriptor's
    /// parameter list.
    pub(crate) parameter_annotations: Vec<Vec<AnnotationUse>>,
    pub(crate) calls: Vec<CallSite>,
}

/// Target of one method-invocation instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CallSite {
    /// Internal (slash-separated) owner class name.
    pub(crate) owner: String,
    pub(crate) name: String,
    #[allow(dead_code)]
    pub(crate) descriptor: String,
}

impl CallSite {
    /// Lowercased `owner.name` form used by the call-target lexicons.
    pub(crate) fn qualified_lower(&self) -> String {
        format!("{}.{}", self.owner.replace('/', "."), self.name).to_lowercase()
    }
}

pub(crate) fn decode(bytes: &[u8]) -> Result<ClassView, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let magic = reader.read_u32()?;
    if magic != 0xCAFE_BABE {
        return Err(DecodeError::BadMagic(magic));
    }
    let _minor_version = reader.read_u16()?;
    let major_version = reader.read_u16()?;
    if major_version > KNOWN_MAJOR_VERSION {
        warn!(major_version, "class file is newer than this decoder; attempting anyway");
    }

    let pool = ConstantPool::parse(&mut reader)?;

    let _access_flags = reader.read_u16()?;
    let this_class = reader.read_u16()?;
    let name = pool.get_class_name(this_class)?.to_string();
    let super_index = reader.read_u16()?;
    let super_name = if super_index == 0 {
        None
    } else {
        Some(pool.get_class_name(super_index)?.to_string())
    };

    let interface_count = reader.read_u16()? as usize;
    let mut interfaces = Vec::with_capacity(interface_count);
    for _ in 0..interface_count {
        let index = reader.read_u16()?;
        interfaces.push(pool.get_class_name(index)?.to_string());
    }

    // Fields carry nothing the endpoint inference needs.
    let field_count = reader.read_u16()? as usize;
    for _ in 0..field_count {
        reader.skip(6)?;
        skip_attributes(&mut reader)?;
    }

    let method_count = reader.read_u16()? as usize;
    let mut methods = Vec::with_capacity(method_count);
    for _ in 0..method_count {
        methods.push(parse_method(&mut reader, &pool, &name)?);
    }

    let annotations = parse_class_annotations(&mut reader, &pool, &name)?;

    Ok(ClassView {
        name,
        super_name,
        interfaces,
        annotations,
        methods,
    })
}

fn parse_method(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    class_name: &str,
) -> Result<MethodView, DecodeError> {
    let _access_flags = reader.read_u16()?;
    let name = pool.get_utf8(reader.read_u16()?)?.to_string();
    let descriptor = pool.get_utf8(reader.read_u16()?)?.to_string();
    let signature = parse_method_descriptor(&descriptor)?;

    let mut annotations = Vec::new();
    let mut parameter_annotations: Vec<Vec<AnnotationUse>> = Vec::new();
    let mut calls = Vec::new();

    let attribute_count = reader.read_u16()? as usize;
    for _ in 0..attribute_count {
        let attribute_name = pool.get_utf8(reader.read_u16()?)?.to_string();
        let length = reader.read_u32()? as usize;
        let content = reader.read_bytes(length)?;
        let mut attribute = ByteReader::new(content);
        match attribute_name.as_str() {
            "Code" => {
                let _max_stack = attribute.read_u16()?;
                let _max_locals = attribute.read_u16()?;
                let code_length = attribute.read_u32()? as usize;
                let code = attribute.read_bytes(code_length)?;
                calls = bytecode::collect_call_sites(code, pool)?;
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                match parse_annotation_list(&mut attribute, pool) {
                    Ok(parsed) => annotations.extend(parsed),
                    Err(err) => warn!(
                        class = class_name,
                        method = name.as_str(),
                        %err,
                        "skipping unreadable method annotation attribute"
                    ),
                }
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                match parse_parameter_annotation_table(&mut attribute, pool) {
                    Ok(table) => merge_parameter_annotations(&mut parameter_annotations, table),
                    Err(err) => warn!(
                        class = class_name,
                        method = name.as_str(),
                        %err,
                        "skipping unreadable parameter annotation attribute"
                    ),
                }
            }
            _ => {}
        }
    }

    if parameter_annotations.len() > signature.parameters.len() {
        warn!(
            class = class_name,
            method = name.as_str(),
            "parameter annotation table longer than descriptor; truncating"
        );
        parameter_annotations.truncate(signature.parameters.len());
    }

    Ok(MethodView {
        name,
        descriptor,
        signature,
        annotations,
        parameter_annotations,
        calls,
    })
}

/// Class-level attribute walk: collects annotation tables, skips the rest.
fn parse_class_annotations(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
    class_name: &str,
) -> Result<Vec<AnnotationUse>, DecodeError> {
    let mut annotations = Vec::new();
    let attribute_count = reader.read_u16()? as usize;
    for _ in 0..attribute_count {
        let attribute_name = pool.get_utf8(reader.read_u16()?)?.to_string();
        let length = reader.read_u32()? as usize;
        let content = reader.read_bytes(length)?;
        if matches!(
            attribute_name.as_str(),
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations"
        ) {
            let mut attribute = ByteReader::new(content);
            match parse_annotation_list(&mut attribute, pool) {
                Ok(parsed) => annotations.extend(parsed),
                Err(err) => warn!(
                    class = class_name,
                    %err,
                    "skipping unreadable class annotation attribute"
                ),
            }
        }
    }
    Ok(annotations)
}

fn skip_attributes(reader: &mut ByteReader<'_>) -> Result<(), DecodeError> {
    let attribute_count = reader.read_u16()? as usize;
    for _ in 0..attribute_count {
        reader.skip(2)?;
        let length = reader.read_u32()? as usize;
        reader.skip(length)?;
    }
    Ok(())
}

fn merge_parameter_annotations(
    merged: &mut Vec<Vec<AnnotationUse>>,
    table: Vec<Vec<AnnotationUse>>,
) {
    if merged.len() < table.len() {
        merged.resize_with(table.len(), Vec::new);
    }
    for (position, annotations) in table.into_iter().enumerate() {
        merged[position].extend(annotations);
    }
}
