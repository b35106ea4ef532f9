use thiserror::Error;

use super::DecodeError;
use super::constant_pool::{ConstantPool, CpInfo};
use super::reader::ByteReader;

/// One annotation occurrence with its decoded element values.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnnotationUse {
    /// Type descriptor as written in the class file, e.g.
    /// `Lorg/springframework/web/bind/annotation/GetMapping;`.
    pub(crate) type_descriptor: String,
    pub(crate) elements: Vec<(String, AnnotationValue)>,
}

impl AnnotationUse {
    pub(crate) fn parse(
        reader: &mut ByteReader<'_>,
        pool: &ConstantPool,
    ) -> Result<Self, DecodeError> {
        let type_index = reader.read_u16()?;
        let type_descriptor = pool
            .get_utf8(type_index)
            .map_err(|err| DecodeError::MalformedAnnotation(err.to_string()))?
            .to_string();
        let pair_count = reader.read_u16()? as usize;
        let mut elements = Vec::with_capacity(pair_count);
        for _ in 0..pair_count {
            let name_index = reader.read_u16()?;
            let name = pool
                .get_utf8(name_index)
                .map_err(|err| DecodeError::MalformedAnnotation(err.to_string()))?
                .to_string();
            let value = AnnotationValue::parse(reader, pool)?;
            elements.push((name, value));
        }
        Ok(Self {
            type_descriptor,
            elements,
        })
    }

    /// Internal (slash-separated) annotation type name.
    pub(crate) fn internal_name(&self) -> &str {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .unwrap_or(&self.type_descriptor)
    }

    /// Dotted fully-qualified annotation type name.
    pub(crate) fn qualified_name(&self) -> String {
        self.internal_name().replace('/', ".")
    }

    /// Last segment of the annotation type name.
    pub(crate) fn simple_name(&self) -> &str {
        let internal = self.internal_name();
        internal.rsplit('/').next().unwrap_or(internal)
    }

    /// Source-style rendering, `@GetMapping`.
    pub(crate) fn display_form(&self) -> String {
        format!("@{}", self.simple_name())
    }

    pub(crate) fn element(&self, name: &str) -> Option<&AnnotationValue> {
        self.elements
            .iter()
            .find(|(element_name, _)| element_name == name)
            .map(|(_, value)| value)
    }
}

/// Decoded annotation element value. Five shapes, matching the
/// element-value forms of the class-file format.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AnnotationValue {
    Primitive(PrimitiveValue),
    EnumConstant {
        type_descriptor: String,
        constant: String,
    },
    ClassRef(String),
    Nested(Box<AnnotationUse>),
    Sequence(Vec<AnnotationValue>),
}

#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PrimitiveValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Float(f64),
}

/// An extraction helper was applied to a value of a different shape.
#[derive(Debug, Error)]
#[error("expected {expected} annotation value, found {found}")]
pub(crate) struct ShapeMismatch {
    pub(crate) expected: &'static str,
    pub(crate) found: &'static str,
}

impl AnnotationValue {
    fn parse(reader: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<Self, DecodeError> {
        let tag = reader.read_u8()? as char;
        let malformed =
            |err: DecodeError| DecodeError::MalformedAnnotation(err.to_string());
        let value = match tag {
            'B' | 'C' | 'I' | 'S' => {
                let index = reader.read_u16()?;
                let value = pool.get_integer(index).map_err(malformed)?;
                AnnotationValue::Primitive(PrimitiveValue::Int(value as i64))
            }
            'Z' => {
                let index = reader.read_u16()?;
                let value = pool.get_integer(index).map_err(malformed)?;
                AnnotationValue::Primitive(PrimitiveValue::Bool(value != 0))
            }
            'J' => {
                let index = reader.read_u16()?;
                let value = match pool.get(index).map_err(malformed)? {
                    CpInfo::Long(value) => *value,
                    other => {
                        return Err(DecodeError::MalformedAnnotation(format!(
                            "expected Long at index {index}, found {}",
                            other.kind()
                        )));
                    }
                };
                AnnotationValue::Primitive(PrimitiveValue::Int(value))
            }
            'F' => {
                let index = reader.read_u16()?;
                let value = match pool.get(index).map_err(malformed)? {
                    CpInfo::Float(value) => f64::from(*value),
                    other => {
                        return Err(DecodeError::MalformedAnnotation(format!(
                            "expected Float at index {index}, found {}",
                            other.kind()
                        )));
                    }
                };
                AnnotationValue::Primitive(PrimitiveValue::Float(value))
            }
            'D' => {
                let index = reader.read_u16()?;
                let value = match pool.get(index).map_err(malformed)? {
                    CpInfo::Double(value) => *value,
                    other => {
                        return Err(DecodeError::MalformedAnnotation(format!(
                            "expected Double at index {index}, found {}",
                            other.kind()
                        )));
                    }
                };
                AnnotationValue::Primitive(PrimitiveValue::Float(value))
            }
            's' => {
                let index = reader.read_u16()?;
                let value = pool.get_utf8(index).map_err(malformed)?.to_string();
                AnnotationValue::Primitive(PrimitiveValue::Str(value))
            }
            'e' => {
                let type_index = reader.read_u16()?;
                let constant_index = reader.read_u16()?;
                AnnotationValue::EnumConstant {
                    type_descriptor: pool.get_utf8(type_index).map_err(malformed)?.to_string(),
                    constant: pool
                        .get_utf8(constant_index)
                        .map_err(malformed)?
                        .to_string(),
                }
            }
            'c' => {
                let index = reader.read_u16()?;
                AnnotationValue::ClassRef(pool.get_utf8(index).map_err(malformed)?.to_string())
            }
            '@' => AnnotationValue::Nested(Box::new(AnnotationUse::parse(reader, pool)?)),
            '[' => {
                let count = reader.read_u16()? as usize;
                let mut values = Vec::with_capacity(count);
                for _ in 0..count {
                    values.push(AnnotationValue::parse(reader, pool)?);
                }
                AnnotationValue::Sequence(values)
            }
            other => {
                return Err(DecodeError::MalformedAnnotation(format!(
                    "unknown element value tag {other:?}"
                )));
            }
        };
        Ok(value)
    }

    fn shape(&self) -> &'static str {
        match self {
            AnnotationValue::Primitive(PrimitiveValue::Str(_)) => "string",
            AnnotationValue::Primitive(PrimitiveValue::Int(_)) => "int",
            AnnotationValue::Primitive(PrimitiveValue::Bool(_)) => "bool",
            AnnotationValue::Primitive(PrimitiveValue::Float(_)) => "float",
            AnnotationValue::EnumConstant { .. } => "enum constant",
            AnnotationValue::ClassRef(_) => "class reference",
            AnnotationValue::Nested(_) => "nested annotation",
            AnnotationValue::Sequence(_) => "sequence",
        }
    }

    pub(crate) fn expect_str(&self) -> Result<&str, ShapeMismatch> {
        match self {
            AnnotationValue::Primitive(PrimitiveValue::Str(value)) => Ok(value),
            other => Err(ShapeMismatch {
                expected: "string",
                found: other.shape(),
            }),
        }
    }

    pub(crate) fn expect_bool(&self) -> Result<bool, ShapeMismatch> {
        match self {
            AnnotationValue::Primitive(PrimitiveValue::Bool(value)) => Ok(*value),
            other => Err(ShapeMismatch {
                expected: "bool",
                found: other.shape(),
            }),
        }
    }

    pub(crate) fn expect_enum_constant(&self) -> Result<&str, ShapeMismatch> {
        match self {
            AnnotationValue::EnumConstant { constant, .. } => Ok(constant),
            other => Err(ShapeMismatch {
                expected: "enum constant",
                found: other.shape(),
            }),
        }
    }

    pub(crate) fn expect_sequence(&self) -> Result<&[AnnotationValue], ShapeMismatch> {
        match self {
            AnnotationValue::Sequence(values) => Ok(values),
            other => Err(ShapeMismatch {
                expected: "sequence",
                found: other.shape(),
            }),
        }
    }
}

/// `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations` payload.
pub(crate) fn parse_annotation_list(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<AnnotationUse>, DecodeError> {
    let count = reader.read_u16()? as usize;
    let mut annotations = Vec::with_capacity(count);
    for _ in 0..count {
        annotations.push(AnnotationUse::parse(reader, pool)?);
    }
    Ok(annotations)
}

/// `Runtime{Visible,Invisible}ParameterAnnotations` payload: one list per
/// parameter position.
pub(crate) fn parse_parameter_annotation_table(
    reader: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Vec<Vec<AnnotationUse>>, DecodeError> {
    let parameter_count = reader.read_u8()? as usize;
    let mut table = Vec::with_capacity(parameter_count);
    for _ in 0..parameter_count {
        table.push(parse_annotation_list(reader, pool)?);
    }
    Ok(table)
}
