use std::fmt;

use super::DecodeError;

/// Decoded field or return type from a JVM descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum JavaType {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Internal (slash-separated) class name.
    Object(String),
    Array(Box<JavaType>),
}

impl fmt::Display for JavaType {
    /// Canonical human-readable form: dotted names, `[]` for arrays.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Void => f.write_str("void"),
            JavaType::Boolean => f.write_str("boolean"),
            JavaType::Byte => f.write_str("byte"),
            JavaType::Char => f.write_str("char"),
            JavaType::Short => f.write_str("short"),
            JavaType::Int => f.write_str("int"),
            JavaType::Long => f.write_str("long"),
            JavaType::Float => f.write_str("float"),
            JavaType::Double => f.write_str("double"),
            JavaType::Object(name) => f.write_str(&name.replace('/', ".")),
            JavaType::Array(element) => write!(f, "{element}[]"),
        }
    }
}

/// Parsed method descriptor: parameter types and return type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MethodSignature {
    pub(crate) parameters: Vec<JavaType>,
    pub(crate) return_type: JavaType,
}

pub(crate) fn parse_method_descriptor(descriptor: &str) -> Result<MethodSignature, DecodeError> {
    let bytes = descriptor.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(bad(descriptor));
    }
    let mut pos = 1;
    let mut parameters = Vec::new();
    while bytes.get(pos) != Some(&b')') {
        let parameter = parse_type(descriptor, bytes, &mut pos)?;
        if parameter == JavaType::Void {
            return Err(bad(descriptor));
        }
        parameters.push(parameter);
    }
    pos += 1;
    let return_type = parse_type(descriptor, bytes, &mut pos)?;
    if pos != bytes.len() {
        return Err(bad(descriptor));
    }
    Ok(MethodSignature {
        parameters,
        return_type,
    })
}

fn parse_type(descriptor: &str, bytes: &[u8], pos: &mut usize) -> Result<JavaType, DecodeError> {
    let tag = *bytes.get(*pos).ok_or_else(|| bad(descriptor))?;
    *pos += 1;
    let parsed = match tag {
        b'V' => JavaType::Void,
        b'Z' => JavaType::Boolean,
        b'B' => JavaType::Byte,
        b'C' => JavaType::Char,
        b'S' => JavaType::Short,
        b'I' => JavaType::Int,
        b'J' => JavaType::Long,
        b'F' => JavaType::Float,
        b'D' => JavaType::Double,
        b'L' => {
            let start = *pos;
            while bytes.get(*pos).is_some_and(|byte| *byte != b';') {
                *pos += 1;
            }
            if bytes.get(*pos) != Some(&b';') || *pos == start {
                return Err(bad(descriptor));
            }
            let name = descriptor
                .get(start..*pos)
                .ok_or_else(|| bad(descriptor))?
                .to_string();
            *pos += 1;
            JavaType::Object(name)
        }
        b'[' => {
            let element = parse_type(descriptor, bytes, pos)?;
            if element == JavaType::Void {
                return Err(bad(descriptor));
            }
            JavaType::Array(Box::new(element))
        }
        _ => return Err(bad(descriptor)),
    };
    Ok(parsed)
}

fn bad(descriptor: &str) -> DecodeError {
    DecodeError::BadDescriptor(descriptor.to_string())
}
