use super::DecodeError;
use super::reader::ByteReader;

/// One constant pool slot. Long and Double occupy two slots; the second
/// is `Unused`, as is slot zero.
#[allow(dead_code)]
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CpInfo {
    Unused,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Unused => "Unused",
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::FieldRef { .. } => "FieldRef",
            CpInfo::MethodRef { .. } => "MethodRef",
            CpInfo::InterfaceMethodRef { .. } => "InterfaceMethodRef",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
        }
    }
}

/// Flat, index-addressed constant pool. References between entries are
/// resolved by indexing on demand, never by owning pointers, so the
/// back-references in the format cannot form ownership cycles here.
#[derive(Debug)]
pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let count = reader.read_u16()? as usize;
        if count == 0 {
            return Err(DecodeError::BadConstantPool(
                "constant pool count must be at least 1".to_string(),
            ));
        }
        let mut entries = Vec::with_capacity(count);
        entries.push(CpInfo::Unused);
        while entries.len() < count {
            let tag = reader.read_u8()?;
            let entry = match tag {
                1 => {
                    let len = reader.read_u16()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    let text = decode_modified_utf8(bytes).ok_or_else(|| {
                        DecodeError::BadConstantPool(format!(
                            "invalid modified UTF-8 at index {}",
                            entries.len()
                        ))
                    })?;
                    CpInfo::Utf8(text)
                }
                3 => CpInfo::Integer(reader.read_i32()?),
                4 => CpInfo::Float(reader.read_f32()?),
                5 => CpInfo::Long(reader.read_i64()?),
                6 => CpInfo::Double(reader.read_f64()?),
                7 => CpInfo::Class {
                    name_index: reader.read_u16()?,
                },
                8 => CpInfo::String {
                    string_index: reader.read_u16()?,
                },
                9 => CpInfo::FieldRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                10 => CpInfo::MethodRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                11 => CpInfo::InterfaceMethodRef {
                    class_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                12 => CpInfo::NameAndType {
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                },
                15 => CpInfo::MethodHandle {
                    reference_kind: reader.read_u8()?,
                    reference_index: reader.read_u16()?,
                },
                16 => CpInfo::MethodType {
                    descriptor_index: reader.read_u16()?,
                },
                17 => CpInfo::Dynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                18 => CpInfo::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u16()?,
                    name_and_type_index: reader.read_u16()?,
                },
                19 => CpInfo::Module {
                    name_index: reader.read_u16()?,
                },
                20 => CpInfo::Package {
                    name_index: reader.read_u16()?,
                },
                other => {
                    return Err(DecodeError::BadConstantPool(format!(
                        "unknown constant pool tag {other} at index {}",
                        entries.len()
                    )));
                }
            };
            let two_slots = matches!(entry, CpInfo::Long(_) | CpInfo::Double(_));
            entries.push(entry);
            if two_slots {
                entries.push(CpInfo::Unused);
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo, DecodeError> {
        match self.entries.get(index as usize) {
            None | Some(CpInfo::Unused) => Err(DecodeError::BadConstantPool(format!(
                "constant pool index {index} out of range"
            ))),
            Some(entry) => Ok(entry),
        }
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str, DecodeError> {
        match self.get(index)? {
            CpInfo::Utf8(text) => Ok(text),
            other => Err(self.mismatch(index, "Utf8", other)),
        }
    }

    pub(crate) fn get_integer(&self, index: u16) -> Result<i32, DecodeError> {
        match self.get(index)? {
            CpInfo::Integer(value) => Ok(*value),
            other => Err(self.mismatch(index, "Integer", other)),
        }
    }

    /// Internal (slash-separated) name of a `Class` entry.
    pub(crate) fn get_class_name(&self, index: u16) -> Result<&str, DecodeError> {
        match self.get(index)? {
            CpInfo::Class { name_index } => self.get_utf8(*name_index),
            other => Err(self.mismatch(index, "Class", other)),
        }
    }

    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(&str, &str), DecodeError> {
        match self.get(index)? {
            CpInfo::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.get_utf8(*name_index)?, self.get_utf8(*descriptor_index)?)),
            other => Err(self.mismatch(index, "NameAndType", other)),
        }
    }

    /// Resolve a `MethodRef` or `InterfaceMethodRef` to
    /// `(owner, name, descriptor)`.
    pub(crate) fn get_method_ref(&self, index: u16) -> Result<(&str, &str, &str), DecodeError> {
        let (class_index, name_and_type_index) = match self.get(index)? {
            CpInfo::MethodRef {
                class_index,
                name_and_type_index,
            }
            | CpInfo::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            other => return Err(self.mismatch(index, "MethodRef", other)),
        };
        let owner = self.get_class_name(class_index)?;
        let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
        Ok((owner, name, descriptor))
    }

    fn mismatch(&self, index: u16, expected: &str, found: &CpInfo) -> DecodeError {
        DecodeError::BadConstantPool(format!(
            "index {index}: expected {expected}, found {}",
            found.kind()
        ))
    }
}

/// Decode the class-file flavor of UTF-8: no raw NUL bytes, supplementary
/// characters carried as CESU-8 surrogate pairs. Each 1-3 byte sequence
/// yields one UTF-16 unit; pairing is left to `String::from_utf16`.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i] as u16;
        if a == 0 {
            return None;
        }
        if a < 0x80 {
            units.push(a);
            i += 1;
        } else if a & 0xE0 == 0xC0 {
            let b = *bytes.get(i + 1)? as u16;
            if b & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x1F) << 6) | (b & 0x3F));
            i += 2;
        } else if a & 0xF0 == 0xE0 {
            let b = *bytes.get(i + 1)? as u16;
            let c = *bytes.get(i + 2)? as u16;
            if b & 0xC0 != 0x80 || c & 0xC0 != 0x80 {
                return None;
            }
            units.push(((a & 0x0F) << 12) | ((b & 0x3F) << 6) | (c & 0x3F));
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}
