use super::constant_pool::ConstantPool;
use super::{CallSite, DecodeError};

/// Walk a `Code` attribute body and collect the target of every
/// method-invocation instruction. Every other instruction is skipped, but
/// its length is still computed exactly so the walk never desynchronizes.
pub(crate) fn collect_call_sites(
    code: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<CallSite>, DecodeError> {
    let mut calls = Vec::new();
    let mut offset = 0usize;
    while offset < code.len() {
        let opcode = code[offset];
        let length = opcode_length(code, offset)?;
        if length == 0 || offset + length > code.len() {
            return Err(DecodeError::MalformedMethodBody(format!(
                "instruction at offset {offset} overruns the body"
            )));
        }
        if matches!(opcode, 0xb6..=0xb9) {
            let index = read_u16(code, offset + 1)?;
            let (owner, name, descriptor) = pool.get_method_ref(index).map_err(|err| {
                DecodeError::MalformedMethodBody(format!(
                    "invoke at offset {offset}: {err}"
                ))
            })?;
            calls.push(CallSite {
                owner: owner.to_string(),
                name: name.to_string(),
                descriptor: descriptor.to_string(),
            });
        }
        offset += length;
    }
    Ok(calls)
}

fn opcode_length(code: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let opcode = code[offset];
    let length = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        0x12 => 2,
        0x13 | 0x14 => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x4e => 1,
        0x4f..=0x56 => 1,
        0x57..=0x5f => 1,
        0x60..=0x83 => 1,
        0x84 => 3,
        0x85..=0x98 => 1,
        0x99..=0xa6 => 3,
        0xa7 | 0xa8 => 3,
        0xa9 => 2,
        0xaa => tableswitch_length(code, offset)?,
        0xab => lookupswitch_length(code, offset)?,
        0xac..=0xb1 => 1,
        0xb2..=0xb5 => 3,
        0xb6..=0xb8 => 3,
        0xb9 | 0xba => 5,
        0xbb => 3,
        0xbc => 2,
        0xbd => 3,
        0xbe | 0xbf => 1,
        0xc0 | 0xc1 => 3,
        0xc2 | 0xc3 => 1,
        0xc4 => wide_length(code, offset)?,
        0xc5 => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | 0xc9 => 5,
        0xca => 1,
        0xfe | 0xff => 1,
        _ => {
            return Err(DecodeError::MalformedMethodBody(format!(
                "unsupported opcode 0x{opcode:02x} at offset {offset}"
            )));
        }
    };
    Ok(length)
}

fn tableswitch_length(code: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let padding = padding(offset);
    let base = offset + 1 + padding;
    let low = read_u32(code, base + 4)?;
    let high = read_u32(code, base + 8)?;
    let count = high
        .checked_sub(low)
        .and_then(|range| range.checked_add(1))
        .ok_or_else(|| {
            DecodeError::MalformedMethodBody(format!(
                "tableswitch at offset {offset} has an inverted range"
            ))
        })?;
    Ok(1 + padding + 12 + (count as usize) * 4)
}

fn lookupswitch_length(code: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let padding = padding(offset);
    let base = offset + 1 + padding;
    let npairs = read_u32(code, base + 4)?;
    Ok(1 + padding + 8 + (npairs as usize) * 8)
}

fn wide_length(code: &[u8], offset: usize) -> Result<usize, DecodeError> {
    let widened = code.get(offset + 1).copied().ok_or_else(|| {
        DecodeError::MalformedMethodBody(format!("wide prefix at offset {offset} has no operand"))
    })?;
    if widened == 0x84 { Ok(6) } else { Ok(4) }
}

fn padding(offset: usize) -> usize {
    (4 - ((offset + 1) % 4)) % 4
}

fn read_u16(code: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let slice = code
        .get(offset..offset + 2)
        .ok_or(DecodeError::TruncatedClassFile)?;
    Ok(u16::from_be_bytes([slice[0], slice[1]]))
}

fn read_u32(code: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let slice = code
        .get(offset..offset + 4)
        .ok_or(DecodeError::TruncatedClassFile)?;
    Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
