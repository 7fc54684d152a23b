//! Byte reassembly and reinterpretation of fetched member bytes

use crate::core::types::{
    Address, Bitfield, ExtendedFloat, MemberDescriptor, PrimitiveValue, QueryError, QueryResult,
    TypeCategory,
};

/// How many bytes to fetch for a member, or why it cannot be decoded.
///
/// Checked before touching memory so that an undecodable member never
/// costs a read.
pub fn read_width(rdt: &MemberDescriptor, pointer_size: usize) -> QueryResult<usize> {
    if !rdt.is_valid {
        return Err(QueryError::unsupported(format!(
            "member '{}' is marked not decodable",
            rdt.name
        )));
    }

    if rdt.is_indirect() {
        return pointer_width(rdt, pointer_size);
    }

    let size = rdt.size_bytes as usize;
    let supported = match rdt.category {
        TypeCategory::Bool | TypeCategory::Int => matches!(size, 1 | 2 | 4 | 8),
        TypeCategory::Char => size == 1,
        TypeCategory::Float => matches!(size, 4 | 8 | 10 | 12 | 16),
        _ => {
            return Err(QueryError::unsupported(format!(
                "member '{}' has aggregate or non-scalar category '{}'",
                rdt.name, rdt.category
            )))
        }
    };
    if !supported {
        return Err(QueryError::unsupported(format!(
            "{}-byte {} for member '{}'",
            size, rdt.category, rdt.name
        )));
    }

    if let Some(bitfield) = rdt.bitfield {
        check_bitfield(rdt, bitfield)?;
    }
    Ok(size)
}

/// Width of a pointer slot.
///
/// The slot size recorded in the metadata wins; a descriptor built without
/// one (size 0) falls back to the guest architecture's pointer size.
pub fn pointer_width(rdt: &MemberDescriptor, arch_pointer_size: usize) -> QueryResult<usize> {
    let width = match rdt.size_bytes {
        0 => arch_pointer_size,
        recorded => recorded as usize,
    };
    match width {
        4 | 8 => Ok(width),
        other => Err(QueryError::unsupported(format!(
            "pointer width {} for member '{}'",
            other, rdt.name
        ))),
    }
}

fn check_bitfield(rdt: &MemberDescriptor, bitfield: Bitfield) -> QueryResult<()> {
    let storage_bits = rdt.size_bytes * 8;
    let end = u64::from(bitfield.bit_position) + u64::from(bitfield.bit_length);
    if rdt.category == TypeCategory::Float || bitfield.bit_length == 0 || end > storage_bits {
        return Err(QueryError::unsupported(format!(
            "bitfield '{}' ({} bits at {}) in {}-byte {}",
            rdt.name, bitfield.bit_length, bitfield.bit_position, rdt.size_bytes, rdt.category
        )));
    }
    Ok(())
}

/// Reassembles up to 8 bytes into an integer in the given byte order
pub fn assemble(bytes: &[u8], little_endian: bool) -> u64 {
    let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
    if little_endian {
        bytes.iter().rev().fold(0, fold)
    } else {
        bytes.iter().fold(0, fold)
    }
}

/// Sign-extends the low `bits` bits of `raw`
pub fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - bits;
    ((raw << shift) as i64) >> shift
}

/// Decodes fetched bytes; `bytes.len()` must equal the planned read width
pub fn decode(rdt: &MemberDescriptor, bytes: &[u8]) -> QueryResult<PrimitiveValue> {
    if rdt.is_indirect() {
        return Ok(PrimitiveValue::Pointer(Address::new(assemble(
            bytes,
            rdt.is_little_endian,
        ))));
    }

    if rdt.category == TypeCategory::Float {
        return decode_float(bytes, rdt.is_little_endian);
    }
    if bytes.len() > 8 {
        return Err(QueryError::unsupported(format!(
            "{}-byte {} for member '{}'",
            bytes.len(),
            rdt.category,
            rdt.name
        )));
    }

    let width_bits = (bytes.len() * 8) as u32;
    let mut raw = assemble(bytes, rdt.is_little_endian);
    let mut bits = width_bits;
    if let Some(bitfield) = rdt.bitfield {
        raw >>= bitfield.bit_position;
        if bitfield.bit_length < 64 {
            raw &= (1u64 << bitfield.bit_length) - 1;
        }
        bits = bitfield.bit_length;
    }

    let value = match rdt.category {
        TypeCategory::Bool => PrimitiveValue::Bool(raw != 0),
        TypeCategory::Char => PrimitiveValue::Char(raw as u8),
        TypeCategory::Int => match (width_bits, rdt.is_signed) {
            (64, true) => PrimitiveValue::Long(sign_extend(raw, bits)),
            (64, false) => PrimitiveValue::ULong(raw),
            (_, true) => PrimitiveValue::Int(sign_extend(raw, bits) as i32),
            (_, false) => PrimitiveValue::UInt(raw as u32),
        },
        other => {
            return Err(QueryError::unsupported(format!(
                "cannot decode category '{}'",
                other
            )))
        }
    };
    Ok(value)
}

fn decode_float(bytes: &[u8], little_endian: bool) -> QueryResult<PrimitiveValue> {
    let value = match bytes.len() {
        4 => PrimitiveValue::Float(f32::from_bits(assemble(bytes, little_endian) as u32)),
        8 => PrimitiveValue::Double(f64::from_bits(assemble(bytes, little_endian))),
        10 | 12 | 16 => {
            // Extended precision lives in the low 80 bits of the storage unit.
            let mut ordered = bytes.to_vec();
            if !little_endian {
                ordered.reverse();
            }
            let mut significant = [0u8; 10];
            significant.copy_from_slice(&ordered[..10]);
            PrimitiveValue::LongDouble(ExtendedFloat::from_le_bytes(significant))
        }
        other => {
            return Err(QueryError::unsupported(format!(
                "{}-byte floating point",
                other
            )))
        }
    };
    Ok(value)
}
