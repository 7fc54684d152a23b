//! Decoded primitive values read from guest memory

use super::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw x87 extended-precision pattern (64-bit mantissa with explicit integer
/// bit, 15-bit exponent, sign in the top bit of `sign_exponent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedFloat {
    pub mantissa: u64,
    pub sign_exponent: u16,
}

impl ExtendedFloat {
    const EXPONENT_BIAS: i32 = 16383;

    /// Builds from the 10 significant bytes in little-endian order
    pub fn from_le_bytes(bytes: [u8; 10]) -> Self {
        let mut mantissa = [0u8; 8];
        mantissa.copy_from_slice(&bytes[..8]);
        ExtendedFloat {
            mantissa: u64::from_le_bytes(mantissa),
            sign_exponent: u16::from_le_bytes([bytes[8], bytes[9]]),
        }
    }

    pub fn is_sign_negative(&self) -> bool {
        self.sign_exponent & 0x8000 != 0
    }

    /// Biased exponent
    pub fn exponent(&self) -> u16 {
        self.sign_exponent & 0x7FFF
    }

    /// Nearest `f64`; precision beyond 53 bits and out-of-range exponents are lost
    pub fn to_f64(&self) -> f64 {
        let sign = if self.is_sign_negative() { -1.0 } else { 1.0 };
        let exponent = self.exponent();

        if exponent == 0x7FFF {
            return if self.mantissa << 1 == 0 {
                sign * f64::INFINITY
            } else {
                f64::NAN
            };
        }
        if self.mantissa == 0 {
            return sign * 0.0;
        }

        // Denormals use exponent 1 with no implicit shift.
        let unbiased = i32::from(exponent.max(1)) - Self::EXPONENT_BIAS - 63;
        let half = unbiased / 2;
        sign * (self.mantissa as f64) * 2f64.powi(half) * 2f64.powi(unbiased - half)
    }
}

impl fmt::Display for ExtendedFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}

/// A value decoded from a scalar or pointer member.
///
/// Variants mirror the C kinds a target can hold; which one is produced is
/// decided entirely by the member descriptor, never by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PrimitiveValue {
    Bool(bool),
    Char(u8),
    Int(i32),
    Long(i64),
    UInt(u32),
    ULong(u64),
    Float(f32),
    Double(f64),
    LongDouble(ExtendedFloat),
    Pointer(Address),
}

impl PrimitiveValue {
    /// Gets the kind tag for this value
    pub fn kind(&self) -> ValueKind {
        match self {
            PrimitiveValue::Bool(_) => ValueKind::Bool,
            PrimitiveValue::Char(_) => ValueKind::Char,
            PrimitiveValue::Int(_) => ValueKind::Int,
            PrimitiveValue::Long(_) => ValueKind::Long,
            PrimitiveValue::UInt(_) => ValueKind::UInt,
            PrimitiveValue::ULong(_) => ValueKind::ULong,
            PrimitiveValue::Float(_) => ValueKind::Float,
            PrimitiveValue::Double(_) => ValueKind::Double,
            PrimitiveValue::LongDouble(_) => ValueKind::LongDouble,
            PrimitiveValue::Pointer(_) => ValueKind::Pointer,
        }
    }

    /// Integer view of integral variants (bool, char, integers, pointers)
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            PrimitiveValue::Bool(v) => Some(i128::from(v)),
            PrimitiveValue::Char(v) => Some(i128::from(v)),
            PrimitiveValue::Int(v) => Some(i128::from(v)),
            PrimitiveValue::Long(v) => Some(i128::from(v)),
            PrimitiveValue::UInt(v) => Some(i128::from(v)),
            PrimitiveValue::ULong(v) => Some(i128::from(v)),
            PrimitiveValue::Pointer(a) => Some(i128::from(a.as_u64())),
            _ => None,
        }
    }

    /// Address carried by a pointer value
    pub fn as_address(&self) -> Option<Address> {
        match *self {
            PrimitiveValue::Pointer(a) => Some(a),
            _ => None,
        }
    }
}

/// Tag for the active variant of a [`PrimitiveValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Char,
    Int,
    Long,
    UInt,
    ULong,
    Float,
    Double,
    LongDouble,
    Pointer,
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Bool(v) => write!(f, "{}", v),
            PrimitiveValue::Char(v) => {
                if v.is_ascii_graphic() || *v == b' ' {
                    write!(f, "'{}'", *v as char)
                } else {
                    write!(f, "'\\x{:02x}'", v)
                }
            }
            PrimitiveValue::Int(v) => write!(f, "{}", v),
            PrimitiveValue::Long(v) => write!(f, "{}", v),
            PrimitiveValue::UInt(v) => write!(f, "{}", v),
            PrimitiveValue::ULong(v) => write!(f, "{}", v),
            PrimitiveValue::Float(v) => write!(f, "{}", v),
            PrimitiveValue::Double(v) => write!(f, "{}", v),
            PrimitiveValue::LongDouble(v) => write!(f, "{}", v),
            PrimitiveValue::Pointer(a) => write!(f, "{:x}", a),
        }
    }
}
