use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::stream::Endianness;
use crate::value::Value;

/// On-wire base types of the FIT protocol.
#[derive(Debug, Eq, Copy, Clone, PartialEq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum BaseType {
    Enum = 0x00,
    Sint8 = 0x01,
    Uint8 = 0x02,
    Sint16 = 0x83,
    Uint16 = 0x84,
    Sint32 = 0x85,
    Uint32 = 0x86,
    String = 0x07,
    Float32 = 0x88,
    Float64 = 0x89,
    Uint8z = 0x0A,
    Uint16z = 0x8B,
    Uint32z = 0x8C,
    Byte = 0x0D,
    Sint64 = 0x8E,
    Uint64 = 0x8F,
    Uint64z = 0x90,
}

impl BaseType {
    pub fn size(self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::Sint8
            | BaseType::Uint8
            | BaseType::String
            | BaseType::Uint8z
            | BaseType::Byte => 1,
            BaseType::Sint16 | BaseType::Uint16 | BaseType::Uint16z => 2,
            BaseType::Sint32 | BaseType::Uint32 | BaseType::Uint32z | BaseType::Float32 => 4,
            BaseType::Sint64
            | BaseType::Uint64
            | BaseType::Uint64z
            | BaseType::Float64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BaseType::Sint8 | BaseType::Sint16 | BaseType::Sint32 | BaseType::Sint64
        )
    }

    /// The reserved "no data" pattern: all-ones for unsigned widths,
    /// max-positive for signed, zero for the z-variants and strings.
    pub fn invalid(self) -> u64 {
        match self {
            BaseType::Enum | BaseType::Uint8 | BaseType::Byte => 0xFF,
            BaseType::Sint8 => 0x7F,
            BaseType::Sint16 => 0x7FFF,
            BaseType::Uint16 => 0xFFFF,
            BaseType::Sint32 => 0x7FFF_FFFF,
            BaseType::Uint32 | BaseType::Float32 => 0xFFFF_FFFF,
            BaseType::Sint64 => 0x7FFF_FFFF_FFFF_FFFF,
            BaseType::Uint64 | BaseType::Float64 => 0xFFFF_FFFF_FFFF_FFFF,
            BaseType::String
            | BaseType::Uint8z
            | BaseType::Uint16z
            | BaseType::Uint32z
            | BaseType::Uint64z => 0,
        }
    }

    pub fn from_type_name(name: &str) -> Option<BaseType> {
        match name {
            "enum" => Some(BaseType::Enum),
            "sint8" => Some(BaseType::Sint8),
            "uint8" => Some(BaseType::Uint8),
            "sint16" => Some(BaseType::Sint16),
            "uint16" => Some(BaseType::Uint16),
            "sint32" => Some(BaseType::Sint32),
            "uint32" => Some(BaseType::Uint32),
            "string" => Some(BaseType::String),
            "float32" => Some(BaseType::Float32),
            "float64" => Some(BaseType::Float64),
            "uint8z" => Some(BaseType::Uint8z),
            "uint16z" => Some(BaseType::Uint16z),
            "uint32z" => Some(BaseType::Uint32z),
            "byte" => Some(BaseType::Byte),
            "sint64" => Some(BaseType::Sint64),
            "uint64" => Some(BaseType::Uint64),
            "uint64z" => Some(BaseType::Uint64z),
            _ => None,
        }
    }
}

macro_rules! read_endian {
    ($method:ident, $bytes:expr, $endianness:expr) => {
        match $endianness {
            Endianness::Little => LittleEndian::$method($bytes),
            Endianness::Big => BigEndian::$method($bytes),
        }
    };
}

/// Reads one raw element of `base_type` from `bytes` (which must hold
/// exactly `base_type.size()` bytes) without invalid-sentinel checks.
pub fn read_scalar(bytes: &[u8], base_type: BaseType, endianness: Endianness) -> Value {
    match base_type {
        BaseType::Enum | BaseType::Uint8 | BaseType::Uint8z | BaseType::Byte | BaseType::String => {
            Value::UInt(u64::from(bytes[0]))
        }
        BaseType::Sint8 => Value::SInt(i64::from(bytes[0] as i8)),
        BaseType::Sint16 => Value::SInt(i64::from(read_endian!(read_i16, bytes, endianness))),
        BaseType::Uint16 | BaseType::Uint16z => {
            Value::UInt(u64::from(read_endian!(read_u16, bytes, endianness)))
        }
        BaseType::Sint32 => Value::SInt(i64::from(read_endian!(read_i32, bytes, endianness))),
        BaseType::Uint32 | BaseType::Uint32z => {
            Value::UInt(u64::from(read_endian!(read_u32, bytes, endianness)))
        }
        BaseType::Sint64 => Value::SInt(read_endian!(read_i64, bytes, endianness)),
        BaseType::Uint64 | BaseType::Uint64z => {
            Value::UInt(read_endian!(read_u64, bytes, endianness))
        }
        BaseType::Float32 => Value::Float(f64::from(read_endian!(read_f32, bytes, endianness))),
        BaseType::Float64 => Value::Float(read_endian!(read_f64, bytes, endianness)),
    }
}

/// Whether a raw scalar equals the base type's invalid sentinel. Floats
/// carry an all-ones invalid pattern on the wire, which decodes to NaN.
pub fn is_invalid_scalar(value: &Value, base_type: BaseType) -> bool {
    match value {
        Value::UInt(v) => *v == base_type.invalid(),
        Value::SInt(v) => *v as u64 == base_type.invalid(),
        Value::Float(v) => v.is_nan(),
        Value::Invalid => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_wire_codes() {
        assert_eq!(BaseType::Uint8.size(), 1);
        assert_eq!(BaseType::Sint16.size(), 2);
        assert_eq!(BaseType::Float32.size(), 4);
        assert_eq!(BaseType::Uint64z.size(), 8);
    }

    #[test]
    fn unknown_base_type_is_rejected() {
        assert!(BaseType::try_from(0x09).is_err());
        assert_eq!(BaseType::try_from(0x84).ok(), Some(BaseType::Uint16));
    }

    #[test]
    fn scalar_reads_honor_endianness() {
        let bytes = [0x0A, 0x0B];
        assert_eq!(
            read_scalar(&bytes, BaseType::Uint16, Endianness::Little),
            Value::UInt(0x0B0A)
        );
        assert_eq!(
            read_scalar(&bytes, BaseType::Uint16, Endianness::Big),
            Value::UInt(0x0A0B)
        );
    }

    #[test]
    fn signed_scalars_read_negative_values() {
        assert_eq!(
            read_scalar(&[0xF6], BaseType::Sint8, Endianness::Little),
            Value::SInt(-10)
        );
    }

    #[test]
    fn invalid_sentinels() {
        assert!(is_invalid_scalar(&Value::UInt(0xFF), BaseType::Uint8));
        assert!(!is_invalid_scalar(&Value::UInt(0xFF), BaseType::Uint8z));
        assert!(is_invalid_scalar(&Value::UInt(0), BaseType::Uint8z));
        assert!(is_invalid_scalar(&Value::SInt(0x7FFF), BaseType::Sint16));
        assert!(is_invalid_scalar(&Value::Float(f64::NAN), BaseType::Float32));
    }
}
