//! Static FIT profile tables.
//!
//! The full profile is generated from the FIT profile workbook; this module
//! carries the curated subset the decoder ships with, plus the lookup API
//! the decode pipeline runs against. The tables are pure data and never
//! mutated.

pub mod messages;
pub mod types;

pub use messages::mesg_profile;
pub use types::type_value_name;

use crate::base_type::BaseType;

/// Well-known global message numbers.
pub mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const WORKOUT_STEP: u16 = 27;
    pub const ACTIVITY: u16 = 34;
    pub const MONITORING: u16 = 55;
    pub const PAD: u16 = 105;
    pub const HR: u16 = 132;
    pub const FIELD_DESCRIPTION: u16 = 206;
    pub const DEVELOPER_DATA_ID: u16 = 207;
}

#[derive(Debug, Clone, Copy)]
pub struct MessageProfile {
    pub num: u16,
    pub name: &'static str,
    pub messages_key: &'static str,
    pub fields: &'static [FieldProfile],
}

impl MessageProfile {
    pub fn field(&'static self, num: u8) -> Option<&'static FieldProfile> {
        self.fields.iter().find(|field| field.num == num)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldProfile {
    pub num: u8,
    pub name: &'static str,
    pub field_type: &'static str,
    /// One entry per component, or a singleton for plain fields.
    pub scale: &'static [f64],
    pub offset: &'static [f64],
    /// Destination field numbers for bit-level expansion.
    pub components: &'static [u8],
    pub bits: &'static [u8],
    pub is_accumulated: bool,
    pub sub_fields: &'static [SubFieldProfile],
}

impl FieldProfile {
    pub const fn plain(num: u8, name: &'static str, field_type: &'static str) -> FieldProfile {
        FieldProfile {
            num,
            name,
            field_type,
            scale: &[1.0],
            offset: &[0.0],
            components: &[],
            bits: &[],
            is_accumulated: false,
            sub_fields: &[],
        }
    }

    pub const fn scaled(
        num: u8,
        name: &'static str,
        field_type: &'static str,
        scale: &'static [f64],
        offset: &'static [f64],
    ) -> FieldProfile {
        FieldProfile {
            num,
            name,
            field_type,
            scale,
            offset,
            components: &[],
            bits: &[],
            is_accumulated: false,
            sub_fields: &[],
        }
    }

    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn scale_at(&self, index: usize) -> f64 {
        self.scale.get(index).copied().unwrap_or(1.0)
    }

    pub fn offset_at(&self, index: usize) -> f64 {
        self.offset.get(index).copied().unwrap_or(0.0)
    }

    pub fn sub_field(&'static self, name: &str) -> Option<&'static SubFieldProfile> {
        self.sub_fields.iter().find(|sub| sub.name == name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubFieldProfile {
    pub name: &'static str,
    pub field_type: &'static str,
    pub scale: &'static [f64],
    pub offset: &'static [f64],
    pub components: &'static [u8],
    pub bits: &'static [u8],
    /// Reference conditions; the sub-field applies when any pair matches.
    pub map: &'static [RefField],
}

impl SubFieldProfile {
    pub fn has_components(&self) -> bool {
        !self.components.is_empty()
    }

    pub fn scale_at(&self, index: usize) -> f64 {
        self.scale.get(index).copied().unwrap_or(1.0)
    }

    pub fn offset_at(&self, index: usize) -> f64 {
        self.offset.get(index).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RefField {
    pub name: &'static str,
    pub raw_value: u64,
}

/// Base type behind a profile field type, when the type is one of the wire
/// base types. Enum-valued profile types (e.g. `manufacturer`) have none,
/// which keeps them out of bit-level expansion.
pub fn field_type_base(field_type: &str) -> Option<BaseType> {
    BaseType::from_type_name(field_type)
}

/// Field types eligible for scale/offset arithmetic.
pub fn is_numeric_field_type(field_type: &str) -> bool {
    matches!(
        field_type,
        "sint8"
            | "uint8"
            | "sint16"
            | "uint16"
            | "sint32"
            | "uint32"
            | "float32"
            | "float64"
            | "uint8z"
            | "uint16z"
            | "uint32z"
            | "byte"
            | "sint64"
            | "uint64"
            | "uint64z"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_messages_resolve() {
        let record = mesg_profile(mesg_num::RECORD).unwrap();
        assert_eq!(record.name, "record");
        assert_eq!(record.messages_key, "record_mesgs");

        let speed = record.field(6).unwrap();
        assert_eq!(speed.name, "speed");
        assert_eq!(speed.components, &[73]);
        assert_eq!(speed.bits, &[16]);
    }

    #[test]
    fn unknown_message_is_none() {
        assert!(mesg_profile(0xFFF0).is_none());
    }

    #[test]
    fn sub_field_lookup() {
        let event = mesg_profile(mesg_num::EVENT).unwrap();
        let data = event.field(3).unwrap();
        let rider_position = data.sub_field("rider_position").unwrap();
        assert_eq!(rider_position.field_type, "rider_position_type");
        assert_eq!(rider_position.map.len(), 1);
    }

    #[test]
    fn numeric_field_types_exclude_enums() {
        assert!(is_numeric_field_type("uint16"));
        assert!(!is_numeric_field_type("manufacturer"));
        assert!(!is_numeric_field_type("date_time"));
    }
}
