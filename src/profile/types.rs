//! Enum value names for the profile types the message catalog references.

/// Display name for a raw enum value, or `None` when either the type has no
/// name table or the value is not listed (callers pass the raw value
/// through unchanged in that case).
pub fn type_value_name(type_name: &str, raw_value: u64) -> Option<&'static str> {
    match type_name {
        "file" => match raw_value {
            1 => Some("device"),
            2 => Some("settings"),
            3 => Some("sport"),
            4 => Some("activity"),
            5 => Some("workout"),
            _ => None,
        },
        "manufacturer" => match raw_value {
            1 => Some("garmin"),
            13 => Some("dynastream_oem"),
            15 => Some("dynastream"),
            255 => Some("development"),
            _ => None,
        },
        "garmin_product" => match raw_value {
            1 => Some("hrm1"),
            2337 => Some("virb_ultra_30"),
            _ => None,
        },
        "event" => match raw_value {
            0 => Some("timer"),
            3 => Some("workout"),
            42 => Some("front_gear_change"),
            43 => Some("rear_gear_change"),
            44 => Some("rider_position_change"),
            _ => None,
        },
        "event_type" => match raw_value {
            0 => Some("start"),
            1 => Some("stop"),
            3 => Some("marker"),
            4 => Some("stop_all"),
            _ => None,
        },
        "rider_position_type" => match raw_value {
            0 => Some("seated"),
            1 => Some("standing"),
            2 => Some("transition_to_seated"),
            3 => Some("transition_to_standing"),
            _ => None,
        },
        "activity_type" => match raw_value {
            0 => Some("generic"),
            1 => Some("running"),
            2 => Some("cycling"),
            3 => Some("transition"),
            4 => Some("fitness_equipment"),
            5 => Some("swimming"),
            6 => Some("walking"),
            8 => Some("sedentary"),
            _ => None,
        },
        "activity" => match raw_value {
            0 => Some("manual"),
            1 => Some("auto_multi_sport"),
            _ => None,
        },
        "wkt_step_duration" => match raw_value {
            0 => Some("time"),
            1 => Some("distance"),
            2 => Some("hr_less_than"),
            3 => Some("hr_greater_than"),
            _ => None,
        },
        "fit_base_type" => match raw_value {
            0 => Some("enum"),
            1 => Some("sint8"),
            2 => Some("uint8"),
            7 => Some("string"),
            10 => Some("uint8z"),
            13 => Some("byte"),
            131 => Some("sint16"),
            132 => Some("uint16"),
            133 => Some("sint32"),
            134 => Some("uint32"),
            136 => Some("float32"),
            137 => Some("float64"),
            139 => Some("uint16z"),
            140 => Some("uint32z"),
            142 => Some("sint64"),
            143 => Some("uint64"),
            144 => Some("uint64z"),
            _ => None,
        },
        _ => None,
    }
}
