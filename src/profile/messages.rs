//! Message and field catalog, keyed by global message number.
//!
//! Curated from the FIT profile workbook; the layout mirrors the generated
//! tables so regenerating from a newer profile is a drop-in replacement.

use super::{mesg_num, FieldProfile, MessageProfile, RefField, SubFieldProfile};

static FILE_ID_FIELDS: [FieldProfile; 7] = [
    FieldProfile::plain(0, "type", "file"),
    FieldProfile::plain(1, "manufacturer", "manufacturer"),
    FieldProfile {
        num: 2,
        name: "product",
        field_type: "uint16",
        scale: &[1.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: false,
        sub_fields: &[SubFieldProfile {
            name: "garmin_product",
            field_type: "garmin_product",
            scale: &[1.0],
            offset: &[0.0],
            components: &[],
            bits: &[],
            map: &[
                RefField {
                    name: "manufacturer",
                    raw_value: 1,
                },
                RefField {
                    name: "manufacturer",
                    raw_value: 13,
                },
                RefField {
                    name: "manufacturer",
                    raw_value: 15,
                },
            ],
        }],
    },
    FieldProfile::plain(3, "serial_number", "uint32z"),
    FieldProfile::plain(4, "time_created", "date_time"),
    FieldProfile::plain(5, "number", "uint16"),
    FieldProfile::plain(8, "product_name", "string"),
];

static SESSION_FIELDS: [FieldProfile; 4] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile::scaled(7, "total_elapsed_time", "uint32", &[1000.0], &[0.0]),
    FieldProfile::scaled(9, "total_distance", "uint32", &[100.0], &[0.0]),
    FieldProfile::plain(254, "message_index", "uint16"),
];

static RECORD_FIELDS: [FieldProfile; 16] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile::plain(0, "position_lat", "sint32"),
    FieldProfile::plain(1, "position_long", "sint32"),
    FieldProfile {
        num: 2,
        name: "altitude",
        field_type: "uint16",
        scale: &[5.0],
        offset: &[500.0],
        components: &[78],
        bits: &[16],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile::plain(3, "heart_rate", "uint8"),
    FieldProfile::plain(4, "cadence", "uint8"),
    FieldProfile {
        num: 5,
        name: "distance",
        field_type: "uint32",
        scale: &[100.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: true,
        sub_fields: &[],
    },
    FieldProfile {
        num: 6,
        name: "speed",
        field_type: "uint16",
        scale: &[1000.0],
        offset: &[0.0],
        components: &[73],
        bits: &[16],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile::plain(7, "power", "uint16"),
    FieldProfile {
        num: 8,
        name: "compressed_speed_distance",
        field_type: "byte",
        scale: &[100.0, 16.0],
        offset: &[0.0, 0.0],
        components: &[6, 5],
        bits: &[12, 12],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile {
        num: 18,
        name: "cycles",
        field_type: "uint8",
        scale: &[1.0],
        offset: &[0.0],
        components: &[19],
        bits: &[8],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile {
        num: 19,
        name: "total_cycles",
        field_type: "uint32",
        scale: &[1.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: true,
        sub_fields: &[],
    },
    FieldProfile::scaled(69, "left_power_phase", "uint8", &[0.7111111], &[0.0]),
    FieldProfile::scaled(70, "left_power_phase_peak", "uint8", &[0.7111111], &[0.0]),
    FieldProfile::scaled(73, "enhanced_speed", "uint32", &[1000.0], &[0.0]),
    FieldProfile::scaled(78, "enhanced_altitude", "uint32", &[5.0], &[500.0]),
];

static EVENT_FIELDS: [FieldProfile; 9] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile::plain(0, "event", "event"),
    FieldProfile::plain(1, "event_type", "event_type"),
    FieldProfile {
        num: 2,
        name: "data16",
        field_type: "uint16",
        scale: &[1.0],
        offset: &[0.0],
        components: &[3],
        bits: &[16],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile {
        num: 3,
        name: "data",
        field_type: "uint32",
        scale: &[1.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: false,
        sub_fields: &[
            SubFieldProfile {
                name: "gear_change_data",
                field_type: "uint32",
                scale: &[1.0, 1.0, 1.0, 1.0],
                offset: &[0.0, 0.0, 0.0, 0.0],
                components: &[11, 12, 9, 10],
                bits: &[8, 8, 8, 8],
                map: &[
                    RefField {
                        name: "event",
                        raw_value: 42,
                    },
                    RefField {
                        name: "event",
                        raw_value: 43,
                    },
                ],
            },
            SubFieldProfile {
                name: "rider_position",
                field_type: "rider_position_type",
                scale: &[1.0],
                offset: &[0.0],
                components: &[],
                bits: &[],
                map: &[RefField {
                    name: "event",
                    raw_value: 44,
                }],
            },
        ],
    },
    FieldProfile::plain(9, "front_gear_num", "uint8z"),
    FieldProfile::plain(10, "front_gear", "uint8z"),
    FieldProfile::plain(11, "rear_gear_num", "uint8z"),
    FieldProfile::plain(12, "rear_gear", "uint8z"),
];

static WORKOUT_STEP_FIELDS: [FieldProfile; 4] = [
    FieldProfile::plain(254, "message_index", "uint16"),
    FieldProfile::plain(0, "wkt_step_name", "string"),
    FieldProfile::plain(1, "duration_type", "wkt_step_duration"),
    FieldProfile {
        num: 2,
        name: "duration_value",
        field_type: "uint32",
        scale: &[1.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: false,
        sub_fields: &[
            SubFieldProfile {
                name: "duration_time",
                field_type: "uint32",
                scale: &[1000.0],
                offset: &[0.0],
                components: &[],
                bits: &[],
                map: &[RefField {
                    name: "duration_type",
                    raw_value: 0,
                }],
            },
            SubFieldProfile {
                name: "duration_distance",
                field_type: "uint32",
                scale: &[100.0],
                offset: &[0.0],
                components: &[],
                bits: &[],
                map: &[RefField {
                    name: "duration_type",
                    raw_value: 1,
                }],
            },
        ],
    },
];

static ACTIVITY_FIELDS: [FieldProfile; 5] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile::scaled(0, "total_timer_time", "uint32", &[1000.0], &[0.0]),
    FieldProfile::plain(1, "num_sessions", "uint16"),
    FieldProfile::plain(2, "type", "activity"),
    FieldProfile::plain(5, "local_timestamp", "local_date_time"),
];

static MONITORING_FIELDS: [FieldProfile; 5] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile {
        num: 3,
        name: "cycles",
        field_type: "uint32",
        scale: &[2.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: true,
        sub_fields: &[],
    },
    FieldProfile::plain(5, "activity_type", "activity_type"),
    FieldProfile {
        num: 24,
        name: "current_activity_type_intensity",
        field_type: "byte",
        scale: &[1.0, 1.0],
        offset: &[0.0, 0.0],
        components: &[5, 28],
        bits: &[5, 3],
        is_accumulated: false,
        sub_fields: &[],
    },
    FieldProfile::plain(28, "intensity", "uint8"),
];

static HR_FIELDS: [FieldProfile; 5] = [
    FieldProfile::plain(253, "timestamp", "date_time"),
    FieldProfile::scaled(0, "fractional_timestamp", "uint16", &[32768.0], &[0.0]),
    FieldProfile::plain(6, "filtered_bpm", "uint8"),
    FieldProfile {
        num: 9,
        name: "event_timestamp",
        field_type: "uint32",
        scale: &[1024.0],
        offset: &[0.0],
        components: &[],
        bits: &[],
        is_accumulated: true,
        sub_fields: &[],
    },
    FieldProfile {
        num: 10,
        name: "event_timestamp_12",
        field_type: "byte",
        scale: &[
            1024.0, 1024.0, 1024.0, 1024.0, 1024.0, 1024.0, 1024.0, 1024.0, 1024.0, 1024.0,
        ],
        offset: &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        components: &[9, 9, 9, 9, 9, 9, 9, 9, 9, 9],
        bits: &[12, 12, 12, 12, 12, 12, 12, 12, 12, 12],
        is_accumulated: false,
        sub_fields: &[],
    },
];

static FIELD_DESCRIPTION_FIELDS: [FieldProfile; 9] = [
    FieldProfile::plain(0, "developer_data_index", "uint8"),
    FieldProfile::plain(1, "field_definition_number", "uint8"),
    FieldProfile::plain(2, "fit_base_type_id", "fit_base_type"),
    FieldProfile::plain(3, "field_name", "string"),
    FieldProfile::plain(6, "scale", "uint8"),
    FieldProfile::plain(7, "offset", "sint8"),
    FieldProfile::plain(8, "units", "string"),
    FieldProfile::plain(14, "native_mesg_num", "uint16"),
    FieldProfile::plain(15, "native_field_num", "uint8"),
];

static DEVELOPER_DATA_ID_FIELDS: [FieldProfile; 5] = [
    FieldProfile::plain(0, "developer_id", "byte"),
    FieldProfile::plain(1, "application_id", "byte"),
    FieldProfile::plain(2, "manufacturer_id", "manufacturer"),
    FieldProfile::plain(3, "developer_data_index", "uint8"),
    FieldProfile::plain(4, "application_version", "uint32"),
];

static MESSAGES: [MessageProfile; 11] = [
    MessageProfile {
        num: mesg_num::FILE_ID,
        name: "file_id",
        messages_key: "file_id_mesgs",
        fields: &FILE_ID_FIELDS,
    },
    MessageProfile {
        num: mesg_num::SESSION,
        name: "session",
        messages_key: "session_mesgs",
        fields: &SESSION_FIELDS,
    },
    MessageProfile {
        num: mesg_num::RECORD,
        name: "record",
        messages_key: "record_mesgs",
        fields: &RECORD_FIELDS,
    },
    MessageProfile {
        num: mesg_num::EVENT,
        name: "event",
        messages_key: "event_mesgs",
        fields: &EVENT_FIELDS,
    },
    MessageProfile {
        num: mesg_num::WORKOUT_STEP,
        name: "workout_step",
        messages_key: "workout_step_mesgs",
        fields: &WORKOUT_STEP_FIELDS,
    },
    MessageProfile {
        num: mesg_num::ACTIVITY,
        name: "activity",
        messages_key: "activity_mesgs",
        fields: &ACTIVITY_FIELDS,
    },
    MessageProfile {
        num: mesg_num::MONITORING,
        name: "monitoring",
        messages_key: "monitoring_mesgs",
        fields: &MONITORING_FIELDS,
    },
    MessageProfile {
        num: mesg_num::PAD,
        name: "pad",
        messages_key: "pad_mesgs",
        fields: &[],
    },
    MessageProfile {
        num: mesg_num::HR,
        name: "hr",
        messages_key: "hr_mesgs",
        fields: &HR_FIELDS,
    },
    MessageProfile {
        num: mesg_num::FIELD_DESCRIPTION,
        name: "field_description",
        messages_key: "field_description_mesgs",
        fields: &FIELD_DESCRIPTION_FIELDS,
    },
    MessageProfile {
        num: mesg_num::DEVELOPER_DATA_ID,
        name: "developer_data_id",
        messages_key: "developer_data_id_mesgs",
        fields: &DEVELOPER_DATA_ID_FIELDS,
    },
];

pub fn mesg_profile(global_mesg_num: u16) -> Option<&'static MessageProfile> {
    MESSAGES
        .iter()
        .find(|profile| profile.num == global_mesg_num)
}
