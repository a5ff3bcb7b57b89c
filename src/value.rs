use chrono::{DateTime, Utc};

/// Seconds between the Unix epoch and the FIT epoch (1989-12-31T00:00:00Z).
pub const FIT_EPOCH_S: i64 = 631_065_600;

/// A decoded field value.
///
/// `Invalid` stands in for elements that matched their base type's invalid
/// sentinel; wholly-invalid fields are dropped from the message instead.
#[derive(Debug, Clone)]
pub enum Value {
    UInt(u64),
    SInt(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Invalid,
}

impl Value {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::SInt(v) => Some(*v as u64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::UInt(v) => Some(*v as f64),
            Value::SInt(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned lane values for bit-level component expansion. Signed raws
    /// contribute their two's-complement bit patterns.
    pub fn lanes(&self) -> Vec<u64> {
        match self {
            Value::UInt(v) => vec![*v],
            Value::SInt(v) => vec![*v as u64],
            Value::Array(items) => items.iter().flat_map(|item| item.lanes()).collect(),
            _ => Vec::new(),
        }
    }

    /// Collapses one-element arrays to their single element.
    pub fn sanitize(self) -> Value {
        match self {
            Value::Array(mut items) if items.len() == 1 => match items.pop() {
                Some(item) => item,
                None => Value::Invalid,
            },
            other => other,
        }
    }
}

/// A float that came out of scale/offset arithmetic, collapsed back to an
/// integer when nothing was lost.
pub fn collapse_float(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 {
        if value >= 0.0 && value <= u64::MAX as f64 {
            return Value::UInt(value as u64);
        }
        if value >= i64::MIN as f64 {
            return Value::SInt(value as i64);
        }
    }
    Value::Float(value)
}

/// NUL-separated string conversion. Invalid UTF-8 decodes lossily and
/// replacement characters at segment boundaries are trimmed; empty segments
/// are dropped. Returns `None` when nothing readable remains, a scalar for
/// one string, an array otherwise.
pub fn convert_string(bytes: &[u8]) -> Option<Value> {
    let mut strings: Vec<Value> = Vec::new();
    for segment in bytes.split(|byte| *byte == 0) {
        if segment.is_empty() {
            continue;
        }
        let text = String::from_utf8_lossy(segment);
        let trimmed = text.trim_matches('\u{FFFD}');
        if trimmed.is_empty() {
            continue;
        }
        strings.push(Value::String(trimmed.to_string()));
    }

    match strings.len() {
        0 => None,
        1 => strings.pop(),
        _ => Some(Value::Array(strings)),
    }
}

/// UTC datetime for a raw `date_time` value; 0 is the FIT epoch itself.
pub fn fit_timestamp_to_datetime(raw: u64) -> DateTime<Utc> {
    let seconds = FIT_EPOCH_S.saturating_add(i64::try_from(raw).unwrap_or(i64::MAX));
    DateTime::from_timestamp(seconds, 0)
        .or_else(|| DateTime::from_timestamp(FIT_EPOCH_S, 0))
        .unwrap_or_default()
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Invalid, Value::Invalid) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            // numeric variants compare by value so UInt(5) == SInt(5)
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_single_string() {
        assert_eq!(
            convert_string(b"abcdefghi\0"),
            Some(Value::String("abcdefghi".to_string()))
        );
    }

    #[test]
    fn convert_string_array() {
        assert_eq!(
            convert_string(b"Hello!\0Good Job!\0"),
            Some(Value::Array(vec![
                Value::String("Hello!".to_string()),
                Value::String("Good Job!".to_string()),
            ]))
        );
    }

    #[test]
    fn convert_all_nul_string_is_none() {
        assert_eq!(convert_string(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn convert_string_trims_replacement_characters() {
        // 0xFF is not valid UTF-8 and decodes to U+FFFD at the boundary
        assert_eq!(
            convert_string(b"abc\xff\0"),
            Some(Value::String("abc".to_string()))
        );
        assert_eq!(convert_string(b"\xff\xff\0"), None);
    }

    #[test]
    fn timestamp_zero_is_fit_epoch() {
        let epoch = fit_timestamp_to_datetime(0);
        assert_eq!(epoch.timestamp(), FIT_EPOCH_S);
    }

    #[test]
    fn timestamp_offsets_from_fit_epoch() {
        let converted = fit_timestamp_to_datetime(1_029_086_357);
        assert_eq!(converted.timestamp(), 1_029_086_357 + FIT_EPOCH_S);
    }

    #[test]
    fn sanitize_collapses_singletons() {
        let single = Value::Array(vec![Value::UInt(7)]);
        assert_eq!(single.sanitize(), Value::UInt(7));

        let pair = Value::Array(vec![Value::UInt(7), Value::UInt(8)]);
        assert_eq!(pair.clone().sanitize(), pair);
    }

    #[test]
    fn numeric_variants_compare_by_value() {
        assert_eq!(Value::UInt(5), Value::SInt(5));
        assert_eq!(Value::Float(5.0), Value::UInt(5));
        assert_ne!(Value::UInt(5), Value::String("5".to_string()));
    }

    #[test]
    fn collapse_float_prefers_integers() {
        assert_eq!(collapse_float(254.0), Value::UInt(254));
        assert_eq!(collapse_float(-3.0), Value::SInt(-3));
        assert_eq!(collapse_float(2.5), Value::Float(2.5));
    }
}
