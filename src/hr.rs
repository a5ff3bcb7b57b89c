//! Post-decode pass that folds `hr` messages into `record` messages.
//!
//! HRM-plugin activities deliver heart rate out of band: `hr` messages
//! carry `filtered_bpm` readings paired element-wise with accumulated
//! `event_timestamp` seconds on the sensor clock. Merging anchors that
//! clock to the record timeline and stamps each record with the latest
//! reading at or before its timestamp.

use crate::decoder::Message;
use crate::value::{Value, FIT_EPOCH_S};

#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateSample {
    /// Seconds on the sensor clock.
    pub event_timestamp: f64,
    pub heart_rate: u64,
}

/// Flattens `hr` messages into individual samples in file order.
pub fn expand_heart_rates(hr_mesgs: &[Message]) -> Vec<HeartRateSample> {
    let mut samples = Vec::new();
    for mesg in hr_mesgs {
        let timestamps = numeric_elements(mesg.fields.get("event_timestamp"));
        let bpms = numeric_elements(mesg.fields.get("filtered_bpm"));

        for (event_timestamp, heart_rate) in timestamps.iter().zip(bpms.iter()) {
            samples.push(HeartRateSample {
                event_timestamp: *event_timestamp,
                heart_rate: *heart_rate as u64,
            });
        }
    }
    samples
}

/// Writes a `heart_rate` field into every record that has a sample at or
/// before its timestamp. The sensor clock is anchored so that the first
/// sample lines up with the first record.
pub fn merge_heart_rates(hr_mesgs: &[Message], record_mesgs: &mut [Message]) {
    let samples = expand_heart_rates(hr_mesgs);
    if samples.is_empty() {
        return;
    }

    let first_record_secs = record_mesgs
        .iter()
        .find_map(|record| timestamp_secs(record.fields.get("timestamp")));
    let first_record_secs = match first_record_secs {
        Some(secs) => secs,
        None => return,
    };
    let clock_offset = first_record_secs - samples[0].event_timestamp;

    let mut sample_index = 0usize;
    for record in record_mesgs.iter_mut() {
        let record_secs = match timestamp_secs(record.fields.get("timestamp")) {
            Some(secs) => secs,
            None => continue,
        };

        while sample_index + 1 < samples.len()
            && samples[sample_index + 1].event_timestamp + clock_offset <= record_secs
        {
            sample_index += 1;
        }

        if samples[sample_index].event_timestamp + clock_offset <= record_secs {
            record.fields.insert(
                "heart_rate".to_string(),
                Value::UInt(samples[sample_index].heart_rate),
            );
        }
    }
}

fn numeric_elements(value: Option<&Value>) -> Vec<f64> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
        Some(other) => other.as_f64().into_iter().collect(),
        None => Vec::new(),
    }
}

/// Record timestamps come through either as raw FIT seconds or as UTC
/// datetimes depending on the decode options.
fn timestamp_secs(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Timestamp(datetime) => Some((datetime.timestamp() - FIT_EPOCH_S) as f64),
        other => other.as_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hr_mesg(event_timestamps: &[f64], bpms: &[u64]) -> Message {
        let mut mesg = Message::default();
        mesg.fields.insert(
            "event_timestamp".to_string(),
            Value::Array(event_timestamps.iter().map(|t| Value::Float(*t)).collect()),
        );
        mesg.fields.insert(
            "filtered_bpm".to_string(),
            Value::Array(bpms.iter().map(|b| Value::UInt(*b)).collect()),
        );
        mesg
    }

    fn record_mesg(timestamp: u64) -> Message {
        let mut mesg = Message::default();
        mesg.fields
            .insert("timestamp".to_string(), Value::UInt(timestamp));
        mesg
    }

    #[test]
    fn expand_pairs_bpm_with_event_timestamps() {
        let mesgs = vec![hr_mesg(&[0.0, 0.25, 0.5], &[90, 91, 92]), hr_mesg(&[0.75], &[93])];
        let samples = expand_heart_rates(&mesgs);

        assert_eq!(samples.len(), 4);
        assert_eq!(
            samples[1],
            HeartRateSample {
                event_timestamp: 0.25,
                heart_rate: 91
            }
        );
        assert_eq!(samples[3].heart_rate, 93);
    }

    #[test]
    fn merge_stamps_latest_sample_at_or_before_each_record() {
        let hr_mesgs = vec![hr_mesg(&[10.0, 10.5, 11.0, 12.0], &[90, 91, 92, 95])];
        let mut records = vec![record_mesg(1000), record_mesg(1001), record_mesg(1002)];

        merge_heart_rates(&hr_mesgs, &mut records);

        // anchor: sample at 10.0s lines up with the record at 1000
        assert_eq!(records[0].fields["heart_rate"], Value::UInt(90));
        assert_eq!(records[1].fields["heart_rate"], Value::UInt(92));
        assert_eq!(records[2].fields["heart_rate"], Value::UInt(95));
    }

    #[test]
    fn merge_without_samples_is_a_no_op() {
        let mut records = vec![record_mesg(1000)];
        merge_heart_rates(&[], &mut records);
        assert!(!records[0].fields.contains_key("heart_rate"));
    }
}
