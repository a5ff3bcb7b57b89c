use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use crate::accumulator::Accumulator;
use crate::base_type::{self, BaseType};
use crate::bitstream::BitStream;
use crate::crc::CrcCalculator;
use crate::error::{FitError, Result};
use crate::header::{FileHeader, HEADER_WITHOUT_CRC_SIZE, HEADER_WITH_CRC_SIZE};
use crate::hr;
use crate::profile::{self, mesg_num, FieldProfile, MessageProfile};
use crate::stream::{Endianness, Stream};
use crate::value::{self, collapse_float, Value};

const CRC_SIZE: usize = 2;
const COMPRESSED_HEADER_MASK: u8 = 0x80;
const MESG_DEFINITION_MASK: u8 = 0x40;
const DEV_DATA_MASK: u8 = 0x20;
const LOCAL_MESG_NUM_MASK: u8 = 0x0F;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeMode {
    Normal,
    SkipHeader,
    DataOnly,
}

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub apply_scale_and_offset: bool,
    pub convert_datetimes_to_dates: bool,
    pub convert_types_to_strings: bool,
    pub enable_crc_check: bool,
    pub expand_sub_fields: bool,
    pub expand_components: bool,
    pub merge_heart_rates: bool,
    pub decode_mode: DecodeMode,
}

impl Default for DecodeOptions {
    fn default() -> DecodeOptions {
        DecodeOptions {
            apply_scale_and_offset: true,
            convert_datetimes_to_dates: true,
            convert_types_to_strings: true,
            enable_crc_check: true,
            expand_sub_fields: true,
            expand_components: true,
            merge_heart_rates: true,
            decode_mode: DecodeMode::Normal,
        }
    }
}

/// One decoded message: profile field names (or decimal field ids for
/// unknown fields) to values, with developer fields keyed by their
/// `field_description` registry position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub fields: BTreeMap<String, Value>,
    pub developer_fields: BTreeMap<usize, Value>,
}

impl Message {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Decoded output, keyed by each message type's `messages_key`; the inner
/// sequences preserve file order.
pub type MessageMap = BTreeMap<String, Vec<Message>>;

pub type MesgListener<'a> = &'a mut dyn FnMut(u16, &Message);

#[derive(Debug, Clone)]
struct FieldDef {
    field_id: u8,
    size: u8,
    base_type: BaseType,
    num_elements: usize,
}

#[derive(Debug, Clone, Copy)]
struct DeveloperFieldDef {
    field_definition_number: u8,
    size: u8,
    developer_data_index: u8,
}

#[derive(Debug, Clone)]
struct LocalMesgDef {
    global_mesg_num: u16,
    endianness: Endianness,
    field_defs: Vec<FieldDef>,
    developer_field_defs: Vec<DeveloperFieldDef>,
    message_size: usize,
    profile: Option<&'static MessageProfile>,
    messages_key: String,
}

/// Registry entry built from a `developer_data_id` message. The identity
/// attributes are recorded as declared by the file even though only the
/// field list drives decoding.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct DeveloperDataDef {
    developer_id: Option<Value>,
    application_id: Option<Value>,
    manufacturer_id: Option<Value>,
    application_version: Option<Value>,
    fields: Vec<DeveloperFieldDescription>,
}

/// One `field_description` message. Scale and offset are recorded but not
/// applied to developer field values.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct DeveloperFieldDescription {
    field_definition_number: u8,
    base_type: Option<BaseType>,
    name: Option<String>,
    units: Option<String>,
    scale: Option<Value>,
    offset: Option<Value>,
    native_mesg_num: Option<Value>,
    native_field_num: Option<Value>,
    key: usize,
}

/// Working shape of a field while a message is being decoded; the cleaning
/// pass flattens it to a single value.
#[derive(Debug, Clone)]
struct FieldEntry {
    raw: Value,
    value: Option<Value>,
    field_def_num: u8,
    is_sub_field: bool,
    is_expanded: bool,
}

type WorkingMessage = BTreeMap<String, FieldEntry>;

#[derive(Debug)]
struct ExpandedEntry {
    raw_values: Vec<Value>,
    values: Vec<Value>,
    field_def_num: u8,
}

/// Borrowed view over the attributes component expansion needs, resolving
/// either a base field or one of its sub-fields.
#[derive(Debug, Clone, Copy)]
struct ComponentView {
    field_type: &'static str,
    components: &'static [u8],
    bits: &'static [u8],
    scale: &'static [f64],
    offset: &'static [f64],
}

impl ComponentView {
    fn scale_at(&self, index: usize) -> f64 {
        self.scale.get(index).copied().unwrap_or(1.0)
    }

    fn offset_at(&self, index: usize) -> f64 {
        self.offset.get(index).copied().unwrap_or(0.0)
    }
}

/// Decoder for a stream holding one or more concatenated FIT sub-files.
///
/// The decoder is stateful and works through the stream in place: one
/// [`Decoder::read`] call decodes everything from the current stream
/// position to the end.
pub struct Decoder<'a> {
    stream: &'a mut Stream,
    local_mesg_defs: HashMap<u8, LocalMesgDef>,
    developer_data_defs: HashMap<u8, DeveloperDataDef>,
    messages: MessageMap,
    accumulator: Accumulator,
    fields_with_subfields: Vec<String>,
    fields_to_expand: Vec<String>,
    options: DecodeOptions,
}

impl<'a> Decoder<'a> {
    pub fn new(stream: &'a mut Stream) -> Decoder<'a> {
        Decoder {
            stream,
            local_mesg_defs: HashMap::new(),
            developer_data_defs: HashMap::new(),
            messages: MessageMap::new(),
            accumulator: Accumulator::new(),
            fields_with_subfields: Vec::new(),
            fields_to_expand: Vec::new(),
            options: DecodeOptions::default(),
        }
    }

    /// Whether the stream looks like a FIT file from the current position:
    /// plausible header size, enough bytes for header plus trailing CRC,
    /// and the `.FIT` magic.
    pub fn is_fit(&mut self) -> bool {
        self.try_is_fit().unwrap_or(false)
    }

    fn try_is_fit(&mut self) -> Result<bool> {
        let header_size = self.stream.peek_byte()?;
        if header_size != HEADER_WITH_CRC_SIZE && header_size != HEADER_WITHOUT_CRC_SIZE {
            return Ok(false);
        }

        if self.stream.len() < self.stream.position() + header_size as usize + CRC_SIZE {
            return Ok(false);
        }

        let file_header = self.read_file_header(true, DecodeMode::Normal)?;
        Ok(file_header.is_fit_data_type())
    }

    /// Validates the header, the header CRC (when present and nonzero) and
    /// the file CRC. Consumes stream position like the original reader.
    pub fn check_integrity(&mut self) -> bool {
        self.try_check_integrity().unwrap_or(false)
    }

    fn try_check_integrity(&mut self) -> Result<bool> {
        if !self.is_fit() {
            return Ok(false);
        }

        let file_header = self.read_file_header(true, DecodeMode::Normal)?;
        if file_header.file_total_size() + CRC_SIZE > self.stream.len() {
            return Ok(false);
        }

        if file_header.header_size == HEADER_WITH_CRC_SIZE && file_header.header_crc != 0 {
            let header_bytes = self.stream.slice(0, HEADER_WITHOUT_CRC_SIZE as usize)?;
            let computed = CrcCalculator::calculate(header_bytes, 0, header_bytes.len());
            if file_header.header_crc != computed {
                return Ok(false);
            }
        }

        let file_bytes = self.stream.read_bytes(file_header.file_total_size())?;
        let computed = CrcCalculator::calculate(&file_bytes, 0, file_bytes.len());
        let crc_from_file = self.stream.read_u16(Endianness::Little)?;

        Ok(crc_from_file == computed)
    }

    pub fn read_file_header(&mut self, reset: bool, decode_mode: DecodeMode) -> Result<FileHeader> {
        let starting_position = self.stream.position();
        let remaining = self.stream.len().saturating_sub(starting_position);

        let file_header = match decode_mode {
            DecodeMode::Normal => FileHeader::read(self.stream)?,
            DecodeMode::SkipHeader => {
                self.stream
                    .seek(starting_position + HEADER_WITH_CRC_SIZE as usize);
                FileHeader::synthesized(HEADER_WITH_CRC_SIZE, remaining)
            }
            DecodeMode::DataOnly => FileHeader::synthesized(0, remaining),
        };

        if reset {
            self.stream.seek(starting_position);
        }

        Ok(file_header)
    }

    /// Decodes everything from the current stream position onward. Fatal
    /// errors abort the current sub-file and are returned alongside the
    /// messages decoded up to that point.
    pub fn read(&mut self, options: DecodeOptions) -> (MessageMap, Vec<FitError>) {
        self.read_internal(options, None)
    }

    pub fn read_with_listener(
        &mut self,
        options: DecodeOptions,
        listener: MesgListener<'_>,
    ) -> (MessageMap, Vec<FitError>) {
        self.read_internal(options, Some(listener))
    }

    fn read_internal(
        &mut self,
        options: DecodeOptions,
        mut listener: Option<MesgListener<'_>>,
    ) -> (MessageMap, Vec<FitError>) {
        self.options = options;
        self.local_mesg_defs.clear();
        self.developer_data_defs.clear();
        self.messages = MessageMap::new();
        self.accumulator = Accumulator::new();

        let mut errors = Vec::new();
        if let Err(error) = self.decode_files(&mut listener) {
            self.stream.set_crc_calculator(None);
            errors.push(error);
        }

        (self.messages.clone(), errors)
    }

    fn decode_files(&mut self, listener: &mut Option<MesgListener<'_>>) -> Result<()> {
        if self.options.merge_heart_rates
            && (!self.options.apply_scale_and_offset || !self.options.expand_components)
        {
            return Err(FitError::InvalidOptions(
                "merge_heart_rates requires apply_scale_and_offset and expand_components",
            ));
        }

        while self.stream.position() < self.stream.len() {
            self.decode_next_file(listener)?;
        }

        if self.options.merge_heart_rates {
            if let Some(hr_mesgs) = self.messages.get("hr_mesgs").cloned() {
                if let Some(record_mesgs) = self.messages.get_mut("record_mesgs") {
                    hr::merge_heart_rates(&hr_mesgs, record_mesgs);
                }
            }
        }

        Ok(())
    }

    fn decode_next_file(&mut self, listener: &mut Option<MesgListener<'_>>) -> Result<()> {
        let position = self.stream.position();

        if self.options.decode_mode == DecodeMode::Normal && !self.is_fit() {
            return Err(FitError::NotAFitFile { position });
        }

        if self.options.enable_crc_check {
            self.stream.set_crc_calculator(Some(CrcCalculator::new()));
        }

        let file_header = self.read_file_header(false, self.options.decode_mode)?;
        debug!(
            "sub-file at byte {}: {} data bytes",
            position, file_header.data_size
        );

        let data_end =
            position + file_header.header_size as usize + file_header.data_size as usize;
        while self.stream.position() < data_end {
            self.decode_next_record(listener)?;
        }

        let crc_calculator = self.stream.take_crc_calculator();
        let crc = self.stream.read_u16(Endianness::Little)?;

        if let Some(crc_calculator) = crc_calculator {
            let computed = crc_calculator.current();
            if self.options.decode_mode == DecodeMode::Normal && crc != computed {
                return Err(FitError::CrcMismatch {
                    expected: crc,
                    computed,
                });
            }
        }

        Ok(())
    }

    fn decode_next_record(&mut self, listener: &mut Option<MesgListener<'_>>) -> Result<()> {
        let record_header = self.stream.peek_byte()?;

        if record_header & COMPRESSED_HEADER_MASK == COMPRESSED_HEADER_MASK {
            return Err(FitError::CompressedTimestampUnsupported {
                position: self.stream.position(),
            });
        }

        if record_header & MESG_DEFINITION_MASK == MESG_DEFINITION_MASK {
            self.decode_mesg_def()
        } else {
            self.decode_message(listener)
        }
    }

    fn decode_mesg_def(&mut self) -> Result<()> {
        let record_header = self.stream.read_byte()?;
        let local_mesg_num = record_header & LOCAL_MESG_NUM_MASK;

        let _reserved = self.stream.read_byte()?;
        let architecture = self.stream.read_byte()?;
        let endianness = if architecture == 0 {
            Endianness::Little
        } else {
            Endianness::Big
        };

        let global_mesg_num = self.stream.read_u16(endianness)?;
        let num_fields = self.stream.read_byte()?;

        let mut field_defs = Vec::with_capacity(num_fields as usize);
        let mut message_size = 0usize;
        for _ in 0..num_fields {
            let field_id = self.stream.read_byte()?;
            let size = self.stream.read_byte()?;
            let base_type_id = self.stream.read_byte()?;

            let mut base_type =
                BaseType::try_from(base_type_id).map_err(|_| FitError::UnknownBaseType {
                    base_type: base_type_id,
                    position: self.stream.position(),
                })?;

            if size as usize % base_type.size() != 0 {
                warn!(
                    "field {} size {} is not a multiple of {:?}, reading it as a byte blob",
                    field_id, size, base_type
                );
                base_type = BaseType::Uint8;
            }

            let num_elements = size as usize / base_type.size();
            message_size += size as usize;
            field_defs.push(FieldDef {
                field_id,
                size,
                base_type,
                num_elements,
            });
        }

        let mut developer_field_defs = Vec::new();
        if record_header & DEV_DATA_MASK == DEV_DATA_MASK {
            let num_dev_fields = self.stream.read_byte()?;
            for _ in 0..num_dev_fields {
                developer_field_defs.push(DeveloperFieldDef {
                    field_definition_number: self.stream.read_byte()?,
                    size: self.stream.read_byte()?,
                    developer_data_index: self.stream.read_byte()?,
                });
            }
        }

        let mesg_profile = profile::mesg_profile(global_mesg_num);
        let messages_key = match mesg_profile {
            Some(mesg_profile) => mesg_profile.messages_key.to_string(),
            None => {
                warn!("unknown global message {}", global_mesg_num);
                global_mesg_num.to_string()
            }
        };

        debug!(
            "definition: local {} -> global {} ({} fields, {} bytes)",
            local_mesg_num,
            global_mesg_num,
            field_defs.len(),
            message_size
        );

        self.messages.entry(messages_key.clone()).or_default();
        self.local_mesg_defs.insert(
            local_mesg_num,
            LocalMesgDef {
                global_mesg_num,
                endianness,
                field_defs,
                developer_field_defs,
                message_size,
                profile: mesg_profile,
                messages_key,
            },
        );

        Ok(())
    }

    fn decode_message(&mut self, listener: &mut Option<MesgListener<'_>>) -> Result<()> {
        let record_header = self.stream.read_byte()?;
        let local_mesg_num = record_header & LOCAL_MESG_NUM_MASK;

        let mesg_def = self
            .local_mesg_defs
            .get(&local_mesg_num)
            .cloned()
            .ok_or(FitError::UnknownLocalMesgNum { local_mesg_num })?;

        self.fields_to_expand.clear();
        self.fields_with_subfields.clear();

        let mut entries = self.read_message_fields(&mesg_def)?;

        let mut developer_fields = BTreeMap::new();
        for developer_field_def in &mesg_def.developer_field_defs {
            match self.lookup_developer_field(developer_field_def) {
                Some(description) => {
                    if let Some(field_value) = self.read_developer_field(
                        developer_field_def,
                        &description,
                        mesg_def.endianness,
                    )? {
                        developer_fields.insert(description.key, field_value);
                    }
                }
                None => {
                    // no field description; read past the data
                    warn!(
                        "skipping developer field {} with no description",
                        developer_field_def.field_definition_number
                    );
                    self.stream
                        .read_bytes(developer_field_def.size as usize)?;
                }
            }
        }

        let mut field_description_key = None;
        if mesg_def.global_mesg_num == mesg_num::DEVELOPER_DATA_ID {
            self.add_developer_data_id(&entries);
        } else if mesg_def.global_mesg_num == mesg_num::FIELD_DESCRIPTION {
            let key = self
                .messages
                .get(&mesg_def.messages_key)
                .map(|decoded| decoded.len())
                .unwrap_or(0);
            field_description_key = Some(key);
            self.add_field_description(&entries, key);
        } else {
            self.apply_profile(&mesg_def, &mut entries)?;
        }

        let mut message = clean_message(entries);
        if let Some(key) = field_description_key {
            message
                .fields
                .insert("key".to_string(), Value::UInt(key as u64));
        }
        message.developer_fields = developer_fields;

        if let Some(listener) = listener.as_mut() {
            listener(mesg_def.global_mesg_num, &message);
        }

        self.messages
            .entry(mesg_def.messages_key.clone())
            .or_default()
            .push(message);

        Ok(())
    }

    fn read_message_fields(&mut self, mesg_def: &LocalMesgDef) -> Result<WorkingMessage> {
        let mut entries = WorkingMessage::new();
        let record = self.stream.read_bytes(mesg_def.message_size)?;

        let mut offset = 0usize;
        for field in &mesg_def.field_defs {
            let bytes = &record[offset..offset + field.size as usize];
            offset += field.size as usize;

            let field_profile = mesg_def
                .profile
                .and_then(|mesg_profile| mesg_profile.field(field.field_id));
            let field_name = match field_profile {
                Some(field_profile) => field_profile.name.to_string(),
                None => field.field_id.to_string(),
            };
            // invalids are preserved for composite fields so bit expansion
            // can look at them
            let convert_invalids = field_profile
                .map(|field_profile| !field_profile.has_components())
                .unwrap_or(true);

            let field_value =
                read_field_value(bytes, field, mesg_def.endianness, convert_invalids);

            let raw = match field_value {
                Some(raw) => raw,
                None => continue,
            };

            if let Some(field_profile) = field_profile {
                if !field_profile.sub_fields.is_empty() {
                    self.fields_with_subfields.push(field_name.clone());
                }
                if field_profile.has_components() {
                    self.fields_to_expand.push(field_name.clone());
                }
                if field_profile.is_accumulated && !field_profile.has_components() {
                    self.prime_accumulator(mesg_def.global_mesg_num, field_profile.num, &raw);
                }
            }

            entries.insert(
                field_name,
                FieldEntry {
                    raw,
                    value: None,
                    field_def_num: field.field_id,
                    is_sub_field: false,
                    is_expanded: false,
                },
            );
        }

        Ok(entries)
    }

    fn prime_accumulator(&mut self, global_mesg_num: u16, field_num: u8, raw: &Value) {
        match raw {
            Value::Array(items) => {
                for item in items {
                    if let Some(element) = item.as_u64() {
                        self.accumulator.create(global_mesg_num, field_num, element);
                    }
                }
            }
            other => {
                if let Some(element) = other.as_u64() {
                    self.accumulator.create(global_mesg_num, field_num, element);
                }
            }
        }
    }

    fn apply_profile(
        &mut self,
        mesg_def: &LocalMesgDef,
        entries: &mut WorkingMessage,
    ) -> Result<()> {
        self.expand_sub_fields(mesg_def, entries);
        self.expand_components(mesg_def, entries)?;
        self.transform_values(mesg_def, entries);
        Ok(())
    }

    fn expand_sub_fields(&mut self, mesg_def: &LocalMesgDef, entries: &mut WorkingMessage) {
        if !self.options.expand_sub_fields {
            return;
        }

        let names = std::mem::take(&mut self.fields_with_subfields);
        for field_name in names {
            let field_def_num = match entries.get(&field_name) {
                Some(entry) => entry.field_def_num,
                None => continue,
            };
            let field_profile = match mesg_def
                .profile
                .and_then(|mesg_profile| mesg_profile.field(field_def_num))
            {
                Some(field_profile) => field_profile,
                None => continue,
            };
            self.expand_sub_field(entries, field_profile);
        }
    }

    fn expand_sub_field(&mut self, entries: &mut WorkingMessage, field_profile: &'static FieldProfile) {
        for sub_field in field_profile.sub_fields {
            // OR semantics over the reference map; the first matching
            // sub-field wins
            let matched = sub_field.map.iter().any(|reference| {
                entries
                    .get(reference.name)
                    .and_then(|entry| entry.raw.as_u64())
                    == Some(reference.raw_value)
            });
            if !matched {
                continue;
            }

            if let Some(original) = entries.get(field_profile.name).cloned() {
                let mut sub_entry = original;
                sub_entry.is_sub_field = true;
                entries.insert(sub_field.name.to_string(), sub_entry);

                if sub_field.has_components() {
                    self.fields_to_expand.push(sub_field.name.to_string());
                }
            }
            break;
        }
    }

    fn expand_components(
        &mut self,
        mesg_def: &LocalMesgDef,
        entries: &mut WorkingMessage,
    ) -> Result<()> {
        if !self.options.expand_components {
            self.fields_to_expand.clear();
            return Ok(());
        }

        let mesg_profile = match mesg_def.profile {
            Some(mesg_profile) => mesg_profile,
            None => {
                self.fields_to_expand.clear();
                return Ok(());
            }
        };

        let mut expanded: BTreeMap<String, ExpandedEntry> = BTreeMap::new();

        while let Some(field_name) = self.fields_to_expand.pop() {
            let (raw, field_def_num, is_sub_field) = if let Some(entry) = entries.get(&field_name)
            {
                (entry.raw.clone(), entry.field_def_num, entry.is_sub_field)
            } else if let Some(entry) = expanded.get(&field_name) {
                (
                    Value::Array(entry.raw_values.clone()),
                    entry.field_def_num,
                    false,
                )
            } else {
                continue;
            };

            let field_profile = match mesg_profile.field(field_def_num) {
                Some(field_profile) => field_profile,
                None => continue,
            };

            let view = if is_sub_field {
                match field_profile.sub_field(&field_name) {
                    Some(sub_field) => ComponentView {
                        field_type: sub_field.field_type,
                        components: sub_field.components,
                        bits: sub_field.bits,
                        scale: sub_field.scale,
                        offset: sub_field.offset,
                    },
                    None => continue,
                }
            } else {
                ComponentView {
                    field_type: field_profile.field_type,
                    components: field_profile.components,
                    bits: field_profile.bits,
                    scale: field_profile.scale,
                    offset: field_profile.offset,
                }
            };

            if view.components.is_empty() {
                continue;
            }

            let source_base_type = match profile::field_type_base(view.field_type) {
                Some(base_type) => base_type,
                None => continue,
            };

            if only_invalid(&raw, source_base_type) {
                continue;
            }

            let mut bit_stream = BitStream::new(raw.lanes(), source_base_type);

            for (index, component_field_num) in view.components.iter().enumerate() {
                let bits = match view.bits.get(index) {
                    Some(bits) => *bits,
                    None => break,
                };
                if bit_stream.bits_available() < u32::from(bits) {
                    break;
                }

                let target_field = match mesg_profile.field(*component_field_num) {
                    Some(target_field) => target_field,
                    None => continue,
                };

                let invalid_value = profile::field_type_base(target_field.field_type)
                    .map(|base_type| base_type.invalid())
                    .unwrap_or(0xFF);

                let mut component_value = bit_stream.read_bits(bits)?;

                if target_field.is_accumulated {
                    component_value = self.accumulator.accumulate(
                        mesg_def.global_mesg_num,
                        target_field.num,
                        component_value,
                        bits,
                    );
                }

                // undo the source's per-component scale/offset, then encode
                // with the target field's own scale/offset
                let scaled =
                    component_value as f64 / view.scale_at(index) - view.offset_at(index);
                let display_value = collapse_float(scaled);
                let raw_for_target =
                    (scaled + target_field.offset_at(0)) * target_field.scale_at(0);

                let entry = expanded
                    .entry(target_field.name.to_string())
                    .or_insert_with(|| ExpandedEntry {
                        raw_values: Vec::new(),
                        values: Vec::new(),
                        field_def_num: target_field.num,
                    });

                entry.raw_values.push(if raw_for_target >= 0.0 {
                    Value::UInt(raw_for_target as u64)
                } else {
                    Value::SInt(raw_for_target as i64)
                });

                if raw_for_target == invalid_value as f64 {
                    entry.values.push(Value::Invalid);
                } else if self.options.convert_types_to_strings {
                    entry
                        .values
                        .push(convert_type_to_string(target_field.field_type, display_value));
                } else {
                    entry.values.push(display_value);
                }

                if target_field.has_components() {
                    self.fields_to_expand.push(target_field.name.to_string());
                }

                if !bit_stream.has_bits_available() {
                    break;
                }
            }
        }

        for (field_name, expanded_entry) in expanded {
            entries.insert(
                field_name,
                FieldEntry {
                    raw: Value::Array(expanded_entry.raw_values).sanitize(),
                    value: Some(Value::Array(expanded_entry.values).sanitize()),
                    field_def_num: expanded_entry.field_def_num,
                    is_sub_field: false,
                    is_expanded: true,
                },
            );
        }

        Ok(())
    }

    fn transform_values(&mut self, mesg_def: &LocalMesgDef, entries: &mut WorkingMessage) {
        for (field_name, entry) in entries.iter_mut() {
            if entry.is_expanded {
                continue;
            }

            let field_profile = mesg_def
                .profile
                .and_then(|mesg_profile| mesg_profile.field(entry.field_def_num));

            let view: Option<(&'static str, &[f64], &[f64])> = match field_profile {
                Some(field_profile) if entry.is_sub_field => field_profile
                    .sub_field(field_name)
                    .map(|sub_field| (sub_field.field_type, sub_field.scale, sub_field.offset)),
                Some(field_profile) => Some((
                    field_profile.field_type,
                    field_profile.scale,
                    field_profile.offset,
                )),
                None => None,
            };

            let mut field_value = entry.raw.clone();
            if let Some((field_type, scale, offset)) = view {
                if self.options.convert_types_to_strings {
                    field_value = convert_type_to_string(field_type, entry.raw.clone());
                }
                if self.options.apply_scale_and_offset
                    && profile::is_numeric_field_type(field_type)
                    && scale.len() == 1
                {
                    field_value = apply_scale_offset(
                        entry.raw.clone(),
                        scale[0],
                        offset.first().copied().unwrap_or(0.0),
                    );
                }
                if self.options.convert_datetimes_to_dates && field_type == "date_time" {
                    field_value = convert_timestamp(entry.raw.clone());
                }
            }

            entry.value = Some(field_value);
        }
    }

    fn add_developer_data_id(&mut self, entries: &WorkingMessage) {
        let developer_data_index = match raw_u64(entries, "developer_data_index") {
            Some(index) if index != 0xFF => index as u8,
            _ => return,
        };

        self.developer_data_defs.insert(
            developer_data_index,
            DeveloperDataDef {
                developer_id: raw_value(entries, "developer_id"),
                application_id: raw_value(entries, "application_id"),
                manufacturer_id: raw_value(entries, "manufacturer_id"),
                application_version: raw_value(entries, "application_version"),
                fields: Vec::new(),
            },
        );
    }

    fn add_field_description(&mut self, entries: &WorkingMessage, key: usize) {
        let developer_data_index = match raw_u64(entries, "developer_data_index") {
            Some(index) if index != 0xFF => index as u8,
            _ => return,
        };

        let data_def = match self.developer_data_defs.get_mut(&developer_data_index) {
            Some(data_def) => data_def,
            None => {
                warn!(
                    "field description for unregistered developer data index {}",
                    developer_data_index
                );
                return;
            }
        };

        let field_definition_number = match raw_u64(entries, "field_definition_number") {
            Some(num) => num as u8,
            None => return,
        };

        let base_type = raw_u64(entries, "fit_base_type_id")
            .and_then(|id| u8::try_from(id).ok())
            .and_then(|id| BaseType::try_from(id).ok());
        if base_type.is_none() {
            warn!(
                "field description {} carries an unknown base type",
                field_definition_number
            );
        }

        data_def.fields.push(DeveloperFieldDescription {
            field_definition_number,
            base_type,
            name: raw_string(entries, "field_name"),
            units: raw_string(entries, "units"),
            scale: raw_value(entries, "scale"),
            offset: raw_value(entries, "offset"),
            native_mesg_num: raw_value(entries, "native_mesg_num"),
            native_field_num: raw_value(entries, "native_field_num"),
            key,
        });
    }

    fn lookup_developer_field(
        &self,
        developer_field_def: &DeveloperFieldDef,
    ) -> Option<DeveloperFieldDescription> {
        self.developer_data_defs
            .get(&developer_field_def.developer_data_index)?
            .fields
            .iter()
            .find(|description| {
                description.field_definition_number
                    == developer_field_def.field_definition_number
            })
            .cloned()
    }

    fn read_developer_field(
        &mut self,
        developer_field_def: &DeveloperFieldDef,
        description: &DeveloperFieldDescription,
        endianness: Endianness,
    ) -> Result<Option<Value>> {
        let bytes = self.stream.read_bytes(developer_field_def.size as usize)?;

        let base_type = match description.base_type {
            Some(base_type) => base_type,
            None => return Ok(None),
        };

        if base_type == BaseType::String {
            return Ok(value::convert_string(&bytes));
        }

        let num_elements = bytes.len() / base_type.size();
        let mut elements = Vec::with_capacity(num_elements);
        for index in 0..num_elements {
            let start = index * base_type.size();
            elements.push(base_type::read_scalar(
                &bytes[start..start + base_type.size()],
                base_type,
                endianness,
            ));
        }

        Ok(match elements.len() {
            0 => None,
            1 => elements.pop(),
            _ => Some(Value::Array(elements)),
        })
    }

    /// Total number of messages decoded so far, special messages included.
    pub fn get_num_messages(&self) -> u32 {
        self.messages
            .values()
            .map(|decoded| decoded.len() as u32)
            .sum()
    }
}

fn read_field_value(
    bytes: &[u8],
    field: &FieldDef,
    endianness: Endianness,
    convert_invalids: bool,
) -> Option<Value> {
    if field.base_type == BaseType::String {
        return value::convert_string(bytes);
    }

    if field.num_elements > 1 {
        if field.base_type == BaseType::Byte {
            let elements: Vec<Value> = bytes
                .iter()
                .map(|byte| Value::UInt(u64::from(*byte)))
                .collect();
            let all_invalid = elements
                .iter()
                .all(|element| base_type::is_invalid_scalar(element, BaseType::Byte));
            return if all_invalid {
                None
            } else {
                Some(Value::Array(elements))
            };
        }

        let mut elements = Vec::with_capacity(field.num_elements);
        let mut all_none = true;
        for index in 0..field.num_elements {
            let start = index * field.base_type.size();
            let element = base_type::read_scalar(
                &bytes[start..start + field.base_type.size()],
                field.base_type,
                endianness,
            );
            if base_type::is_invalid_scalar(&element, field.base_type) && convert_invalids {
                elements.push(Value::Invalid);
            } else {
                all_none = false;
                elements.push(element);
            }
        }
        return if all_none {
            None
        } else {
            Some(Value::Array(elements))
        };
    }

    if field.num_elements == 0 {
        return None;
    }

    let element = base_type::read_scalar(bytes, field.base_type, endianness);
    if base_type::is_invalid_scalar(&element, field.base_type) && convert_invalids {
        None
    } else {
        Some(element)
    }
}

fn only_invalid(raw: &Value, base_type: BaseType) -> bool {
    match raw {
        Value::Array(items) => items
            .iter()
            .all(|item| base_type::is_invalid_scalar(item, base_type)),
        other => base_type::is_invalid_scalar(other, base_type),
    }
}

fn convert_type_to_string(field_type: &str, raw: Value) -> Value {
    match raw {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_type_to_string(field_type, item))
                .collect(),
        ),
        other => {
            if let Some(raw_value) = other.as_u64() {
                if let Some(name) = profile::type_value_name(field_type, raw_value) {
                    return Value::String(name.to_string());
                }
            }
            other
        }
    }
}

fn apply_scale_offset(raw: Value, scale: f64, offset: f64) -> Value {
    match raw {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| apply_scale_offset(item, scale, offset))
                .collect(),
        ),
        Value::Invalid => Value::Invalid,
        other => {
            let raw_value = match other.as_f64() {
                Some(raw_value) => raw_value,
                None => return other,
            };
            if scale != 1.0 {
                Value::Float(raw_value / scale - offset)
            } else if offset != 0.0 {
                collapse_float(raw_value - offset)
            } else {
                other
            }
        }
    }
}

fn convert_timestamp(raw: Value) -> Value {
    match raw {
        Value::Array(items) => {
            Value::Array(items.into_iter().map(convert_timestamp).collect())
        }
        other => match other.as_u64() {
            Some(raw_value) => Value::Timestamp(value::fit_timestamp_to_datetime(raw_value)),
            None => other,
        },
    }
}

fn clean_message(entries: WorkingMessage) -> Message {
    let mut message = Message::default();
    for (field_name, entry) in entries {
        let field_value = entry.value.unwrap_or(entry.raw);
        message.fields.insert(field_name, field_value.sanitize());
    }
    message
}

fn raw_value(entries: &WorkingMessage, name: &str) -> Option<Value> {
    entries.get(name).map(|entry| entry.raw.clone())
}

fn raw_u64(entries: &WorkingMessage, name: &str) -> Option<u64> {
    entries.get(name).and_then(|entry| entry.raw.as_u64())
}

fn raw_string(entries: &WorkingMessage, name: &str) -> Option<String> {
    entries.get(name).and_then(|entry| match &entry.raw {
        Value::String(text) => Some(text.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_values_collapse_invalids() {
        let field = FieldDef {
            field_id: 0,
            size: 2,
            base_type: BaseType::Uint8,
            num_elements: 2,
        };

        assert_eq!(
            read_field_value(&[0xFF, 0xFF], &field, Endianness::Little, true),
            None
        );
        assert_eq!(
            read_field_value(&[0x01, 0xFF], &field, Endianness::Little, true),
            Some(Value::Array(vec![Value::UInt(1), Value::Invalid]))
        );
        // composite fields keep their invalids so bit expansion can see them
        assert_eq!(
            read_field_value(&[0xFF, 0xFF], &field, Endianness::Little, false),
            Some(Value::Array(vec![Value::UInt(255), Value::UInt(255)]))
        );
    }

    #[test]
    fn string_fields_split_on_nul() {
        let field = FieldDef {
            field_id: 0,
            size: 4,
            base_type: BaseType::String,
            num_elements: 4,
        };

        assert_eq!(
            read_field_value(b"ab\0\0", &field, Endianness::Little, true),
            Some(Value::String("ab".to_string()))
        );
        assert_eq!(
            read_field_value(&[0, 0, 0, 0], &field, Endianness::Little, true),
            None
        );
    }

    #[test]
    fn scale_offset_preserves_integer_shape() {
        assert_eq!(
            apply_scale_offset(Value::UInt(1865), 5.0, 500.0),
            Value::Float(-127.0)
        );
        assert_eq!(apply_scale_offset(Value::UInt(42), 1.0, 0.0), Value::UInt(42));
        assert_eq!(
            apply_scale_offset(Value::Invalid, 5.0, 0.0),
            Value::Invalid
        );
        assert_eq!(
            apply_scale_offset(
                Value::Array(vec![Value::UInt(240), Value::Invalid]),
                2.0,
                0.0
            ),
            Value::Array(vec![Value::Float(120.0), Value::Invalid])
        );
    }

    #[test]
    fn enum_names_fall_back_to_raw_values() {
        assert_eq!(
            convert_type_to_string("manufacturer", Value::UInt(1)),
            Value::String("garmin".to_string())
        );
        assert_eq!(
            convert_type_to_string("manufacturer", Value::UInt(9999)),
            Value::UInt(9999)
        );
        assert_eq!(convert_type_to_string("uint16", Value::UInt(7)), Value::UInt(7));
    }

    #[test]
    fn cleaning_flattens_entries_and_singletons() {
        let mut entries = WorkingMessage::new();
        entries.insert(
            "speed".to_string(),
            FieldEntry {
                raw: Value::UInt(3000),
                value: Some(Value::Float(3.0)),
                field_def_num: 6,
                is_sub_field: false,
                is_expanded: false,
            },
        );
        entries.insert(
            "enhanced_speed".to_string(),
            FieldEntry {
                raw: Value::Array(vec![Value::UInt(3000)]),
                value: Some(Value::Array(vec![Value::Float(3.0)])),
                field_def_num: 73,
                is_sub_field: false,
                is_expanded: true,
            },
        );

        let message = clean_message(entries);
        assert_eq!(message.fields["speed"], Value::Float(3.0));
        assert_eq!(message.fields["enhanced_speed"], Value::Float(3.0));
    }
}
