//! Decoder for FIT (Flexible and Interoperable Data Transfer) files.
//!
//! A FIT file is a stream of concatenated sub-files, each one a header,
//! a sequence of definition and data records, and a trailing CRC. This
//! crate walks that record stream, validates integrity, and applies the
//! static profile tables to produce message maps with named, typed field
//! values: scale/offset arithmetic, enum names, UTC datetimes, sub-field
//! selection and bit-level component expansion with cross-record
//! accumulation.
//!
//! ```no_run
//! use fit_decoder::{Decoder, DecodeOptions, Stream};
//!
//! let mut stream = Stream::from_file("activity.fit")?;
//! let mut decoder = Decoder::new(&mut stream);
//! let (messages, _errors) = decoder.read(DecodeOptions::default());
//! for record in messages.get("record_mesgs").into_iter().flatten() {
//!     println!("{:?}", record.field("heart_rate"));
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod accumulator;
pub mod base_type;
pub mod bitstream;
pub mod crc;
pub mod decoder;
pub mod error;
pub mod header;
pub mod hr;
pub mod profile;
pub mod stream;
pub mod value;

pub use accumulator::Accumulator;
pub use base_type::BaseType;
pub use bitstream::BitStream;
pub use crc::CrcCalculator;
pub use decoder::{DecodeMode, DecodeOptions, Decoder, Message, MessageMap};
pub use error::{FitError, Result};
pub use header::FileHeader;
pub use stream::{Endianness, Stream};
pub use value::{Value, FIT_EPOCH_S};
