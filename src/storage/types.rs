//! Core data types for the turbine storage engine
//!
//! This module defines the fundamental types used throughout the storage layer:
//! - `ChannelType`: channel name suffix to element type/width mapping
//! - `Mode`: query reference mode (absolute/oldest/newest/after)
//! - `ByteOrder` and `SpacingPolicy` flags
//! - `PutValue`: the value forms accepted by `Writer::put_data`

use crate::storage::error::{StorageError, StorageResult};
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert epoch milliseconds to seconds (the public query time unit)
pub fn ms_to_secs(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Convert seconds to epoch milliseconds (folder-name time unit)
pub fn secs_to_ms(secs: f64) -> i64 {
    (secs * 1000.0).round() as i64
}

/// Parse a timestamp folder/file name as epoch milliseconds.
///
/// Names must be pure decimal digits; anything else is not a time name.
/// Numeric parsing here is deliberate: lexicographic name order diverges
/// from time order once digit counts differ (999 vs 1000).
pub fn parse_time_name(name: &str) -> Option<i64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Parse a block entry name, stripping the `.zip` / `.zip.gz` archive suffix.
pub fn block_time_from_name(name: &str) -> Option<i64> {
    let base = name
        .strip_suffix(".zip.gz")
        .or_else(|| name.strip_suffix(".zip"))
        .unwrap_or(name);
    parse_time_name(base)
}

/// Element type of a channel, derived from its file-name suffix.
///
/// The same table drives Writer encode defaults and Reader decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelType {
    /// `.f32` - 4-byte IEEE float
    Float32,
    /// `.f64` - 8-byte IEEE double
    Float64,
    /// `.i16` - 2-byte signed int
    Int16,
    /// `.i32` - 4-byte signed int
    Int32,
    /// `.i64` - 8-byte signed int
    Int64,
    /// `.Num` - numeric string, decodes to f64
    NumericF64,
    /// `.num`/`.csv` - numeric string, decodes to f32
    NumericF32,
    /// `.txt` or no suffix - text
    Text,
    /// `.jpg`/`.wav`/`.mp3`/`.bin` - opaque binary, indivisible
    Binary,
}

impl ChannelType {
    /// Type for a channel name, per its suffix. Unsuffixed names are text.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if name.ends_with(".f32") {
            ChannelType::Float32
        } else if name.ends_with(".f64") {
            ChannelType::Float64
        } else if name.ends_with(".i16") {
            ChannelType::Int16
        } else if name.ends_with(".i32") {
            ChannelType::Int32
        } else if name.ends_with(".i64") {
            ChannelType::Int64
        } else if name.ends_with(".Num") {
            ChannelType::NumericF64
        } else if name.ends_with(".num") || name.ends_with(".csv") {
            ChannelType::NumericF32
        } else if lower.ends_with(".txt") {
            ChannelType::Text
        } else if lower.ends_with(".jpg")
            || lower.ends_with(".wav")
            || lower.ends_with(".mp3")
            || lower.ends_with(".bin")
            || lower.ends_with(".pcm")
        {
            ChannelType::Binary
        } else {
            ChannelType::Text
        }
    }

    /// Bytes per sample. 1 means indivisible (non-packable) data.
    pub fn word_size(&self) -> usize {
        match self {
            ChannelType::Float32 | ChannelType::Int32 => 4,
            ChannelType::Float64 | ChannelType::Int64 => 8,
            ChannelType::Int16 => 2,
            ChannelType::NumericF64 | ChannelType::NumericF32 => 1,
            ChannelType::Text | ChannelType::Binary => 1,
        }
    }

    /// Numeric-string types pack as comma-separated decimal values
    pub fn is_numeric_string(&self) -> bool {
        matches!(self, ChannelType::NumericF64 | ChannelType::NumericF32)
    }
}

/// Byte order for binary sample encoding.
/// Little-endian default, matching the most common producer hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

/// Query reference mode: how `start` anchors the requested time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// `start` is an explicit epoch time (seconds)
    #[default]
    Absolute,
    /// `start` is an offset from the oldest available time
    Oldest,
    /// `start` is an offset back from (newest - duration)
    Newest,
    /// strictly forward-progressing tailing read
    After,
}

impl FromStr for Mode {
    type Err = StorageError;

    fn from_str(s: &str) -> StorageResult<Self> {
        match s {
            "absolute" => Ok(Mode::Absolute),
            "oldest" => Ok(Mode::Oldest),
            "newest" => Ok(Mode::Newest),
            "after" => Ok(Mode::After),
            other => Err(StorageError::Config(format!(
                "unknown reference mode: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Absolute => "absolute",
            Mode::Oldest => "oldest",
            Mode::Newest => "newest",
            Mode::After => "after",
        };
        write!(f, "{}", s)
    }
}

/// Fallback sample-spacing rule for packed Points read without a usable
/// block interval.
///
/// Interpolation normally spans the Block open time to the Point end time;
/// a lone Point whose open and end times coincide needs a fallback rule.
/// Either choice can overlap or gap against an adjacent isolated block;
/// that is an acknowledged limitation of the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpacingPolicy {
    /// Derive dt from the average sample rate across all gathered frames
    #[default]
    AverageRate,
    /// Assign every sample the block time (constant over the block)
    ConstantTime,
}

/// A value accepted by `Writer::put_data`
#[derive(Debug, Clone, PartialEq)]
pub enum PutValue {
    Bytes(Vec<u8>),
    Text(String),
    F64(f64),
    F32(f32),
    I64(i64),
    I32(i32),
    I16(i16),
}

impl PutValue {
    /// Channel-name suffix implied by this value's type, if any
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            PutValue::F64(_) => Some(".f64"),
            PutValue::F32(_) => Some(".f32"),
            PutValue::I64(_) => Some(".i64"),
            PutValue::I32(_) => Some(".i32"),
            PutValue::I16(_) => Some(".i16"),
            PutValue::Bytes(_) | PutValue::Text(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.suffix().is_some()
    }

    /// Fixed-width binary encoding in the given byte order (numeric types only)
    pub fn encode(&self, order: ByteOrder) -> Option<Vec<u8>> {
        let bytes = match (self, order) {
            (PutValue::F64(v), ByteOrder::LittleEndian) => v.to_le_bytes().to_vec(),
            (PutValue::F64(v), ByteOrder::BigEndian) => v.to_be_bytes().to_vec(),
            (PutValue::F32(v), ByteOrder::LittleEndian) => v.to_le_bytes().to_vec(),
            (PutValue::F32(v), ByteOrder::BigEndian) => v.to_be_bytes().to_vec(),
            (PutValue::I64(v), ByteOrder::LittleEndian) => v.to_le_bytes().to_vec(),
            (PutValue::I64(v), ByteOrder::BigEndian) => v.to_be_bytes().to_vec(),
            (PutValue::I32(v), ByteOrder::LittleEndian) => v.to_le_bytes().to_vec(),
            (PutValue::I32(v), ByteOrder::BigEndian) => v.to_be_bytes().to_vec(),
            (PutValue::I16(v), ByteOrder::LittleEndian) => v.to_le_bytes().to_vec(),
            (PutValue::I16(v), ByteOrder::BigEndian) => v.to_be_bytes().to_vec(),
            (PutValue::Bytes(_) | PutValue::Text(_), _) => return None,
        };
        Some(bytes)
    }

    /// Decimal-string rendition for unsuffixed streamed numerics.
    /// Integral floats are written without trailing zeros.
    pub fn to_decimal_string(&self) -> Option<String> {
        match self {
            PutValue::F64(v) => {
                if *v == v.trunc() && v.is_finite() {
                    Some(format!("{}", *v as i64))
                } else {
                    Some(v.to_string())
                }
            }
            PutValue::F32(v) => {
                if *v == v.trunc() && v.is_finite() {
                    Some(format!("{}", *v as i64))
                } else {
                    Some(v.to_string())
                }
            }
            PutValue::I64(v) => Some(v.to_string()),
            PutValue::I32(v) => Some(v.to_string()),
            PutValue::I16(v) => Some(v.to_string()),
            PutValue::Bytes(_) | PutValue::Text(_) => None,
        }
    }
}

impl From<Vec<u8>> for PutValue {
    fn from(v: Vec<u8>) -> Self {
        PutValue::Bytes(v)
    }
}

impl From<&[u8]> for PutValue {
    fn from(v: &[u8]) -> Self {
        PutValue::Bytes(v.to_vec())
    }
}

impl From<&str> for PutValue {
    fn from(v: &str) -> Self {
        PutValue::Text(v.to_string())
    }
}

impl From<String> for PutValue {
    fn from(v: String) -> Self {
        PutValue::Text(v)
    }
}

impl From<f64> for PutValue {
    fn from(v: f64) -> Self {
        PutValue::F64(v)
    }
}

impl From<f32> for PutValue {
    fn from(v: f32) -> Self {
        PutValue::F32(v)
    }
}

impl From<i64> for PutValue {
    fn from(v: i64) -> Self {
        PutValue::I64(v)
    }
}

impl From<i32> for PutValue {
    fn from(v: i32) -> Self {
        PutValue::I32(v)
    }
}

impl From<i16> for PutValue {
    fn from(v: i16) -> Self {
        PutValue::I16(v)
    }
}
