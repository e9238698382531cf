//! BACnet Encoding/Decoding Module
//!
//! This module provides the application-layer primitives the object types use to
//! produce and consume property values. It handles the serialization and
//! deserialization of BACnet application-tagged data according to ASHRAE 135.
//!
//! # Overview
//!
//! The encoding module is responsible for:
//! - Converting primitive BACnet data types to/from wire format
//! - Encoding bit strings (status flags, limit enable, event enable)
//! - Context opening/closing tags for constructed values (time stamps)
//! - Decoding one tagged value of unknown type into a [`PropertyValue`]
//!
//! # Example
//!
//! ```
//! use bacnet_objects::encoding::*;
//! use bacnet_objects::object::PropertyValue;
//!
//! let mut buffer: Vec<u8> = Vec::new();
//! encode_real(&mut buffer, 21.5).unwrap();
//! let (value, consumed) = decode_application_data(&buffer).unwrap();
//! assert_eq!(value, PropertyValue::Real(21.5));
//! assert_eq!(consumed, 5);
//! ```

use std::error::Error;
use std::fmt;

use crate::object::{Date, ObjectIdentifier, ObjectType, PropertyValue, Time};

/// Largest APDU this stack will build without segmentation
pub const MAX_APDU: usize = 1476;

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Errors that can occur during encoding/decoding operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Buffer underflow during decoding
    BufferUnderflow,
    /// Invalid tag number encountered
    InvalidTag,
    /// Invalid length value
    InvalidLength,
    /// Invalid encoding format
    InvalidFormat(String),
    /// Value out of valid range
    ValueOutOfRange,
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::BufferUnderflow => write!(f, "Buffer underflow during decoding"),
            EncodingError::InvalidTag => write!(f, "Invalid tag number encountered"),
            EncodingError::InvalidLength => write!(f, "Invalid length value"),
            EncodingError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            EncodingError::ValueOutOfRange => write!(f, "Value out of valid range"),
        }
    }
}

impl Error for EncodingError {}

/// BACnet application tag numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApplicationTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectIdentifier = 12,
}

impl TryFrom<u8> for ApplicationTag {
    type Error = EncodingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ApplicationTag::Null),
            1 => Ok(ApplicationTag::Boolean),
            2 => Ok(ApplicationTag::UnsignedInt),
            3 => Ok(ApplicationTag::SignedInt),
            4 => Ok(ApplicationTag::Real),
            5 => Ok(ApplicationTag::Double),
            6 => Ok(ApplicationTag::OctetString),
            7 => Ok(ApplicationTag::CharacterString),
            8 => Ok(ApplicationTag::BitString),
            9 => Ok(ApplicationTag::Enumerated),
            10 => Ok(ApplicationTag::Date),
            11 => Ok(ApplicationTag::Time),
            12 => Ok(ApplicationTag::ObjectIdentifier),
            _ => Err(EncodingError::InvalidTag),
        }
    }
}

fn push_extended_length(buffer: &mut Vec<u8>, length: usize) {
    if length < 254 {
        buffer.push(length as u8);
    } else if length < 65536 {
        buffer.push(254);
        buffer.extend_from_slice(&(length as u16).to_be_bytes());
    } else {
        buffer.push(255);
        buffer.extend_from_slice(&(length as u32).to_be_bytes());
    }
}

/// Encode a BACnet application tag
pub fn encode_application_tag(buffer: &mut Vec<u8>, tag: ApplicationTag, length: usize) -> Result<()> {
    let tag_byte = if length < 5 {
        (tag as u8) << 4 | (length as u8)
    } else {
        (tag as u8) << 4 | 5
    };

    buffer.push(tag_byte);

    if length >= 5 {
        push_extended_length(buffer, length);
    }

    Ok(())
}

/// Decode a BACnet application tag
///
/// Returns the tag, the length/value/type field and the number of header bytes.
pub fn decode_application_tag(data: &[u8]) -> Result<(ApplicationTag, usize, usize)> {
    let Some(&tag_byte) = data.first() else {
        return Err(EncodingError::InvalidTag);
    };

    // context-specific class, opening and closing tags are not application data
    if tag_byte & 0x08 != 0 {
        return Err(EncodingError::InvalidTag);
    }

    let tag = ApplicationTag::try_from(tag_byte >> 4)?;
    let mut length = (tag_byte & 0x07) as usize;
    let mut consumed = 1;

    if tag != ApplicationTag::Boolean && length == 5 {
        if data.len() < 2 {
            return Err(EncodingError::BufferUnderflow);
        }

        let len_byte = data[1];
        consumed += 1;

        if len_byte < 254 {
            length = len_byte as usize;
        } else if len_byte == 254 {
            if data.len() < 4 {
                return Err(EncodingError::BufferUnderflow);
            }
            length = u16::from_be_bytes([data[2], data[3]]) as usize;
            consumed += 2;
        } else {
            if data.len() < 6 {
                return Err(EncodingError::BufferUnderflow);
            }
            length = u32::from_be_bytes([data[2], data[3], data[4], data[5]]) as usize;
            consumed += 4;
        }
    }

    Ok((tag, length, consumed))
}

fn expect_tag(data: &[u8], expected: ApplicationTag) -> Result<(usize, usize)> {
    let (tag, length, consumed) = decode_application_tag(data)?;
    if tag != expected {
        return Err(EncodingError::InvalidTag);
    }
    if tag != ApplicationTag::Boolean && data.len() < consumed + length {
        return Err(EncodingError::BufferUnderflow);
    }
    Ok((length, consumed))
}

fn minimal_be_bytes(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take(3).take_while(|&&b| b == 0).count();
    bytes[skip..].to_vec()
}

fn decode_be_unsigned(content: &[u8]) -> Result<u32> {
    match content.len() {
        1..=4 => Ok(content.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)),
        _ => Err(EncodingError::InvalidLength),
    }
}

/// Encode a BACnet null value
pub fn encode_null(buffer: &mut Vec<u8>) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Null, 0)
}

/// Encode a BACnet boolean value
pub fn encode_boolean(buffer: &mut Vec<u8>, value: bool) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Boolean, if value { 1 } else { 0 })
}

/// Decode a BACnet boolean value
pub fn decode_boolean(data: &[u8]) -> Result<(bool, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Boolean)?;

    let value = match length {
        0 => false,
        1 => true,
        _ => return Err(EncodingError::InvalidLength),
    };

    Ok((value, consumed))
}

/// Encode a BACnet unsigned integer
pub fn encode_unsigned(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_be_bytes(value);
    encode_application_tag(buffer, ApplicationTag::UnsignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decode a BACnet unsigned integer
pub fn decode_unsigned(data: &[u8]) -> Result<(u32, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::UnsignedInt)?;
    let value = decode_be_unsigned(&data[consumed..consumed + length])?;
    Ok((value, consumed + length))
}

/// Encode a BACnet signed integer
pub fn encode_signed(buffer: &mut Vec<u8>, value: i32) -> Result<()> {
    let bytes = if (-128..=127).contains(&value) {
        vec![value as u8]
    } else if (-32768..=32767).contains(&value) {
        (value as i16).to_be_bytes().to_vec()
    } else if (-8388608..=8388607).contains(&value) {
        value.to_be_bytes()[1..].to_vec()
    } else {
        value.to_be_bytes().to_vec()
    };

    encode_application_tag(buffer, ApplicationTag::SignedInt, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decode a BACnet signed integer
pub fn decode_signed(data: &[u8]) -> Result<(i32, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::SignedInt)?;
    let content = &data[consumed..consumed + length];

    let value = match length {
        1..=4 => {
            let fill = if content[0] & 0x80 != 0 { 0xFF } else { 0x00 };
            let mut bytes = [fill; 4];
            bytes[4 - length..].copy_from_slice(content);
            i32::from_be_bytes(bytes)
        }
        _ => return Err(EncodingError::InvalidLength),
    };

    Ok((value, consumed + length))
}

/// Encode a BACnet real (float) value
pub fn encode_real(buffer: &mut Vec<u8>, value: f32) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Real, 4)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Decode a BACnet real (float) value
pub fn decode_real(data: &[u8]) -> Result<(f32, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Real)?;

    if length != 4 {
        return Err(EncodingError::InvalidLength);
    }

    let value = f32::from_be_bytes([
        data[consumed],
        data[consumed + 1],
        data[consumed + 2],
        data[consumed + 3],
    ]);

    Ok((value, consumed + 4))
}

/// Encode a BACnet double (64-bit float)
pub fn encode_double(buffer: &mut Vec<u8>, value: f64) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Double, 8)?;
    buffer.extend_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Decode a BACnet double (64-bit float)
pub fn decode_double(data: &[u8]) -> Result<(f64, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Double)?;

    if length != 8 {
        return Err(EncodingError::InvalidLength);
    }

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[consumed..consumed + 8]);
    Ok((f64::from_be_bytes(bytes), consumed + 8))
}

/// Encode a BACnet octet string
pub fn encode_octet_string(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::OctetString, value.len())?;
    buffer.extend_from_slice(value);
    Ok(())
}

/// Decode a BACnet octet string
pub fn decode_octet_string(data: &[u8]) -> Result<(Vec<u8>, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::OctetString)?;
    Ok((data[consumed..consumed + length].to_vec(), consumed + length))
}

/// Encode a BACnet character string (UTF-8 character set)
pub fn encode_character_string(buffer: &mut Vec<u8>, value: &str) -> Result<()> {
    let string_bytes = value.as_bytes();
    encode_application_tag(buffer, ApplicationTag::CharacterString, string_bytes.len() + 1)?;
    buffer.push(0); // Character set encoding (0 = ANSI X3.4 / UTF-8)
    buffer.extend_from_slice(string_bytes);
    Ok(())
}

/// Decode a BACnet character string
///
/// Only the UTF-8 character set is accepted.
pub fn decode_character_string(data: &[u8]) -> Result<(String, usize)> {
    let (length, mut consumed) = expect_tag(data, ApplicationTag::CharacterString)?;

    if length == 0 {
        return Err(EncodingError::InvalidLength);
    }

    let encoding = data[consumed];
    if encoding != 0 {
        return Err(EncodingError::InvalidFormat(format!(
            "Unsupported character set {}",
            encoding
        )));
    }
    consumed += 1;

    let string_data = &data[consumed..consumed + length - 1];
    let value = String::from_utf8(string_data.to_vec())
        .map_err(|_| EncodingError::InvalidFormat("Invalid UTF-8 string".to_string()))?;

    Ok((value, consumed + length - 1))
}

/// Encode a BACnet enumerated value
pub fn encode_enumerated(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let bytes = minimal_be_bytes(value);
    encode_application_tag(buffer, ApplicationTag::Enumerated, bytes.len())?;
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Decode a BACnet enumerated value
pub fn decode_enumerated(data: &[u8]) -> Result<(u32, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Enumerated)?;
    let value = decode_be_unsigned(&data[consumed..consumed + length])?;
    Ok((value, consumed + length))
}

/// Encode a BACnet bit string
pub fn encode_bit_string(buffer: &mut Vec<u8>, bits: &[bool]) -> Result<()> {
    let byte_count = bits.len().div_ceil(8);
    let unused_bits = if bits.len() % 8 == 0 { 0 } else { 8 - (bits.len() % 8) };

    encode_application_tag(buffer, ApplicationTag::BitString, byte_count + 1)?;
    buffer.push(unused_bits as u8);

    for chunk in bits.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .filter(|(_, &bit)| bit)
            .fold(0u8, |acc, (pos, _)| acc | (1 << (7 - pos)));
        buffer.push(byte);
    }

    Ok(())
}

/// Decode a BACnet bit string
pub fn decode_bit_string(data: &[u8]) -> Result<(Vec<bool>, usize)> {
    let (length, mut consumed) = expect_tag(data, ApplicationTag::BitString)?;

    if length == 0 {
        return Err(EncodingError::InvalidLength);
    }

    let unused_bits = data[consumed] as usize;
    consumed += 1;

    if unused_bits > 7 || (length == 1 && unused_bits != 0) {
        return Err(EncodingError::InvalidFormat("Invalid unused bits count".to_string()));
    }

    let mut bits = Vec::new();
    let byte_count = length - 1;

    for i in 0..byte_count {
        let byte_val = data[consumed + i];
        let bits_in_byte = if i == byte_count - 1 { 8 - unused_bits } else { 8 };

        for bit_pos in 0..bits_in_byte {
            bits.push((byte_val & (1 << (7 - bit_pos))) != 0);
        }
    }

    Ok((bits, consumed + byte_count))
}

/// Encode a BACnet date
pub fn encode_date(buffer: &mut Vec<u8>, date: &Date) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Date, 4)?;
    let year = if date.year == Date::UNSPECIFIED_YEAR {
        255
    } else if (1900..=2154).contains(&date.year) {
        (date.year - 1900) as u8
    } else {
        return Err(EncodingError::ValueOutOfRange);
    };
    buffer.extend_from_slice(&[year, date.month, date.day, date.weekday]);
    Ok(())
}

/// Decode a BACnet date
pub fn decode_date(data: &[u8]) -> Result<(Date, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Date)?;

    if length != 4 {
        return Err(EncodingError::InvalidLength);
    }

    let year = if data[consumed] == 255 {
        Date::UNSPECIFIED_YEAR
    } else {
        1900 + data[consumed] as u16
    };

    let date = Date {
        year,
        month: data[consumed + 1],
        day: data[consumed + 2],
        weekday: data[consumed + 3],
    };
    Ok((date, consumed + 4))
}

/// Encode a BACnet time
pub fn encode_time(buffer: &mut Vec<u8>, time: &Time) -> Result<()> {
    encode_application_tag(buffer, ApplicationTag::Time, 4)?;
    buffer.extend_from_slice(&[time.hour, time.minute, time.second, time.hundredths]);
    Ok(())
}

/// Decode a BACnet time
pub fn decode_time(data: &[u8]) -> Result<(Time, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::Time)?;

    if length != 4 {
        return Err(EncodingError::InvalidLength);
    }

    let time = Time {
        hour: data[consumed],
        minute: data[consumed + 1],
        second: data[consumed + 2],
        hundredths: data[consumed + 3],
    };
    Ok((time, consumed + 4))
}

/// Encode a BACnet object identifier
pub fn encode_object_identifier(buffer: &mut Vec<u8>, object_id: ObjectIdentifier) -> Result<()> {
    if !object_id.is_valid() {
        return Err(EncodingError::ValueOutOfRange);
    }

    encode_application_tag(buffer, ApplicationTag::ObjectIdentifier, 4)?;
    buffer.extend_from_slice(&u32::from(object_id).to_be_bytes());
    Ok(())
}

/// Decode a BACnet object identifier
pub fn decode_object_identifier(data: &[u8]) -> Result<(ObjectIdentifier, usize)> {
    let (length, consumed) = expect_tag(data, ApplicationTag::ObjectIdentifier)?;

    if length != 4 {
        return Err(EncodingError::InvalidLength);
    }

    let raw = u32::from_be_bytes([
        data[consumed],
        data[consumed + 1],
        data[consumed + 2],
        data[consumed + 3],
    ]);

    Ok((ObjectIdentifier::from(raw), consumed + 4))
}

/// Encode opening tag for constructed data
pub fn encode_opening_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
    if tag_number > 14 {
        return Err(EncodingError::ValueOutOfRange);
    }
    buffer.push(0x0E | (tag_number << 4));
    Ok(())
}

/// Encode closing tag for constructed data
pub fn encode_closing_tag(buffer: &mut Vec<u8>, tag_number: u8) -> Result<()> {
    if tag_number > 14 {
        return Err(EncodingError::ValueOutOfRange);
    }
    buffer.push(0x0F | (tag_number << 4));
    Ok(())
}

/// Encode any primitive [`PropertyValue`] with its application tag
///
/// Arrays and lists are encoded element by element.
pub fn encode_application_data(buffer: &mut Vec<u8>, value: &PropertyValue) -> Result<()> {
    match value {
        PropertyValue::Null => encode_null(buffer),
        PropertyValue::Boolean(v) => encode_boolean(buffer, *v),
        PropertyValue::UnsignedInteger(v) => encode_unsigned(buffer, *v),
        PropertyValue::SignedInt(v) => encode_signed(buffer, *v),
        PropertyValue::Real(v) => encode_real(buffer, *v),
        PropertyValue::Double(v) => encode_double(buffer, *v),
        PropertyValue::OctetString(v) => encode_octet_string(buffer, v),
        PropertyValue::CharacterString(v) => encode_character_string(buffer, v),
        PropertyValue::BitString(v) => encode_bit_string(buffer, v),
        PropertyValue::Enumerated(v) => encode_enumerated(buffer, *v),
        PropertyValue::Date(v) => encode_date(buffer, v),
        PropertyValue::Time(v) => encode_time(buffer, v),
        PropertyValue::ObjectIdentifier(v) => encode_object_identifier(buffer, *v),
        PropertyValue::Array(items) | PropertyValue::List(items) => items
            .iter()
            .try_for_each(|item| encode_application_data(buffer, item)),
    }
}

/// Decode one application-tagged value of any primitive type
///
/// Returns the decoded value and the number of bytes consumed.
pub fn decode_application_data(data: &[u8]) -> Result<(PropertyValue, usize)> {
    let (tag, _, _) = decode_application_tag(data)?;

    let (value, consumed) = match tag {
        ApplicationTag::Null => (PropertyValue::Null, 1),
        ApplicationTag::Boolean => {
            let (v, n) = decode_boolean(data)?;
            (PropertyValue::Boolean(v), n)
        }
        ApplicationTag::UnsignedInt => {
            let (v, n) = decode_unsigned(data)?;
            (PropertyValue::UnsignedInteger(v), n)
        }
        ApplicationTag::SignedInt => {
            let (v, n) = decode_signed(data)?;
            (PropertyValue::SignedInt(v), n)
        }
        ApplicationTag::Real => {
            let (v, n) = decode_real(data)?;
            (PropertyValue::Real(v), n)
        }
        ApplicationTag::Double => {
            let (v, n) = decode_double(data)?;
            (PropertyValue::Double(v), n)
        }
        ApplicationTag::OctetString => {
            let (v, n) = decode_octet_string(data)?;
            (PropertyValue::OctetString(v), n)
        }
        ApplicationTag::CharacterString => {
            let (v, n) = decode_character_string(data)?;
            (PropertyValue::CharacterString(v), n)
        }
        ApplicationTag::BitString => {
            let (v, n) = decode_bit_string(data)?;
            (PropertyValue::BitString(v), n)
        }
        ApplicationTag::Enumerated => {
            let (v, n) = decode_enumerated(data)?;
            (PropertyValue::Enumerated(v), n)
        }
        ApplicationTag::Date => {
            let (v, n) = decode_date(data)?;
            (PropertyValue::Date(v), n)
        }
        ApplicationTag::Time => {
            let (v, n) = decode_time(data)?;
            (PropertyValue::Time(v), n)
        }
        ApplicationTag::ObjectIdentifier => {
            let (v, n) = decode_object_identifier(data)?;
            (PropertyValue::ObjectIdentifier(v), n)
        }
    };

    Ok((value, consumed))
}

/// Encode an object type as an enumerated value
pub fn encode_object_type(buffer: &mut Vec<u8>, object_type: ObjectType) -> Result<()> {
    encode_enumerated(buffer, u16::from(object_type) as u32)
}
