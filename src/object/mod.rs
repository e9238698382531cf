//! BACnet Object Types and Property Access
//!
//! This module defines the object-level building blocks shared by the input
//! object stores: identifiers, decoded property values, BACnet dates and times,
//! status flags, the error type of the property access layer and the
//! [`ObjectStore`] trait a request dispatcher talks to.
//!
//! # Overview
//!
//! Each supported object type keeps all of its instances in one store:
//!
//! - [`AnalogInputs`]: analog sensor readings with optional intrinsic
//!   out-of-range alarming
//! - [`MultiStateInputs`]: enumerated sensor states with state texts
//!
//! A store is ordered by instance number, so the positional index used by the
//! object-list enumeration always maps to the same instance as long as the set
//! of instances does not change.
//!
//! # Examples
//!
//! ```rust
//! use bacnet_objects::object::{ObjectIdentifier, ObjectType};
//!
//! let temp_sensor = ObjectIdentifier::new(ObjectType::AnalogInput, 1);
//! assert_eq!(temp_sensor.object_type, ObjectType::AnalogInput);
//! assert_eq!(u32::from(temp_sensor), 1);
//! assert!(temp_sensor.is_valid());
//! ```

use core::cmp::Ordering;
use core::fmt;

use bitflags::bitflags;
use chrono::{DateTime, Datelike, Timelike, Utc};
use thiserror::Error;

use crate::encoding::EncodingError;
use crate::service::{AbortReason, ErrorClass, ErrorCode, ReadPropertyRequest, WritePropertyRequest};
use crate::util::{bacnet_date_to_string, bacnet_time_to_string, MAX_INSTANCE};

/// Result type for object operations
pub type Result<T> = core::result::Result<T, ObjectError>;

/// Errors reported by the property access layer
///
/// Every variant maps to a BACnet error class and code, except
/// [`ObjectError::AbortSegmentationNotSupported`] which the dispatcher has to
/// turn into an abort PDU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// Property is not supported by the object
    #[error("Unknown property")]
    UnknownProperty,
    /// Array index given for a property that is not an array
    #[error("Property is not an array")]
    PropertyIsNotAnArray,
    /// Array index outside the array bounds
    #[error("Invalid array index")]
    InvalidArrayIndex,
    /// Written value has the wrong type or is outside the allowed range
    #[error("Value out of range")]
    ValueOutOfRange,
    /// Property is read-only
    #[error("Write access denied")]
    WriteAccessDenied,
    /// Property has no value yet
    #[error("Value not initialized")]
    ValueNotInitialized,
    /// No object with the requested instance
    #[error("Unknown object")]
    UnknownObject,
    /// Acknowledgment time stamp does not match the event
    #[error("Invalid time stamp")]
    InvalidTimeStamp,
    /// Acknowledged state does not match the object
    #[error("Invalid event state")]
    InvalidEventState,
    /// Another object already uses the name
    #[error("Duplicate object name")]
    DuplicateName,
    /// Reply does not fit in one APDU
    #[error("Segmentation not supported")]
    AbortSegmentationNotSupported,
    /// Encoding primitive failed
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

impl ObjectError {
    /// BACnet error class reported for this error
    pub fn error_class(&self) -> ErrorClass {
        match self {
            ObjectError::UnknownObject => ErrorClass::Object,
            ObjectError::InvalidTimeStamp | ObjectError::InvalidEventState => ErrorClass::Services,
            _ => ErrorClass::Property,
        }
    }

    /// BACnet error code reported for this error
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ObjectError::UnknownProperty => ErrorCode::UnknownProperty,
            ObjectError::PropertyIsNotAnArray => ErrorCode::PropertyIsNotAnArray,
            ObjectError::InvalidArrayIndex => ErrorCode::InvalidArrayIndex,
            ObjectError::ValueOutOfRange => ErrorCode::ValueOutOfRange,
            ObjectError::WriteAccessDenied => ErrorCode::WriteAccessDenied,
            ObjectError::ValueNotInitialized => ErrorCode::ValueNotInitialized,
            ObjectError::UnknownObject => ErrorCode::UnknownObject,
            ObjectError::InvalidTimeStamp => ErrorCode::InvalidTimeStamp,
            ObjectError::InvalidEventState => ErrorCode::InvalidEventState,
            ObjectError::DuplicateName => ErrorCode::DuplicateName,
            ObjectError::AbortSegmentationNotSupported | ObjectError::Encoding(_) => ErrorCode::Other,
        }
    }

    /// Abort reason, when the request has to be aborted instead of rejected
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match self {
            ObjectError::AbortSegmentationNotSupported => Some(AbortReason::SegmentationNotSupported),
            _ => None,
        }
    }
}

/// Object identifier (type + instance number)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectIdentifier {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectIdentifier {
    /// Create a new object identifier
    pub fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }

    /// Check if instance number is valid (0-4194303)
    pub fn is_valid(&self) -> bool {
        self.instance <= MAX_INSTANCE
    }
}

impl From<u32> for ObjectIdentifier {
    /// Convert from 32-bit object identifier.
    /// See clause 20.2.14 of the BACnet specification.
    fn from(value: u32) -> Self {
        let object_type = ((value >> 22) & 0x3FF) as u16;
        Self::new(object_type.into(), value & MAX_INSTANCE)
    }
}

impl From<ObjectIdentifier> for u32 {
    /// Convert to 32-bit object identifier.
    /// See clause 20.2.14 of the BACnet specification.
    fn from(value: ObjectIdentifier) -> Self {
        let object_type: u16 = value.object_type.into();
        ((object_type as u32) << 22) | (value.instance & MAX_INSTANCE)
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.instance)
    }
}

/// Decoded application value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    UnsignedInteger(u32),
    SignedInt(i32),
    Real(f32),
    Double(f64),
    OctetString(Vec<u8>),
    CharacterString(String),
    BitString(Vec<bool>),
    Enumerated(u32),
    Date(Date),
    Time(Time),
    ObjectIdentifier(ObjectIdentifier),
    Array(Vec<PropertyValue>),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u32> {
        match self {
            PropertyValue::UnsignedInteger(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f32> {
        match self {
            PropertyValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enumerated(&self) -> Option<u32> {
        match self {
            PropertyValue::Enumerated(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bit_string(&self) -> Option<&[bool]> {
        match self {
            PropertyValue::BitString(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_character_string(&self) -> Option<&str> {
        match self {
            PropertyValue::CharacterString(v) => Some(v),
            _ => None,
        }
    }
}

/// Append one encoded array element to a reply
///
/// The reply has to stay below `max_apdu`, otherwise the read is aborted.
pub(crate) fn append_array_element(buffer: &mut Vec<u8>, element: &[u8], max_apdu: usize) -> Result<()> {
    if buffer.len() + element.len() >= max_apdu {
        return Err(ObjectError::AbortSegmentationNotSupported);
    }
    buffer.extend_from_slice(element);
    Ok(())
}

/// BACnet date representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Date {
    pub year: u16,   // 1900-2154, 255 = unspecified
    pub month: u8,   // 1-12, 13 = odd months, 14 = even months, 255 = unspecified
    pub day: u8,     // 1-31, 32 = last day of month, 255 = unspecified
    pub weekday: u8, // 1-7 (Mon-Sun), 255 = unspecified
}

impl Date {
    /// Year value meaning "any year"
    ///
    /// Years are stored as full years, so the wire's wildcard byte is kept
    /// as-is. It cannot collide with a real date: only 1900..=2154 encodes.
    pub const UNSPECIFIED_YEAR: u16 = 255;

    /// First and last year the one-byte wire field can carry
    pub const YEAR_RANGE: core::ops::RangeInclusive<i32> = 1900..=2154;

    /// Wildcard date (every field unspecified)
    pub fn unspecified() -> Self {
        Self {
            year: Self::UNSPECIFIED_YEAR,
            month: 255,
            day: 255,
            weekday: 255,
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bacnet_date_to_string(
            self.year,
            self.month,
            self.day,
            self.weekday,
        ))
    }
}

/// BACnet time representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Time {
    pub hour: u8,       // 0-23, 255 = unspecified
    pub minute: u8,     // 0-59, 255 = unspecified
    pub second: u8,     // 0-59, 255 = unspecified
    pub hundredths: u8, // 0-99, 255 = unspecified
}

impl Time {
    /// Wildcard time (every field unspecified)
    pub fn unspecified() -> Self {
        Self {
            hour: 255,
            minute: 255,
            second: 255,
            hundredths: 255,
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bacnet_time_to_string(
            self.hour,
            self.minute,
            self.second,
            self.hundredths,
        ))
    }
}

/// BACnet Date and Time structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BacnetDateTime {
    /// Date component
    pub date: Date,
    /// Time component
    pub time: Time,
}

impl BacnetDateTime {
    /// Create a new BACnet DateTime from Date and Time components
    pub fn new(date: Date, time: Time) -> Self {
        Self { date, time }
    }

    /// Convert a UTC instant
    ///
    /// A year the wire cannot carry yields the wildcard date.
    pub fn from_utc(instant: &DateTime<Utc>) -> Self {
        let date = if Date::YEAR_RANGE.contains(&instant.year()) {
            Date {
                year: instant.year() as u16,
                month: instant.month() as u8,
                day: instant.day() as u8,
                weekday: instant.weekday().number_from_monday() as u8, // BACnet uses 1=Monday
            }
        } else {
            Date::unspecified()
        };
        let time = Time {
            hour: instant.hour() as u8,
            minute: instant.minute() as u8,
            second: instant.second() as u8,
            // leap seconds report nanoseconds above 1e9
            hundredths: (instant.nanosecond().min(999_999_999) / 10_000_000) as u8,
        };
        Self::new(date, time)
    }

    /// Current system time in UTC
    pub fn now_utc() -> Self {
        Self::from_utc(&Utc::now())
    }

    /// Create unspecified time (all 255 values)
    pub fn unspecified() -> Self {
        Self::new(Date::unspecified(), Time::unspecified())
    }

    /// Chronological comparison
    ///
    /// The weekday is derived from the date and takes no part in the ordering.
    pub fn compare(&self, other: &BacnetDateTime) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }

    fn sort_key(&self) -> (u16, u8, u8, u8, u8, u8, u8) {
        (
            self.date.year,
            self.date.month,
            self.date.day,
            self.time.hour,
            self.time.minute,
            self.time.second,
            self.time.hundredths,
        )
    }
}

impl Default for BacnetDateTime {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl fmt::Display for BacnetDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time)
    }
}

bitflags! {
    /// Status flags of an object (in-alarm, fault, overridden, out-of-service)
    #[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StatusFlags: u8 {
        const IN_ALARM = 1 << 0;
        const FAULT = 1 << 1;
        const OVERRIDDEN = 1 << 2;
        const OUT_OF_SERVICE = 1 << 3;
    }
}

impl StatusFlags {
    /// Bit string in BACnet bit order
    pub fn to_bool_vec(&self) -> Vec<bool> {
        flags_to_bool_vec(self.bits() as u32, 4)
    }
}

/// Expand the low `len` bits of a flag set into a bit string, bit 0 first
pub(crate) fn flags_to_bool_vec(bits: u32, len: usize) -> Vec<bool> {
    (0..len).map(|i| (bits & (1 << i)) != 0).collect()
}

/// Fold a bit string into a flag mask, bit 0 first
pub(crate) fn bool_slice_to_flags(bits: &[bool]) -> u32 {
    bits.iter()
        .enumerate()
        .filter(|(_, &set)| set)
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

/// Reliability enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Reliability {
    #[default]
    NoFaultDetected = 0,
    NoSensor = 1,
    OverRange = 2,
    UnderRange = 3,
    OpenLoop = 4,
    ShortedLoop = 5,
    NoOutput = 6,
    UnreliableOther = 7,
    ProcessError = 8,
    MultiStateFault = 9,
    ConfigurationError = 10,
}

/// Give an object a new name, keeping names unique across the device
///
/// Writing the name an object already has is accepted without a database
/// revision change.
pub(crate) fn assign_object_name(
    slot: &mut Option<String>,
    identifier: ObjectIdentifier,
    name: &str,
    device: &mut dyn DeviceContext,
) -> Result<()> {
    if name.is_empty() {
        return Err(ObjectError::ValueOutOfRange);
    }

    match device.lookup_object_name(name) {
        Some(owner) if owner == identifier => Ok(()),
        Some(_) => Err(ObjectError::DuplicateName),
        None => {
            device.register_object_name(identifier, name);
            device.increment_database_revision();
            log::debug!("{}: renamed to {:?}", identifier, name);
            *slot = Some(name.to_string());
            Ok(())
        }
    }
}

/// Properties an object instance supports, grouped the way the
/// Property_List service expects them
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertyLists {
    /// Required by the standard
    pub required: Vec<PropertyIdentifier>,
    /// Optional and supported by this instance
    pub optional: Vec<PropertyIdentifier>,
    /// Vendor specific
    pub proprietary: Vec<PropertyIdentifier>,
}

impl PropertyLists {
    /// True when the property is in any of the three lists
    pub fn contains(&self, property: PropertyIdentifier) -> bool {
        self.required
            .iter()
            .chain(&self.optional)
            .chain(&self.proprietary)
            .any(|&p| p == property)
    }
}

/// Uniform access to the instances of one object type
///
/// A dispatcher holds one store per object type and routes read and write
/// requests by the object type of the request's identifier.
pub trait ObjectStore {
    /// Object type served by this store
    fn object_type(&self) -> ObjectType;

    /// Number of instances
    fn count(&self) -> usize;

    /// Instance at a position of the ascending instance order
    fn index_to_instance(&self, index: usize) -> Option<u32>;

    /// Position of an instance, or [`ObjectStore::count`] when it does not exist
    fn instance_to_index(&self, instance: u32) -> usize;

    /// True when the instance exists
    fn valid_instance(&self, instance: u32) -> bool {
        self.instance_to_index(instance) < self.count()
    }

    /// Object name of an instance
    fn object_name(&self, instance: u32) -> Option<String>;

    /// Supported properties of an instance
    fn property_lists(&self, instance: u32) -> Result<PropertyLists>;

    /// Encode one property value
    fn read_property(&self, request: &ReadPropertyRequest) -> Result<Vec<u8>>;

    /// Decode, validate and apply one property value
    fn write_property(
        &mut self,
        request: &WritePropertyRequest,
        device: &mut dyn DeviceContext,
    ) -> Result<()>;
}

pub mod analog;
pub mod device;
pub mod engineering_units;
pub mod intrinsic;
pub mod multistate;
pub mod object_type;
pub mod property_identifier;

pub use analog::{AnalogInput, AnalogInputConfig, AnalogInputs};
pub use device::{Device, DeviceContext};
pub use engineering_units::EngineeringUnits;
pub use intrinsic::{
    AckedTransition, EventEnable, EventState, EventTransition, IntrinsicConfig,
    IntrinsicReporting, LimitEnable, NotifyType,
};
pub use multistate::{MultiStateInput, MultiStateInputConfig, MultiStateInputs};
pub use object_type::ObjectType;
pub use property_identifier::PropertyIdentifier;
