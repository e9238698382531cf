#![doc = include_str!("../README.md")]

pub mod encoding;
pub mod object;
pub mod service;
pub mod util;

// Re-export main types without glob imports to avoid conflicts
pub use encoding::{ApplicationTag, EncodingError};
pub use object::{
    AnalogInputs, Device, DeviceContext, MultiStateInputs, ObjectError, ObjectIdentifier,
    ObjectStore, ObjectType, PropertyIdentifier,
};
pub use service::{NotificationClasses, NotificationRouter, ReadPropertyRequest, WritePropertyRequest};

/// Largest APDU a reply may fill unless the requester asks for less
pub const BACNET_MAX_APDU: usize = encoding::MAX_APDU;
