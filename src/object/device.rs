//! Device Context
//!
//! Object stores do not own device-wide state. Name uniqueness, the database
//! revision and the device clock live behind the [`DeviceContext`] trait, which
//! every store operation that touches them receives as an argument.
//!
//! # Overview
//!
//! [`Device`] is the in-process implementation:
//! - Registry of object names across all object types, the device included
//! - Database revision counter, bumped on create, delete and rename
//! - UTC clock that can be pinned for deterministic time stamps

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;

use crate::object::{BacnetDateTime, ObjectIdentifier, ObjectType};

/// Device-wide services the object stores depend on
pub trait DeviceContext {
    /// Object that owns a name, if any
    fn lookup_object_name(&self, name: &str) -> Option<ObjectIdentifier>;

    /// Give an object a name, replacing any name it had
    fn register_object_name(&mut self, object: ObjectIdentifier, name: &str);

    /// Release the name of an object
    fn unregister_object_name(&mut self, object: ObjectIdentifier);

    /// Record a change of the object database
    fn increment_database_revision(&mut self);

    /// Device date and time, used for event time stamps
    fn current_date_time(&self) -> BacnetDateTime;
}

/// In-process device with a name registry and a UTC clock
#[derive(Debug, Clone)]
pub struct Device {
    /// Device object identifier
    identifier: ObjectIdentifier,

    /// Database revision
    database_revision: u32,

    /// Object names by name
    names: HashMap<String, ObjectIdentifier>,

    /// Object names by owner
    owners: HashMap<ObjectIdentifier, String>,

    /// Pinned clock, system time when absent
    clock: Option<DateTime<Utc>>,
}

impl Device {
    /// Create a new device
    ///
    /// The device name is registered like any object name, so no object can
    /// take it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bacnet_objects::object::{Device, DeviceContext};
    ///
    /// let device = Device::new(260001, "AHU-1 Controller");
    /// assert!(device.lookup_object_name("AHU-1 Controller").is_some());
    /// ```
    pub fn new(device_instance: u32, device_name: &str) -> Self {
        let mut device = Self {
            identifier: ObjectIdentifier::new(ObjectType::Device, device_instance),
            database_revision: 0,
            names: HashMap::new(),
            owners: HashMap::new(),
            clock: None,
        };
        device.register_object_name(device.identifier, device_name);
        device
    }

    /// Pin the clock to a fixed instant
    pub fn with_time(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Move the pinned clock, or pin it when it follows system time
    pub fn set_time(&mut self, now: DateTime<Utc>) {
        self.clock = Some(now);
    }

    /// Device object identifier
    pub fn identifier(&self) -> ObjectIdentifier {
        self.identifier
    }

    /// Device object name
    pub fn object_name(&self) -> Option<&str> {
        self.owners.get(&self.identifier).map(String::as_str)
    }

    /// Current database revision
    pub fn database_revision(&self) -> u32 {
        self.database_revision
    }

    /// UTC instant the device considers "now"
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}

impl DeviceContext for Device {
    fn lookup_object_name(&self, name: &str) -> Option<ObjectIdentifier> {
        self.names.get(name).copied()
    }

    fn register_object_name(&mut self, object: ObjectIdentifier, name: &str) {
        if let Some(previous) = self.owners.insert(object, name.to_string()) {
            self.names.remove(&previous);
        }
        self.names.insert(name.to_string(), object);
    }

    fn unregister_object_name(&mut self, object: ObjectIdentifier) {
        if let Some(name) = self.owners.remove(&object) {
            self.names.remove(&name);
        }
    }

    fn increment_database_revision(&mut self) {
        self.database_revision = self.database_revision.wrapping_add(1);
        debug!("{}: database revision {}", self.identifier, self.database_revision);
    }

    fn current_date_time(&self) -> BacnetDateTime {
        BacnetDateTime::from_utc(&self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_device_name_is_reserved() {
        let device = Device::new(1234, "Plant Controller");
        assert_eq!(device.object_name(), Some("Plant Controller"));
        assert_eq!(
            device.lookup_object_name("Plant Controller"),
            Some(ObjectIdentifier::new(ObjectType::Device, 1234))
        );
    }

    #[test]
    fn test_rename_releases_previous_name() {
        let mut device = Device::new(1, "dev");
        let ai = ObjectIdentifier::new(ObjectType::AnalogInput, 3);

        device.register_object_name(ai, "OAT");
        device.register_object_name(ai, "Outside Air Temp");
        assert_eq!(device.lookup_object_name("OAT"), None);
        assert_eq!(device.lookup_object_name("Outside Air Temp"), Some(ai));

        device.unregister_object_name(ai);
        assert_eq!(device.lookup_object_name("Outside Air Temp"), None);
    }

    #[test]
    fn test_pinned_clock_and_revision() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut device = Device::new(1, "dev").with_time(instant);

        let stamp = device.current_date_time();
        assert_eq!(stamp.date.year, 2024);
        assert_eq!(stamp.time.hour, 12);

        device.increment_database_revision();
        device.increment_database_revision();
        assert_eq!(device.database_revision(), 2);
    }
}
